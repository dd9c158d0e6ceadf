//! Habit repository over the key-value store
//!
//! All habits live in one JSON array under [`HABITS_KEY`]; unlocked
//! achievement ids live under [`ACHIEVEMENTS_KEY`].

use super::repo::{KeyValueStore, KeyValueStoreExt};
use crate::analytics::streak::{compute_streak, DEFAULT_WINDOW_DAYS};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::types::{CompletionEntry, Habit, NewHabit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const HABITS_KEY: &str = "habits";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

/// Streak lengths that unlock an achievement, with its id.
pub const STREAK_ACHIEVEMENTS: &[(u32, &str)] = &[(7, "streak-7"), (30, "streak-30")];

/// Read access to habits, as consumed by the analytics engine.
pub trait HabitRepository: Send + Sync {
    fn get_habits(&self) -> Result<Vec<Habit>>;

    fn get_habit(&self, id: &str) -> Result<Option<Habit>>;
}

/// Outcome of [`HabitStore::track_progress`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub habit: Habit,
    /// Achievement ids unlocked by this update
    pub unlocked: Vec<String>,
}

/// Full snapshot of the store, used for import and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default)]
    pub habits: Option<Vec<Habit>>,
    #[serde(default)]
    pub achievements: Option<Vec<String>>,
    #[serde(default, alias = "timestamp")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// Habit CRUD and progress tracking backed by a [`KeyValueStore`].
pub struct HabitStore<S> {
    store: S,
    streak_window_days: i64,
}

impl<S: KeyValueStore> HabitStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            streak_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Override the look-back window used when recomputing cached streaks.
    pub fn with_streak_window(mut self, days: i64) -> Result<Self> {
        if days < 0 {
            return Err(Error::invalid("streak window must not be negative"));
        }
        self.streak_window_days = days;
        Ok(self)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn save_habits(&self, habits: &[Habit]) -> Result<()> {
        self.store.set(HABITS_KEY, habits)
    }

    /// Create a habit with a fresh UUID and an empty history.
    pub fn add_habit(&self, new: NewHabit, clock: &dyn Clock) -> Result<Habit> {
        new.validate()?;

        let habit = Habit {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            category: new.category,
            frequency: new.frequency,
            created_at: clock.now(),
            history: Vec::new(),
            streak: 0,
        };

        let mut habits = self.get_habits()?;
        habits.push(habit.clone());
        self.save_habits(&habits)?;

        info!(habit_id = %habit.id, name = %habit.name, category = %habit.category, "Added habit");
        Ok(habit)
    }

    /// Replace the stored record with the same id.
    pub fn update_habit(&self, habit: Habit) -> Result<Habit> {
        NewHabit {
            name: habit.name.clone(),
            description: habit.description.clone(),
            category: habit.category.clone(),
            frequency: habit.frequency,
        }
        .validate()?;

        let mut habits = self.get_habits()?;
        let slot = habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or_else(|| Error::HabitNotFound(habit.id.clone()))?;
        *slot = habit.clone();
        self.save_habits(&habits)?;

        info!(habit_id = %habit.id, "Updated habit");
        Ok(habit)
    }

    /// Remove a habit. Returns whether it existed.
    pub fn delete_habit(&self, id: &str) -> Result<bool> {
        let mut habits = self.get_habits()?;
        let before = habits.len();
        habits.retain(|h| h.id != id);
        let removed = habits.len() != before;
        if removed {
            self.save_habits(&habits)?;
            info!(habit_id = %id, "Deleted habit");
        }
        Ok(removed)
    }

    /// Replace every stored habit with `habits`.
    pub fn import_habits(&self, habits: Vec<Habit>) -> Result<usize> {
        for habit in &habits {
            if habit.id.trim().is_empty() {
                return Err(Error::invalid("imported habit has an empty id"));
            }
            for entry in &habit.history {
                entry.validate()?;
            }
        }
        self.save_habits(&habits)?;
        info!(count = habits.len(), "Imported habits");
        Ok(habits.len())
    }

    /// Apply a backup. Sections missing from the backup are left untouched.
    pub fn import_backup(&self, backup: Backup) -> Result<usize> {
        let imported = match backup.habits {
            Some(habits) => self.import_habits(habits)?,
            None => 0,
        };
        if let Some(achievements) = backup.achievements {
            self.store.set(ACHIEVEMENTS_KEY, &achievements)?;
            info!(count = achievements.len(), "Imported achievements");
        }
        Ok(imported)
    }

    pub fn export_backup(&self, clock: &dyn Clock) -> Result<Backup> {
        Ok(Backup {
            habits: Some(self.get_habits()?),
            achievements: Some(self.achievements()?),
            exported_at: Some(clock.now()),
        })
    }

    /// Log `entry` for a habit and refresh its cached streak.
    ///
    /// The streak is measured up to the entry's day. A completed entry
    /// always leaves a streak of at least 1.
    pub fn track_progress(&self, habit_id: &str, entry: CompletionEntry) -> Result<ProgressUpdate> {
        entry.validate()?;

        let mut habits = self.get_habits()?;
        let habit = habits
            .iter_mut()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| Error::HabitNotFound(habit_id.to_string()))?;

        let completed = entry.completed;
        let as_of = entry.date;
        habit.upsert_entry(entry);

        let summary = compute_streak(&habit.history, as_of, self.streak_window_days)?;
        habit.streak = if completed {
            summary.current.max(1)
        } else {
            summary.current
        };
        let updated = habit.clone();
        self.save_habits(&habits)?;

        let unlocked = if completed {
            self.unlock_streak_achievements(updated.streak)?
        } else {
            Vec::new()
        };

        info!(
            habit_id = %habit_id,
            date = %as_of,
            completed,
            streak = updated.streak,
            unlocked = unlocked.len(),
            "Tracked progress"
        );

        Ok(ProgressUpdate {
            habit: updated,
            unlocked,
        })
    }

    fn unlock_streak_achievements(&self, streak: u32) -> Result<Vec<String>> {
        let mut achievements = self.achievements()?;
        let mut unlocked = Vec::new();
        for (threshold, id) in STREAK_ACHIEVEMENTS {
            if streak >= *threshold && !achievements.iter().any(|a| a == id) {
                achievements.push(id.to_string());
                unlocked.push(id.to_string());
            }
        }
        if !unlocked.is_empty() {
            self.store.set(ACHIEVEMENTS_KEY, &achievements)?;
            debug!(?unlocked, "Unlocked achievements");
        }
        Ok(unlocked)
    }

    /// Unlocked achievement ids, in unlock order.
    pub fn achievements(&self) -> Result<Vec<String>> {
        Ok(self.store.get(ACHIEVEMENTS_KEY)?.unwrap_or_default())
    }
}

impl<S: KeyValueStore> HabitRepository for HabitStore<S> {
    fn get_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.store.get(HABITS_KEY)?.unwrap_or_default())
    }

    fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        Ok(self.get_habits()?.into_iter().find(|h| h.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::dates;
    use crate::db::Database;
    use crate::types::{EntryMetrics, Frequency};
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    fn test_store() -> HabitStore<Database> {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        HabitStore::new(db)
    }

    fn new_habit(name: &str) -> NewHabit {
        NewHabit {
            name: name.to_string(),
            description: None,
            category: "fitness".to_string(),
            frequency: Frequency::Daily,
        }
    }

    #[test]
    fn test_add_and_get() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let habit = store.add_habit(new_habit("  Morning run "), &clock).unwrap();

        assert_eq!(habit.name, "Morning run");
        assert_eq!(habit.streak, 0);
        assert!(habit.history.is_empty());
        assert!(uuid::Uuid::parse_str(&habit.id).is_ok());
        assert_eq!(habit.created_at, clock.now());

        assert_eq!(store.get_habits().unwrap(), vec![habit.clone()]);
        assert_eq!(store.get_habit(&habit.id).unwrap(), Some(habit));
        assert_eq!(store.get_habit("missing").unwrap(), None);
    }

    #[test]
    fn test_add_rejects_invalid() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let err = store.add_habit(new_habit("ab"), &clock).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.get_habits().unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let mut habit = store.add_habit(new_habit("Read a book"), &clock).unwrap();

        habit.category = "learning".to_string();
        store.update_habit(habit.clone()).unwrap();
        assert_eq!(
            store.get_habit(&habit.id).unwrap().unwrap().category,
            "learning"
        );

        let mut ghost = habit.clone();
        ghost.id = "ghost".to_string();
        assert!(matches!(
            store.update_habit(ghost),
            Err(Error::HabitNotFound(_))
        ));

        assert!(store.delete_habit(&habit.id).unwrap());
        assert!(!store.delete_habit(&habit.id).unwrap());
        assert!(store.get_habits().unwrap().is_empty());
    }

    #[test]
    fn test_track_progress_builds_streak() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let habit = store.add_habit(new_habit("Stretching"), &clock).unwrap();

        for d in ["2024-03-01", "2024-03-02", "2024-03-03"] {
            store
                .track_progress(&habit.id, CompletionEntry::new(day(d), true))
                .unwrap();
        }
        let stored = store.get_habit(&habit.id).unwrap().unwrap();
        assert_eq!(stored.streak, 3);
        assert_eq!(stored.history.len(), 3);
    }

    #[test]
    fn test_track_progress_upserts_same_day() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let habit = store.add_habit(new_habit("Stretching"), &clock).unwrap();

        store
            .track_progress(&habit.id, CompletionEntry::new(day("2024-03-01"), true))
            .unwrap();
        let update = store
            .track_progress(&habit.id, CompletionEntry::new(day("2024-03-01"), false))
            .unwrap();

        assert_eq!(update.habit.history.len(), 1);
        assert!(!update.habit.history[0].completed);
        assert_eq!(update.habit.streak, 0);
    }

    #[test]
    fn test_completed_past_day_floors_at_one() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-10"));
        let habit = store.add_habit(new_habit("Journal"), &clock).unwrap();

        let update = store
            .track_progress(&habit.id, CompletionEntry::new(day("2024-03-05"), true))
            .unwrap();
        assert_eq!(update.habit.streak, 1);
    }

    #[test]
    fn test_track_progress_validates() {
        let store = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let habit = store.add_habit(new_habit("Journal"), &clock).unwrap();

        let bad = CompletionEntry::new(day("2024-03-01"), true).with_metrics(EntryMetrics {
            quality: Some(9.0),
            ..Default::default()
        });
        assert!(matches!(
            store.track_progress(&habit.id, bad),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.track_progress("nope", CompletionEntry::new(day("2024-03-01"), true)),
            Err(Error::HabitNotFound(_))
        ));
    }

    #[test]
    fn test_streak_achievements_unlock_once() {
        let store = test_store();
        let start = day("2024-01-01");
        let clock = FixedClock::at_day(start);
        let habit = store.add_habit(new_habit("Meditate"), &clock).unwrap();

        let mut unlocked_at = Vec::new();
        for offset in 0..30 {
            let update = store
                .track_progress(
                    &habit.id,
                    CompletionEntry::new(dates::add_days(start, offset), true),
                )
                .unwrap();
            if !update.unlocked.is_empty() {
                unlocked_at.push((update.habit.streak, update.unlocked));
            }
        }

        assert_eq!(
            unlocked_at,
            vec![
                (7, vec!["streak-7".to_string()]),
                (30, vec!["streak-30".to_string()]),
            ]
        );
        assert_eq!(store.achievements().unwrap(), vec!["streak-7", "streak-30"]);

        // Re-logging the last day does not unlock again
        let update = store
            .track_progress(
                &habit.id,
                CompletionEntry::new(dates::add_days(start, 29), true),
            )
            .unwrap();
        assert!(update.unlocked.is_empty());
        assert_eq!(store.achievements().unwrap().len(), 2);
    }

    #[test]
    fn test_backup_roundtrip() {
        let source = test_store();
        let clock = FixedClock::at_day(day("2024-03-01"));
        let habit = source.add_habit(new_habit("Walk the dog"), &clock).unwrap();
        source
            .track_progress(&habit.id, CompletionEntry::new(day("2024-03-01"), true))
            .unwrap();

        let backup = source.export_backup(&clock).unwrap();
        let json = serde_json::to_string(&backup).unwrap();
        let parsed: Backup = serde_json::from_str(&json).unwrap();

        let target = test_store();
        target.add_habit(new_habit("Old habit"), &clock).unwrap();
        assert_eq!(target.import_backup(parsed).unwrap(), 1);
        assert_eq!(target.get_habits().unwrap(), source.get_habits().unwrap());
    }

    #[test]
    fn test_backup_accepts_partial_documents() {
        let store = test_store();
        let backup: Backup =
            serde_json::from_str(r#"{"achievements": ["streak-7"], "timestamp": "2024-03-01T00:00:00Z"}"#)
                .unwrap();
        assert!(backup.exported_at.is_some());
        assert_eq!(store.import_backup(backup).unwrap(), 0);
        assert_eq!(store.achievements().unwrap(), vec!["streak-7"]);
    }

    #[test]
    fn test_custom_streak_window() {
        let store = test_store().with_streak_window(2).unwrap();
        let start = day("2024-01-01");
        let habit = store
            .add_habit(new_habit("Meditate"), &FixedClock::at_day(start))
            .unwrap();
        let mut last = None;
        for offset in 0..5 {
            last = Some(
                store
                    .track_progress(
                        &habit.id,
                        CompletionEntry::new(dates::add_days(start, offset), true),
                    )
                    .unwrap(),
            );
        }
        assert!(last.unwrap().habit.streak <= 3);
        assert!(test_store().with_streak_window(-1).is_err());
    }
}
