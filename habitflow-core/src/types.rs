//! Core domain types for habitflow
//!
//! Records serialize with camelCase field names, matching the JSON blobs kept
//! in the key-value store.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Habit** | Something the person wants to do regularly |
//! | **Entry** | One logged day for a habit ([`CompletionEntry`]) |
//! | **History** | All entries of a habit, in insertion order |
//! | **Streak** | Consecutive completed days ending at a reference day |
//!
//! A history holds at most one entry per calendar day. Re-logging a day
//! replaces the earlier entry ([`Habit::upsert_entry`]); analytics additionally
//! normalise with [`normalize_history`] so stale duplicates in imported data
//! never double count.

use crate::dates;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque, stable habit identifier.
pub type HabitId = String;

// ============================================
// Habit
// ============================================

/// How often a habit is meant to be done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(Error::invalid(format!("unknown frequency: {s}"))),
        }
    }
}

/// A tracked habit together with its completion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category id, see [`crate::categories`]
    pub category: String,
    #[serde(default)]
    pub frequency: Frequency,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<CompletionEntry>,
    /// Cached current streak, rewritten on every completion update
    #[serde(default)]
    pub streak: u32,
}

impl Habit {
    /// Entry logged for `date`, if any (last write wins).
    pub fn entry_on(&self, date: NaiveDate) -> Option<&CompletionEntry> {
        self.history.iter().rev().find(|e| e.date == date)
    }

    /// Whether the habit has a completed entry on `date`.
    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.entry_on(date).is_some_and(|e| e.completed)
    }

    /// Insert `entry`, replacing any entry already logged for the same day.
    pub fn upsert_entry(&mut self, entry: CompletionEntry) {
        match self.history.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => *existing = entry,
            None => self.history.push(entry),
        }
    }
}

/// Fields supplied when creating a habit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub frequency: Frequency,
}

impl NewHabit {
    /// Reject names outside 3-50 characters and blank categories.
    pub fn validate(&self) -> Result<()> {
        let len = self.name.trim().chars().count();
        if len < 3 {
            return Err(Error::invalid("habit name must be at least 3 characters long"));
        }
        if len > 50 {
            return Err(Error::invalid("habit name must be less than 50 characters"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::invalid("habit category is required"));
        }
        Ok(())
    }
}

// ============================================
// Completion entries
// ============================================

/// One logged day for a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEntry {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    pub completed: bool,
    /// When the entry was logged; supplies hour-of-day information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EntryMetrics>,
}

impl CompletionEntry {
    pub fn new(date: NaiveDate, completed: bool) -> Self {
        Self {
            date,
            completed,
            timestamp: None,
            metrics: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_metrics(mut self, metrics: EntryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The instant this entry happened: its timestamp, or midnight UTC of
    /// its date.
    pub fn instant(&self) -> DateTime<Utc> {
        self.timestamp
            .unwrap_or_else(|| dates::start_of_day(self.date))
    }

    /// Hour of day (0-23); 0 when the entry has no timestamp.
    pub fn hour(&self) -> u8 {
        dates::hour_of(self.instant())
    }

    /// Day of week, 0 = Sunday.
    pub fn weekday(&self) -> u8 {
        dates::weekday_index(self.date)
    }

    pub fn context(&self) -> Option<&EntryContext> {
        self.metrics.as_ref().and_then(|m| m.context.as_ref())
    }

    /// Fill in the context fields derivable from the entry itself: the day
    /// type from its date and, when timestamped, the time of day. Values
    /// already present are kept.
    pub fn with_observed_context(mut self) -> Self {
        let time_of_day = self
            .timestamp
            .map(|t| dates::TimeOfDay::from_hour(dates::hour_of(t)));
        let day_type = dates::DayType::of(self.date);

        let context = self
            .metrics
            .get_or_insert_with(EntryMetrics::default)
            .context
            .get_or_insert_with(EntryContext::default);
        if context.day_type.is_none() {
            context.day_type = Some(day_type.as_str().to_string());
        }
        if context.time_of_day.is_none() {
            context.time_of_day = time_of_day.map(|t| t.as_str().to_string());
        }
        self
    }

    /// Validate the attached metrics, if any.
    pub fn validate(&self) -> Result<()> {
        match &self.metrics {
            Some(metrics) => metrics.validate(),
            None => Ok(()),
        }
    }
}

/// Optional measurements attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetrics {
    /// Minutes spent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Self-rated quality, 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    /// Perceived difficulty, 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    /// Energy level, 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    /// Partial progress in percent, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EntryContext>,
}

impl EntryMetrics {
    /// Reject out-of-range values instead of coercing them.
    pub fn validate(&self) -> Result<()> {
        check_range("quality", self.quality, 1.0, 5.0)?;
        check_range("difficulty", self.difficulty, 1.0, 5.0)?;
        check_range("energy", self.energy, 1.0, 5.0)?;
        check_range("progress", self.progress, 0.0, 100.0)?;
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(Error::invalid(format!(
                    "duration must be a non-negative number of minutes, got {duration}"
                )));
            }
        }
        Ok(())
    }
}

fn check_range(name: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(Error::invalid(format!(
            "{name} must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

/// Environmental context of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

impl EntryContext {
    /// The four comparable fields in a fixed order.
    pub fn fields(&self) -> [Option<&str>; 4] {
        [
            self.location.as_deref(),
            self.weather.as_deref(),
            self.time_of_day.as_deref(),
            self.day_type.as_deref(),
        ]
    }
}

/// Collapse a history to one entry per date (the last one written wins),
/// sorted by date ascending.
pub fn normalize_history(history: &[CompletionEntry]) -> Vec<CompletionEntry> {
    let mut by_day: BTreeMap<NaiveDate, &CompletionEntry> = BTreeMap::new();
    for entry in history {
        by_day.insert(entry.date, entry);
    }
    by_day.into_values().cloned().collect()
}
