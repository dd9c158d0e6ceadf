//! Streak calculation.
//!
//! A streak is a run of completed calendar days with no gap larger than one
//! day. The current streak is anchored at a reference day (`as_of`) and only
//! looks back a bounded window; the longest streak scans everything.

use crate::dates;
use crate::error::{Error, Result};
use crate::types::{normalize_history, CompletionEntry, Habit};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Window used when recomputing the cached streak on a habit.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Current and longest streak, in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Compute the streaks of one habit history.
///
/// Entries after `as_of` are ignored for the current streak. Returns
/// [`Error::InvalidInput`] when `window_days` is negative.
pub fn compute_streak(
    history: &[CompletionEntry],
    as_of: NaiveDate,
    window_days: i64,
) -> Result<StreakSummary> {
    if window_days < 0 {
        return Err(Error::invalid(format!(
            "streak window must be non-negative, got {window_days}"
        )));
    }

    let entries = normalize_history(history);
    if entries.is_empty() {
        return Ok(StreakSummary::default());
    }

    let window_start = dates::add_days(as_of, -window_days);
    let mut current = walk_current(
        entries
            .iter()
            .rev()
            .filter(|e| e.date <= as_of)
            .map(|e| (e.date, e.completed)),
        as_of,
        Some(window_start),
    );

    if entries
        .iter()
        .rev()
        .find(|e| e.date == as_of)
        .is_some_and(|e| e.completed)
    {
        current = current.max(1);
    }

    let longest = longest_run(entries.iter().map(|e| (e.date, e.completed))).max(current);

    tracing::debug!(
        entries = entries.len(),
        %as_of,
        window_days,
        current,
        longest,
        "Computed streak"
    );
    Ok(StreakSummary { current, longest })
}

/// Streaks over the union of days on which at least one habit was completed.
///
/// The current streak is not bounded by a window here.
pub fn compute_union_streak(habits: &[Habit], as_of: NaiveDate) -> StreakSummary {
    let days: BTreeSet<NaiveDate> = habits
        .iter()
        .flat_map(|h| normalize_history(&h.history))
        .filter(|e| e.completed)
        .map(|e| e.date)
        .collect();

    let current = walk_current(
        days.iter().rev().filter(|d| **d <= as_of).map(|d| (*d, true)),
        as_of,
        None,
    );
    let longest = longest_run(days.iter().map(|d| (*d, true))).max(current);

    StreakSummary { current, longest }
}

/// Count consecutive completed days walking backwards from `as_of`.
///
/// `entries` must be sorted by date descending.
fn walk_current(
    entries: impl Iterator<Item = (NaiveDate, bool)>,
    as_of: NaiveDate,
    window_start: Option<NaiveDate>,
) -> u32 {
    let mut count = 0u32;
    let mut last = as_of;

    for (date, completed) in entries {
        if window_start.is_some_and(|start| date < start) {
            break;
        }
        if dates::days_between(date, last) > 1 {
            break;
        }
        if !completed {
            break;
        }
        count += 1;
        last = date;
    }
    count
}

/// Longest run of completed, gap-free days. `entries` sorted ascending.
fn longest_run(entries: impl Iterator<Item = (NaiveDate, bool)>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for (date, completed) in entries {
        if !completed {
            run = 0;
            previous = None;
            continue;
        }
        run = match previous {
            Some(prev) if dates::days_between(prev, date) <= 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Frequency;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    fn run(end: &str, len: i64) -> Vec<CompletionEntry> {
        let end = day(end);
        (0..len)
            .rev()
            .map(|i| CompletionEntry::new(dates::add_days(end, -i), true))
            .collect()
    }

    fn habit(id: &str, history: Vec<CompletionEntry>) -> Habit {
        Habit {
            id: id.to_string(),
            name: format!("Habit {id}"),
            description: None,
            category: "health".to_string(),
            frequency: Frequency::Daily,
            created_at: Utc::now(),
            history,
            streak: 0,
        }
    }

    #[test]
    fn test_empty_history() {
        let summary = compute_streak(&[], day("2024-03-10"), 30).unwrap();
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn test_consecutive_run_ending_today() {
        let history = run("2024-03-10", 8);
        let summary = compute_streak(&history, day("2024-03-10"), 30).unwrap();
        assert_eq!(summary, StreakSummary { current: 8, longest: 8 });
    }

    #[test]
    fn test_negative_window_rejected() {
        let err = compute_streak(&run("2024-03-10", 2), day("2024-03-10"), -1).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_two_day_gap_breaks_streak() {
        let mut history = run("2024-03-05", 3);
        history.extend(run("2024-03-10", 2)); // 03-09, 03-10; 03-06..08 missing
        let summary = compute_streak(&history, day("2024-03-10"), 30).unwrap();
        assert_eq!(summary.current, 2);
        assert_eq!(summary.longest, 3);
    }

    #[test]
    fn test_unlogged_today_keeps_yesterdays_run() {
        // Nothing logged yet on 03-11, yesterday's run still counts
        let history = vec![
            CompletionEntry::new(day("2024-03-09"), true),
            CompletionEntry::new(day("2024-03-10"), true),
        ];
        let summary = compute_streak(&history, day("2024-03-11"), 30).unwrap();
        assert_eq!(summary.current, 2);
    }

    #[test]
    fn test_incomplete_entry_breaks_streak() {
        let mut history = run("2024-03-08", 4);
        history.push(CompletionEntry::new(day("2024-03-09"), false));
        history.push(CompletionEntry::new(day("2024-03-10"), true));
        let summary = compute_streak(&history, day("2024-03-10"), 30).unwrap();
        assert_eq!(summary.current, 1);
        assert_eq!(summary.longest, 4);
    }

    #[test]
    fn test_window_bounds_current_streak() {
        let history = run("2024-03-10", 20);
        let summary = compute_streak(&history, day("2024-03-10"), 5).unwrap();
        assert_eq!(summary.current, 6);
        assert_eq!(summary.longest, 20);
    }

    #[test]
    fn test_zero_window_floors_at_one() {
        let history = run("2024-03-10", 5);
        let summary = compute_streak(&history, day("2024-03-10"), 0).unwrap();
        assert_eq!(summary.current, 1);
        assert!(summary.longest >= summary.current);
    }

    #[test]
    fn test_duplicate_dates_last_write_wins() {
        let history = vec![
            CompletionEntry::new(day("2024-03-09"), true),
            CompletionEntry::new(day("2024-03-10"), false),
            CompletionEntry::new(day("2024-03-10"), true),
        ];
        let summary = compute_streak(&history, day("2024-03-10"), 30).unwrap();
        assert_eq!(summary, StreakSummary { current: 2, longest: 2 });
    }

    #[test]
    fn test_future_entries_ignored_for_current() {
        let history = run("2024-03-12", 5);
        let summary = compute_streak(&history, day("2024-03-10"), 30).unwrap();
        assert_eq!(summary.current, 3);
        assert_eq!(summary.longest, 5);
    }

    #[test]
    fn test_union_streak_across_habits() {
        let a = habit("a", run("2024-03-08", 3)); // 06, 07, 08
        let b = habit(
            "b",
            vec![
                CompletionEntry::new(day("2024-03-09"), true),
                CompletionEntry::new(day("2024-03-10"), true),
                CompletionEntry::new(day("2024-03-01"), false),
            ],
        );
        let summary = compute_union_streak(&[a, b], day("2024-03-10"));
        assert_eq!(summary, StreakSummary { current: 5, longest: 5 });
        assert_eq!(compute_union_streak(&[], day("2024-03-10")), StreakSummary::default());
    }
}
