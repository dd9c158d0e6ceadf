//! Dashboard summary and completion heatmap.
//!
//! The summary aggregates across all habits for a single day; the heatmap
//! renders one habit's trailing year.

use super::correlation::{CorrelationEngine, PairAgreement};
use super::streak::compute_union_streak;
use crate::dates;
use crate::types::{normalize_history, CompletionEntry, Habit};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-category completion for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCompletion {
    pub total: u32,
    pub completed: u32,
}

/// Aggregate statistics across all habits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    // Totals
    pub total_habits: u32,
    /// Habits whose cached streak is above zero
    pub active_streaks: u32,
    /// Habits with a completed entry today
    pub completed_today: u32,
    /// Distinct days with at least one completion
    pub total_completed_days: u32,
    pub achievements: u32,

    // Streaks over the union of completed days
    pub current_streak: u32,
    pub longest_streak: u32,

    /// Keyed by category id
    pub category_completions: BTreeMap<String, CategoryCompletion>,
    /// 30-day completion agreement of habit pairs
    pub completion_overview: Vec<PairAgreement>,
}

impl AnalyticsSummary {
    pub fn build(
        habits: &[Habit],
        achievements: &[String],
        today: NaiveDate,
        correlation: &CorrelationEngine,
    ) -> Self {
        let mut category_completions: BTreeMap<String, CategoryCompletion> = BTreeMap::new();
        let mut completed_today = 0;
        for habit in habits {
            let done = habit.completed_on(today);
            let slot = category_completions.entry(habit.category.clone()).or_default();
            slot.total += 1;
            if done {
                slot.completed += 1;
                completed_today += 1;
            }
        }

        let completed_days: BTreeSet<NaiveDate> = habits
            .iter()
            .flat_map(|h| normalize_history(&h.history))
            .filter(|e| e.completed)
            .map(|e| e.date)
            .collect();
        let streak = compute_union_streak(habits, today);

        Self {
            total_habits: habits.len() as u32,
            active_streaks: habits.iter().filter(|h| h.streak > 0).count() as u32,
            completed_today,
            total_completed_days: completed_days.len() as u32,
            achievements: achievements.len() as u32,
            current_streak: streak.current,
            longest_streak: streak.longest,
            category_completions,
            completion_overview: correlation.completion_overview(habits, today),
        }
    }
}

/// One day of a completion heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub completed: bool,
    /// 0-4
    pub intensity: f64,
}

pub const MAX_INTENSITY: f64 = 4.0;

/// `days` cells ending at `today`, oldest first.
///
/// Intensity is `completed + duration / 60 + quality / 5`, capped at 4.
pub fn heatmap(history: &[CompletionEntry], today: NaiveDate, days: u32) -> Vec<HeatmapCell> {
    let by_day: BTreeMap<NaiveDate, CompletionEntry> = normalize_history(history)
        .into_iter()
        .map(|e| (e.date, e))
        .collect();

    (0..days as i64)
        .rev()
        .map(|back| {
            let date = dates::add_days(today, -back);
            match by_day.get(&date) {
                Some(entry) => HeatmapCell {
                    date,
                    completed: entry.completed,
                    intensity: intensity(entry),
                },
                None => HeatmapCell {
                    date,
                    completed: false,
                    intensity: 0.0,
                },
            }
        })
        .collect()
}

fn intensity(entry: &CompletionEntry) -> f64 {
    let mut value = if entry.completed { 1.0 } else { 0.0 };
    if let Some(metrics) = &entry.metrics {
        value += metrics.duration.unwrap_or(0.0) / 60.0;
        value += metrics.quality.unwrap_or(0.0) / 5.0;
    }
    value.clamp(0.0, MAX_INTENSITY)
}

/// Format an hour for display (e.g., "2-3pm").
pub fn format_hour_range(hour: u8) -> String {
    let next_hour = (hour + 1) % 24;

    let format_hour = |h: u8| -> String {
        match h {
            0 => "12am".to_string(),
            1..=11 => format!("{}am", h),
            12 => "12pm".to_string(),
            13..=23 => format!("{}pm", h - 12),
            _ => format!("{}h", h),
        }
    };

    format!("{}-{}", format_hour(hour), format_hour(next_hour))
}
