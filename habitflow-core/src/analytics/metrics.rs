//! Completion metrics bucketed by hour of day and day of week.

use super::stats::{mean, rate};
use crate::dates;
use crate::types::{normalize_history, CompletionEntry};
use serde::Serialize;

/// Aggregates for one hour or weekday bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    /// Hour (0-23) or weekday (0 = Sunday)
    pub index: u8,
    pub total: u32,
    pub completed: u32,
    /// completed / total, 0 for an empty bucket
    pub rate: f64,
    /// Mean duration in minutes of completed entries that logged one
    pub efficiency: f64,
    /// Mean quality of completed entries that logged one
    pub quality: f64,
}

/// Completion metrics for one habit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMetrics {
    pub total: u32,
    pub completed: u32,
    pub overall_rate: f64,
    /// 24 buckets, index = hour
    pub by_hour: Vec<Bucket>,
    /// 7 buckets, index 0 = Sunday
    pub by_weekday: Vec<Bucket>,
}

impl Default for CompletionMetrics {
    fn default() -> Self {
        compute_metrics(&[])
    }
}

impl CompletionMetrics {
    /// Hour with the highest completion rate, ties to the earliest hour.
    /// `None` when nothing was logged.
    pub fn peak_hour(&self) -> Option<u8> {
        best(&self.by_hour)
    }

    /// Weekday with the highest completion rate (0 = Sunday).
    pub fn best_weekday(&self) -> Option<u8> {
        best(&self.by_weekday)
    }
}

fn best(buckets: &[Bucket]) -> Option<u8> {
    let mut best: Option<&Bucket> = None;
    for bucket in buckets.iter().filter(|b| b.total > 0) {
        if best.map_or(true, |b| bucket.rate > b.rate) {
            best = Some(bucket);
        }
    }
    best.map(|b| b.index)
}

#[derive(Default)]
struct Accumulator {
    total: u32,
    completed: u32,
    durations: Vec<f64>,
    qualities: Vec<f64>,
}

impl Accumulator {
    fn add(&mut self, entry: &CompletionEntry) {
        self.total += 1;
        if !entry.completed {
            return;
        }
        self.completed += 1;
        if let Some(metrics) = &entry.metrics {
            if let Some(d) = metrics.duration {
                self.durations.push(d);
            }
            if let Some(q) = metrics.quality {
                self.qualities.push(q);
            }
        }
    }

    fn finish(self, index: u8) -> Bucket {
        Bucket {
            index,
            total: self.total,
            completed: self.completed,
            rate: rate(self.completed as usize, self.total as usize),
            efficiency: mean(&self.durations),
            quality: mean(&self.qualities),
        }
    }
}

/// Bucket a history by hour and weekday.
///
/// Hours come from the entry timestamp (midnight when absent); weekdays from
/// the entry date.
pub fn compute_metrics(history: &[CompletionEntry]) -> CompletionMetrics {
    let entries = normalize_history(history);

    let mut hours: Vec<Accumulator> = (0..24).map(|_| Accumulator::default()).collect();
    let mut weekdays: Vec<Accumulator> = (0..7).map(|_| Accumulator::default()).collect();

    for entry in &entries {
        hours[entry.hour() as usize % 24].add(entry);
        weekdays[dates::weekday_index(entry.date) as usize % 7].add(entry);
    }

    let total = entries.len() as u32;
    let completed = entries.iter().filter(|e| e.completed).count() as u32;

    CompletionMetrics {
        total,
        completed,
        overall_rate: rate(completed as usize, total as usize),
        by_hour: hours
            .into_iter()
            .enumerate()
            .map(|(i, acc)| acc.finish(i as u8))
            .collect(),
        by_weekday: weekdays
            .into_iter()
            .enumerate()
            .map(|(i, acc)| acc.finish(i as u8))
            .collect(),
    }
}
