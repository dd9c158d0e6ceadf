//! Heuristic success, timing and difficulty predictions for a single habit.
//!
//! Nothing here is a trained model: every prediction is a fixed blend of
//! simple statistics over the habit history. When a history is too short the
//! engine returns a neutral sentinel with `insufficient_data` set instead of
//! an error.

use super::stats::{clamp01, linear_regression, mean, rate, ratio, std_dev};
use super::streak::compute_streak;
use super::trend::{bucket_history, Granularity};
use crate::dates;
use crate::types::{normalize_history, CompletionEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Tunable constants of the prediction engine (`[analytics.prediction]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Recent entries needed for a success prediction
    #[serde(default = "default_min_success_entries")]
    pub min_success_entries: usize,
    #[serde(default = "default_min_timing_entries")]
    pub min_timing_entries: usize,
    /// Entries carrying a difficulty needed for a difficulty prediction
    #[serde(default = "default_min_difficulty_entries")]
    pub min_difficulty_entries: usize,
    /// Confidence reported with no data; grows toward 1 with more samples
    #[serde(default = "default_confidence_baseline")]
    pub confidence_baseline: f64,
    /// Exponential decay per day of age for recency weighting
    #[serde(default = "default_recency_falloff")]
    pub recency_falloff: f64,
    /// Trailing window defining "recent" history
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
    #[serde(default = "default_optimal_min_volume")]
    pub optimal_min_volume: u32,
    #[serde(default = "default_optimal_min_rate")]
    pub optimal_min_rate: f64,
}

fn default_min_success_entries() -> usize {
    7
}

fn default_min_timing_entries() -> usize {
    5
}

fn default_min_difficulty_entries() -> usize {
    10
}

fn default_confidence_baseline() -> f64 {
    0.6
}

fn default_recency_falloff() -> f64 {
    0.1
}

fn default_recent_window_days() -> i64 {
    30
}

fn default_optimal_min_volume() -> u32 {
    5
}

fn default_optimal_min_rate() -> f64 {
    0.7
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_success_entries: default_min_success_entries(),
            min_timing_entries: default_min_timing_entries(),
            min_difficulty_entries: default_min_difficulty_entries(),
            confidence_baseline: default_confidence_baseline(),
            recency_falloff: default_recency_falloff(),
            recent_window_days: default_recent_window_days(),
            optimal_min_volume: default_optimal_min_volume(),
            optimal_min_rate: default_optimal_min_rate(),
        }
    }
}

const INSUFFICIENT_DATA_NOTE: &str = "insufficient data";

/// Sample counts at which each horizon's confidence saturates.
const NEXT_DAY_FULL_CONFIDENCE: usize = 7;
const NEXT_WEEK_FULL_CONFIDENCE: usize = 14;
const LONG_TERM_FULL_CONFIDENCE: usize = 30;

/// Streak length and completion count at which a habit counts as formed.
const FORMED_STREAK_DAYS: f64 = 21.0;
const FORMED_COMPLETIONS: f64 = 66.0;
const FULLY_ADAPTABLE_CONTEXTS: f64 = 5.0;

// ============================================
// Results
// ============================================

/// Long-term projection at a horizon in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub days: i64,
    pub probability: f64,
}

/// Success estimate for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonPrediction {
    pub probability: f64,
    pub confidence: f64,
    pub insufficient_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Factor values that went into `probability`
    pub breakdown: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projections: Vec<Projection>,
}

impl HorizonPrediction {
    fn insufficient(baseline: f64) -> Self {
        Self {
            probability: 0.5,
            confidence: baseline,
            insufficient_data: true,
            note: Some(INSUFFICIENT_DATA_NOTE.to_string()),
            breakdown: BTreeMap::new(),
            projections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessPrediction {
    pub next_day: HorizonPrediction,
    pub next_week: HorizonPrediction,
    pub long_term: HorizonPrediction,
    pub insufficient_data: bool,
}

impl SuccessPrediction {
    fn insufficient(baseline: f64) -> Self {
        Self {
            next_day: HorizonPrediction::insufficient(baseline),
            next_week: HorizonPrediction::insufficient(baseline),
            long_term: HorizonPrediction::insufficient(baseline),
            insufficient_data: true,
        }
    }
}

/// One hour-of-day slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSlot {
    pub hour: u8,
    pub volume: u32,
    pub success_rate: f64,
    pub average_quality: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimalTime {
    pub hour: u8,
    /// 0.7 * success rate + 0.3 * quality / 5
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingPrediction {
    pub insufficient_data: bool,
    /// Best hours first, at most three
    pub optimal_times: Vec<OptimalTime>,
    /// Weekdays (0 = Sunday) with a success rate above the optimal rate
    pub recommended_weekdays: Vec<u8>,
    /// 1 - share of completions in the busiest hour; higher is more spread out
    pub flexibility: f64,
    pub confidence: f64,
    pub slots: Vec<TimeSlot>,
}

impl TimingPrediction {
    fn insufficient(baseline: f64) -> Self {
        Self {
            insufficient_data: true,
            optimal_times: Vec::new(),
            recommended_weekdays: Vec::new(),
            flexibility: 0.0,
            confidence: baseline,
            slots: Vec::new(),
        }
    }
}

/// Projected difficulty at a horizon, with its uncertainty range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyProjection {
    pub days: i64,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyPrediction {
    pub insufficient_data: bool,
    /// Recency-weighted mean difficulty, 1-5
    pub baseline: f64,
    pub variability: f64,
    pub trend_per_day: f64,
    /// Share of consecutive samples where difficulty did not rise
    pub adaptation_rate: f64,
    pub projections: Vec<DifficultyProjection>,
    pub confidence: f64,
}

impl DifficultyPrediction {
    fn insufficient(baseline_confidence: f64) -> Self {
        Self {
            insufficient_data: true,
            baseline: 3.0,
            variability: 0.0,
            trend_per_day: 0.0,
            adaptation_rate: 0.0,
            projections: Vec::new(),
            confidence: baseline_confidence,
        }
    }
}

/// All predictions for one habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub success: SuccessPrediction,
    pub timing: TimingPrediction,
    pub difficulty: DifficultyPrediction,
}

impl Predictions {
    /// Neutral predictions, as for an empty history.
    pub fn neutral(config: &PredictionConfig) -> Self {
        Self {
            success: SuccessPrediction::insufficient(config.confidence_baseline),
            timing: TimingPrediction::insufficient(config.confidence_baseline),
            difficulty: DifficultyPrediction::insufficient(config.confidence_baseline),
        }
    }
}

impl Default for Predictions {
    fn default() -> Self {
        Self::neutral(&PredictionConfig::default())
    }
}

// ============================================
// Engine
// ============================================

#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    config: PredictionConfig,
}

impl PredictionEngine {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub fn generate_predictions(&self, history: &[CompletionEntry], as_of: NaiveDate) -> Predictions {
        Predictions {
            success: self.predict_success(history, as_of),
            timing: self.predict_timing(history),
            difficulty: self.predict_difficulty(history),
        }
    }

    /// Success probabilities for tomorrow, the next week and the long term.
    pub fn predict_success(&self, history: &[CompletionEntry], as_of: NaiveDate) -> SuccessPrediction {
        let entries: Vec<CompletionEntry> = normalize_history(history)
            .into_iter()
            .filter(|e| e.date <= as_of)
            .collect();
        let window_start = dates::add_days(as_of, -self.config.recent_window_days);
        let recent: Vec<&CompletionEntry> =
            entries.iter().filter(|e| e.date >= window_start).collect();

        if recent.len() < self.config.min_success_entries {
            tracing::debug!(
                recent = recent.len(),
                required = self.config.min_success_entries,
                "Not enough recent history for a success prediction"
            );
            return SuccessPrediction::insufficient(self.config.confidence_baseline);
        }

        let prediction = SuccessPrediction {
            next_day: self.next_day(&recent, as_of),
            next_week: self.next_week(&recent, window_start),
            long_term: self.long_term(&entries, recent.len(), as_of),
            insufficient_data: false,
        };
        tracing::debug!(
            next_day = prediction.next_day.probability,
            next_week = prediction.next_week.probability,
            long_term = prediction.long_term.probability,
            "Predicted success"
        );
        prediction
    }

    fn next_day(&self, recent: &[&CompletionEntry], as_of: NaiveDate) -> HorizonPrediction {
        let last_week_start = dates::add_days(as_of, -6);
        let last_week: Vec<&CompletionEntry> = recent
            .iter()
            .copied()
            .filter(|e| e.date >= last_week_start)
            .collect();
        let recent_rate = completion_rate(&last_week);

        let (weighted, weights) = recent.iter().fold((0.0, 0.0), |(sum, total), e| {
            let age = dates::days_between(e.date, as_of).max(0) as f64;
            let weight = (-self.config.recency_falloff * age).exp();
            let value = if e.completed { 1.0 } else { 0.0 };
            (sum + weight * value, total + weight)
        });
        let momentum = ratio(weighted, weights);

        let tomorrow = dates::weekday_index(dates::add_days(as_of, 1));
        let same_weekday: Vec<&CompletionEntry> = recent
            .iter()
            .copied()
            .filter(|e| e.weekday() == tomorrow)
            .collect();
        let weekday_effect = if same_weekday.is_empty() {
            completion_rate(recent)
        } else {
            completion_rate(&same_weekday)
        };

        self.horizon(
            0.5 * recent_rate + 0.3 * momentum + 0.2 * weekday_effect,
            recent.len(),
            NEXT_DAY_FULL_CONFIDENCE,
            [
                ("recent_completion", recent_rate),
                ("momentum", momentum),
                ("weekday_effect", weekday_effect),
            ],
        )
    }

    fn next_week(&self, recent: &[&CompletionEntry], window_start: NaiveDate) -> HorizonPrediction {
        let weekly_pattern = mean(&weekday_rates(recent).into_values().collect::<Vec<_>>());

        let points: Vec<(f64, f64)> = recent
            .iter()
            .map(|e| {
                let x = dates::days_between(window_start, e.date) as f64;
                (x, if e.completed { 1.0 } else { 0.0 })
            })
            .collect();
        let window = self.config.recent_window_days as f64;
        let trend = linear_regression(&points).map_or(0.5, |fit| {
            0.5 + 0.5 * (fit.slope * window).clamp(-1.0, 1.0)
        });

        let consistency = consistency_score(recent);

        self.horizon(
            0.4 * weekly_pattern + 0.3 * trend + 0.3 * consistency,
            recent.len(),
            NEXT_WEEK_FULL_CONFIDENCE,
            [
                ("weekly_pattern", weekly_pattern),
                ("trend", trend),
                ("consistency", consistency),
            ],
        )
    }

    fn long_term(
        &self,
        entries: &[CompletionEntry],
        recent_len: usize,
        as_of: NaiveDate,
    ) -> HorizonPrediction {
        let weeks = bucket_history(entries, Granularity::Weekly);
        let overall = rate(
            entries.iter().filter(|e| e.completed).count(),
            entries.len(),
        );
        let points: Vec<(f64, f64)> = weeks
            .iter()
            .enumerate()
            .map(|(i, w)| (i as f64, w.rate() / 100.0))
            .collect();
        let fit = linear_regression(&points);
        let latest_week = weeks.len().saturating_sub(1) as f64;
        let trend = clamp01(fit.map_or(overall, |f| f.value_at(latest_week)));

        let span = entries
            .first()
            .map_or(0, |first| dates::days_between(first.date, as_of).max(0));
        let streak = compute_streak(entries, as_of, span)
            .map(|s| s.current)
            .unwrap_or(0);
        let completions = entries.iter().filter(|e| e.completed).count();
        let strength = 0.5 * (streak as f64 / FORMED_STREAK_DAYS).min(1.0)
            + 0.5 * (completions as f64 / FORMED_COMPLETIONS).min(1.0);

        let contexts: HashSet<[Option<&str>; 4]> = entries
            .iter()
            .filter(|e| e.completed)
            .filter_map(|e| e.context())
            .map(|c| c.fields())
            .collect();
        let adaptability = (contexts.len() as f64 / FULLY_ADAPTABLE_CONTEXTS).min(1.0);

        let mut prediction = self.horizon(
            0.4 * trend + 0.4 * strength + 0.2 * adaptability,
            recent_len,
            LONG_TERM_FULL_CONFIDENCE,
            [
                ("trend", trend),
                ("strength", strength),
                ("adaptability", adaptability),
            ],
        );
        prediction.projections = [90, 180]
            .into_iter()
            .map(|days| {
                // Extend the weekly fit `days / 7` weeks past the latest week
                let projected = fit.map_or(trend, |f| {
                    clamp01(f.value_at(latest_week + days as f64 / 7.0))
                });
                Projection {
                    days,
                    probability: clamp01(0.5 * projected + 0.5 * strength),
                }
            })
            .collect();
        prediction
    }

    fn horizon<const N: usize>(
        &self,
        probability: f64,
        samples: usize,
        full_confidence_at: usize,
        factors: [(&str, f64); N],
    ) -> HorizonPrediction {
        HorizonPrediction {
            probability: clamp01(probability),
            confidence: self.confidence(samples, full_confidence_at),
            insufficient_data: false,
            note: None,
            breakdown: factors
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            projections: Vec::new(),
        }
    }

    /// baseline + (1 - baseline) * min(samples / full, 1)
    fn confidence(&self, samples: usize, full_confidence_at: usize) -> f64 {
        let baseline = self.config.confidence_baseline;
        let fill = rate(samples, full_confidence_at).min(1.0);
        clamp01(baseline + (1.0 - baseline) * fill)
    }

    /// Best hours and weekdays to do the habit.
    pub fn predict_timing(&self, history: &[CompletionEntry]) -> TimingPrediction {
        let entries = normalize_history(history);
        if entries.len() < self.config.min_timing_entries {
            return TimingPrediction::insufficient(self.config.confidence_baseline);
        }

        // Only timestamped entries carry a real hour
        let timed: Vec<&CompletionEntry> = entries.iter().filter(|e| e.timestamp.is_some()).collect();
        let mut attempts = [0u32; 24];
        let mut successes = [0u32; 24];
        let mut quality = [0.0f64; 24];
        for entry in &timed {
            let hour = entry.hour() as usize % 24;
            attempts[hour] += 1;
            if entry.completed {
                successes[hour] += 1;
                quality[hour] += entry.metrics.as_ref().and_then(|m| m.quality).unwrap_or(0.0);
            }
        }
        let slots: Vec<TimeSlot> = (0..24)
            .map(|h| TimeSlot {
                hour: h as u8,
                volume: attempts[h],
                success_rate: rate(successes[h] as usize, attempts[h] as usize),
                average_quality: ratio(quality[h], successes[h] as f64),
            })
            .collect();

        let mut optimal_times: Vec<OptimalTime> = slots
            .iter()
            .filter(|s| {
                s.volume >= self.config.optimal_min_volume
                    && s.success_rate >= self.config.optimal_min_rate
            })
            .map(|s| OptimalTime {
                hour: s.hour,
                score: 0.7 * s.success_rate + 0.3 * s.average_quality / 5.0,
                confidence: self.confidence(s.volume as usize, 2 * self.config.optimal_min_volume as usize),
            })
            .collect();
        optimal_times.sort_by(|a, b| b.score.total_cmp(&a.score));
        optimal_times.truncate(3);

        let all: Vec<&CompletionEntry> = entries.iter().collect();
        let recommended_weekdays = weekday_rates(&all)
            .into_iter()
            .filter(|(_, r)| *r > self.config.optimal_min_rate)
            .map(|(day, _)| day)
            .collect();

        let total_successes: u32 = successes.iter().sum();
        let busiest = successes.iter().copied().max().unwrap_or(0);
        let flexibility = if total_successes == 0 {
            0.0
        } else {
            1.0 - rate(busiest as usize, total_successes as usize)
        };

        TimingPrediction {
            insufficient_data: false,
            optimal_times,
            recommended_weekdays,
            flexibility,
            confidence: self.confidence(timed.len(), LONG_TERM_FULL_CONFIDENCE),
            slots,
        }
    }

    /// Where perceived difficulty is heading.
    pub fn predict_difficulty(&self, history: &[CompletionEntry]) -> DifficultyPrediction {
        let samples: Vec<(NaiveDate, f64)> = normalize_history(history)
            .iter()
            .filter_map(|e| e.metrics.as_ref()?.difficulty.map(|d| (e.date, d)))
            .collect();
        // A trend needs at least two samples whatever the configured floor
        if samples.len() < self.config.min_difficulty_entries.max(2) {
            return DifficultyPrediction::insufficient(self.config.confidence_baseline);
        }

        let n = samples.len();
        let (weighted, weights) = samples.iter().enumerate().fold((0.0, 0.0), |(sum, total), (i, s)| {
            let weight = (-self.config.recency_falloff * (n - 1 - i) as f64).exp();
            (sum + weight * s.1, total + weight)
        });
        let baseline = ratio(weighted, weights).clamp(1.0, 5.0);

        let values: Vec<f64> = samples.iter().map(|s| s.1).collect();
        let variability = std_dev(&values);

        let first = samples[0].0;
        let points: Vec<(f64, f64)> = samples
            .iter()
            .map(|(d, v)| (dates::days_between(first, *d) as f64, *v))
            .collect();
        let trend_per_day = linear_regression(&points).map_or(0.0, |fit| fit.slope);

        let steady = values.windows(2).filter(|w| w[1] <= w[0]).count();
        let adaptation_rate = rate(steady, n - 1);

        let confidence = self.confidence(n, LONG_TERM_FULL_CONFIDENCE);
        let projections = [7, 30, 90]
            .into_iter()
            .map(|days| {
                let value =
                    (baseline + trend_per_day * days as f64 * adaptation_rate).clamp(1.0, 5.0);
                let uncertainty = (0.1 * (days as f64).sqrt()).min(0.5);
                DifficultyProjection {
                    days,
                    value,
                    min: (value - uncertainty).max(1.0),
                    max: (value + uncertainty).min(5.0),
                    confidence: confidence * (-(days as f64) / 365.0).exp(),
                }
            })
            .collect();

        DifficultyPrediction {
            insufficient_data: false,
            baseline,
            variability,
            trend_per_day,
            adaptation_rate,
            projections,
            confidence,
        }
    }
}

fn completion_rate(entries: &[&CompletionEntry]) -> f64 {
    rate(entries.iter().filter(|e| e.completed).count(), entries.len())
}

/// Completion rate per weekday that has at least one entry.
fn weekday_rates(entries: &[&CompletionEntry]) -> BTreeMap<u8, f64> {
    let mut counts: BTreeMap<u8, (usize, usize)> = BTreeMap::new();
    for entry in entries {
        let c = counts.entry(entry.weekday()).or_default();
        c.1 += 1;
        if entry.completed {
            c.0 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(day, (done, total))| (day, rate(done, total)))
        .collect()
}

/// max(0, 1 - sd / mean) of the day gaps between consecutive completions.
fn consistency_score(entries: &[&CompletionEntry]) -> f64 {
    let completed: Vec<NaiveDate> = entries.iter().filter(|e| e.completed).map(|e| e.date).collect();
    let intervals: Vec<f64> = completed
        .windows(2)
        .map(|w| dates::days_between(w[0], w[1]) as f64)
        .collect();
    if intervals.is_empty() {
        return 0.0;
    }
    let m = mean(&intervals);
    if m == 0.0 {
        return 0.0;
    }
    (1.0 - std_dev(&intervals) / m).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryMetrics;

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    fn daily(end: &str, len: i64, pattern: impl Fn(i64) -> bool) -> Vec<CompletionEntry> {
        let end = day(end);
        (0..len)
            .map(|i| CompletionEntry::new(dates::add_days(end, -(len - 1 - i)), pattern(i)))
            .collect()
    }

    #[test]
    fn test_insufficient_history_returns_sentinel() {
        let engine = PredictionEngine::default();
        let prediction = engine.predict_success(&daily("2024-03-10", 6, |_| true), day("2024-03-10"));
        assert!(prediction.insufficient_data);
        for horizon in [&prediction.next_day, &prediction.next_week, &prediction.long_term] {
            assert_eq!(horizon.probability, 0.5);
            assert_eq!(horizon.confidence, 0.6);
            assert!(horizon.insufficient_data);
            assert_eq!(horizon.note.as_deref(), Some("insufficient data"));
        }
    }

    #[test]
    fn test_old_entries_do_not_count_as_recent() {
        let engine = PredictionEngine::default();
        let prediction = engine.predict_success(&daily("2024-01-10", 20, |_| true), day("2024-03-10"));
        assert!(prediction.insufficient_data);
    }

    #[test]
    fn test_perfect_recent_history() {
        let engine = PredictionEngine::default();
        let prediction = engine.predict_success(&daily("2024-03-10", 14, |_| true), day("2024-03-10"));
        assert!(!prediction.insufficient_data);

        let next_day = &prediction.next_day;
        assert!((next_day.probability - 1.0).abs() < 1e-9);
        assert_eq!(next_day.confidence, 1.0);
        assert_eq!(next_day.breakdown["momentum"], 1.0);

        // every day completed: one-day intervals, flat trend
        let next_week = &prediction.next_week;
        assert_eq!(next_week.breakdown["consistency"], 1.0);
        assert_eq!(next_week.breakdown["trend"], 0.5);
        assert!((next_week.probability - 0.85).abs() < 1e-9);

        let long_term = &prediction.long_term;
        assert!((0.0..=1.0).contains(&long_term.probability));
        assert_eq!(long_term.projections.len(), 2);
        assert_eq!(long_term.projections[1].days, 180);
    }

    #[test]
    fn test_probabilities_bounded() {
        let engine = PredictionEngine::default();
        let history = daily("2024-03-10", 60, |i| i % 4 != 0);
        let prediction = engine.predict_success(&history, day("2024-03-10"));
        for horizon in [&prediction.next_day, &prediction.next_week, &prediction.long_term] {
            assert!((0.0..=1.0).contains(&horizon.probability));
            assert!((0.6..=1.0).contains(&horizon.confidence));
        }
    }

    #[test]
    fn test_improving_history_has_positive_trend_component() {
        let engine = PredictionEngine::default();
        let history = daily("2024-03-10", 30, |i| i >= 15);
        let prediction = engine.predict_success(&history, day("2024-03-10"));
        assert!(prediction.next_week.breakdown["trend"] > 0.5);
    }

    #[test]
    fn test_timing_prefers_reliable_hours() {
        let start = day("2024-03-01");
        let history: Vec<_> = (0..10)
            .map(|i| {
                let date = dates::add_days(start, i);
                let hour = if i < 6 { 7 } else { 21 };
                CompletionEntry::new(date, i < 6)
                    .with_timestamp(dates::start_of_day(date) + chrono::Duration::hours(hour))
                    .with_metrics(EntryMetrics {
                        quality: Some(5.0),
                        ..Default::default()
                    })
            })
            .collect();
        let timing = PredictionEngine::default().predict_timing(&history);

        assert!(!timing.insufficient_data);
        assert_eq!(timing.optimal_times.len(), 1);
        assert_eq!(timing.optimal_times[0].hour, 7);
        assert!((timing.optimal_times[0].score - 1.0).abs() < 1e-12);
        assert_eq!(timing.slots[21].volume, 4);
        assert_eq!(timing.flexibility, 0.0);

        let short = PredictionEngine::default().predict_timing(&history[..4]);
        assert!(short.insufficient_data);
    }

    #[test]
    fn test_difficulty_projection_ranges() {
        let start = day("2024-03-01");
        let history: Vec<_> = (0..12)
            .map(|i| {
                CompletionEntry::new(dates::add_days(start, i), true).with_metrics(EntryMetrics {
                    difficulty: Some(5.0 - (i as f64) * 0.25),
                    ..Default::default()
                })
            })
            .collect();
        let difficulty = PredictionEngine::default().predict_difficulty(&history);

        assert!(!difficulty.insufficient_data);
        assert!((difficulty.trend_per_day + 0.25).abs() < 1e-9);
        assert_eq!(difficulty.adaptation_rate, 1.0);
        assert_eq!(difficulty.projections.len(), 3);
        for p in &difficulty.projections {
            assert!((1.0..=5.0).contains(&p.value));
            assert!(p.min >= 1.0 && p.max <= 5.0);
            assert!(p.max - p.min <= 1.0 + 1e-12);
        }
        // 90 days of a falling trend bottoms out at the floor
        assert_eq!(difficulty.projections[2].value, 1.0);

        let short = PredictionEngine::default().predict_difficulty(&history[..9]);
        assert!(short.insufficient_data);
        assert_eq!(short.baseline, 3.0);
    }

    #[test]
    fn test_difficulty_needs_two_samples_even_with_zero_floor() {
        let engine = PredictionEngine::new(PredictionConfig {
            min_difficulty_entries: 0,
            ..Default::default()
        });
        assert!(engine.predict_difficulty(&[]).insufficient_data);

        let one = [CompletionEntry::new(day("2024-03-01"), true).with_metrics(EntryMetrics {
            difficulty: Some(4.0),
            ..Default::default()
        })];
        assert!(engine.predict_difficulty(&one).insufficient_data);
        // Entries without difficulty samples don't count either
        assert!(engine
            .predict_difficulty(&daily("2024-03-10", 5, |_| true))
            .insufficient_data);
    }

    #[test]
    fn test_generate_predictions_on_empty_history() {
        let predictions = PredictionEngine::default().generate_predictions(&[], day("2024-03-10"));
        assert_eq!(predictions, Predictions::default());
    }
}
