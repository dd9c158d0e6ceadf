//! Analytics aggregation
//!
//! The engine owns the configured correlation and prediction components and
//! answers two requests: a cross-habit dashboard summary and a detailed
//! report for one habit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 get_detailed_analytics(habit_id)                │
//! │                                                                 │
//! │   HabitRepository ──► habit + all habits (snapshots)            │
//! │                                                                 │
//! │  ┌─────────┐ ┌────────┐ ┌──────────────┐ ┌────────┐            │
//! │  │ metrics │ │ streak │ │ correlations │ │ trends │  ...        │
//! │  └────┬────┘ └───┬────┘ └──────┬───────┘ └───┬────┘            │
//! │       │ scoped   │ threads     │             │                  │
//! │       ▼          ▼             ▼             ▼                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │ join: failed or panicked sections fall back to their    │   │
//! │  │ neutral default and are recorded as a SectionRun        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use super::correlation::{CorrelationAnalysis, CorrelationEngine};
use super::dashboard::{heatmap, AnalyticsSummary, HeatmapCell};
use super::metrics::{compute_metrics, CompletionMetrics};
use super::patterns::{detect_patterns, PatternReport};
use super::prediction::{PredictionEngine, Predictions};
use super::streak::{compute_streak, StreakSummary};
use super::trend::{analyze_trends, metric_trends, MetricTrends, TrendReport};
use crate::clock::Clock;
use crate::config::AnalyticsConfig;
use crate::db::HabitRepository;
use crate::error::Result;
use crate::types::{Habit, HabitId};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Instant;

// ============================================
// Section runs
// ============================================

/// Outcome of one detailed-analytics section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Success,
    /// The section returned an error
    Error,
    /// The section panicked
    Panicked,
    /// The section ran with partial input
    Degraded,
}

impl SectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStatus::Success => "success",
            SectionStatus::Error => "error",
            SectionStatus::Panicked => "panicked",
            SectionStatus::Degraded => "degraded",
        }
    }
}

/// Timing and status of one section, kept for observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRun {
    pub section: &'static str,
    pub duration_ms: i64,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Detailed analytics for one habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedAnalytics {
    pub habit_id: HabitId,
    pub as_of: NaiveDate,
    pub metrics: CompletionMetrics,
    pub streak: StreakSummary,
    pub correlations: CorrelationAnalysis,
    pub trends: TrendReport,
    pub metric_trends: MetricTrends,
    pub predictions: Predictions,
    pub patterns: PatternReport,
    pub heatmap: Vec<HeatmapCell>,
    pub runs: Vec<SectionRun>,
}

impl DetailedAnalytics {
    /// Whether every section completed normally.
    pub fn is_complete(&self) -> bool {
        self.runs.iter().all(|r| r.status == SectionStatus::Success)
    }
}

// ============================================
// Analytics engine
// ============================================

/// Entry point for dashboard and per-habit analytics.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    correlation: CorrelationEngine,
    prediction: PredictionEngine,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        tracing::info!(
            streak_window_days = config.streak_window_days,
            heatmap_days = config.heatmap_days,
            "Created analytics engine"
        );
        Self {
            correlation: CorrelationEngine::new(config.correlation.clone()),
            prediction: PredictionEngine::new(config.prediction.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn correlation(&self) -> &CorrelationEngine {
        &self.correlation
    }

    pub fn prediction(&self) -> &PredictionEngine {
        &self.prediction
    }

    /// Dashboard summary across all habits for `today`.
    pub fn get_analytics(
        &self,
        habits: &[Habit],
        achievements: &[String],
        today: NaiveDate,
    ) -> AnalyticsSummary {
        let summary = AnalyticsSummary::build(habits, achievements, today, &self.correlation);
        tracing::debug!(
            habits = summary.total_habits,
            completed_today = summary.completed_today,
            current_streak = summary.current_streak,
            "Computed analytics summary"
        );
        summary
    }

    /// Detailed analytics for one habit, `None` if it does not exist.
    ///
    /// Only a failure to load the habit itself is returned as an error.
    /// Every other failure degrades the affected section.
    pub fn get_detailed_analytics(
        &self,
        habit_id: &str,
        repository: &dyn HabitRepository,
        clock: &dyn Clock,
    ) -> Result<Option<DetailedAnalytics>> {
        let today = clock.today();
        let Some(habit) = repository.get_habit(habit_id)? else {
            tracing::debug!(habit_id, "Habit not found for detailed analytics");
            return Ok(None);
        };

        tracing::info!(habit_id, %today, "Computing detailed analytics");
        let mut runs = Vec::new();

        let all_habits = match repository.get_habits() {
            Ok(habits) => Some(habits),
            Err(e) => {
                tracing::warn!(
                    habit_id,
                    error = %e,
                    "Failed to load habits; correlations degraded"
                );
                runs.push(SectionRun {
                    section: "load_habits",
                    duration_ms: 0,
                    status: SectionStatus::Degraded,
                    error_message: Some(e.to_string()),
                });
                None
            }
        };
        let others: &[Habit] = all_habits.as_deref().unwrap_or(&[]);
        let history = habit.history.as_slice();
        let window = self.config.streak_window_days;
        let heatmap_days = self.config.heatmap_days;

        let detailed = std::thread::scope(|s| {
            let metrics = s.spawn(|| timed(|| Ok(compute_metrics(history))));
            let streak = s.spawn(|| timed(|| compute_streak(history, today, window)));
            let correlations =
                s.spawn(|| timed(|| Ok(self.correlation.analyze_all(&habit, others, today))));
            let trends = s.spawn(|| timed(|| Ok(analyze_trends(history))));
            let metric_trends = s.spawn(|| timed(|| Ok(metric_trends(history))));
            let predictions =
                s.spawn(|| timed(|| Ok(self.prediction.generate_predictions(history, today))));
            let patterns = s.spawn(|| timed(|| Ok(detect_patterns(history))));
            let cells = s.spawn(|| timed(|| Ok(heatmap(history, today, heatmap_days))));

            DetailedAnalytics {
                habit_id: habit.id.clone(),
                as_of: today,
                metrics: collect("metrics", metrics.join(), &mut runs, CompletionMetrics::default),
                streak: collect("streak", streak.join(), &mut runs, StreakSummary::default),
                correlations: collect(
                    "correlations",
                    correlations.join(),
                    &mut runs,
                    CorrelationAnalysis::default,
                ),
                trends: collect("trends", trends.join(), &mut runs, TrendReport::default),
                metric_trends: collect(
                    "metric_trends",
                    metric_trends.join(),
                    &mut runs,
                    MetricTrends::default,
                ),
                predictions: collect("predictions", predictions.join(), &mut runs, || {
                    Predictions::neutral(self.prediction.config())
                }),
                patterns: collect("patterns", patterns.join(), &mut runs, PatternReport::default),
                heatmap: collect("heatmap", cells.join(), &mut runs, || {
                    heatmap(&[], today, heatmap_days)
                }),
                runs: Vec::new(),
            }
        });

        let detailed = DetailedAnalytics { runs, ..detailed };
        tracing::info!(
            habit_id,
            complete = detailed.is_complete(),
            sections = detailed.runs.len(),
            "Detailed analytics computed"
        );
        Ok(Some(detailed))
    }
}

type Timed<T> = (Result<T>, i64);

fn timed<T>(f: impl FnOnce() -> Result<T>) -> Timed<T> {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_millis() as i64)
}

/// Unwrap a joined section, falling back to `fallback` on error or panic.
fn collect<T>(
    section: &'static str,
    joined: std::thread::Result<Timed<T>>,
    runs: &mut Vec<SectionRun>,
    fallback: impl FnOnce() -> T,
) -> T {
    match joined {
        Ok((Ok(value), duration_ms)) => {
            tracing::debug!(section, duration_ms, "Section completed");
            runs.push(SectionRun {
                section,
                duration_ms,
                status: SectionStatus::Success,
                error_message: None,
            });
            value
        }
        Ok((Err(e), duration_ms)) => {
            tracing::warn!(section, error = %e, "Section failed; using neutral default");
            runs.push(SectionRun {
                section,
                duration_ms,
                status: SectionStatus::Error,
                error_message: Some(e.to_string()),
            });
            fallback()
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(section, panic = %message, "Section panicked; using neutral default");
            runs.push(SectionRun {
                section,
                duration_ms: 0,
                status: SectionStatus::Panicked,
                error_message: Some(message),
            });
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::dates;
    use crate::error::Error;
    use crate::types::{CompletionEntry, Frequency};
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    fn habit(id: &str, days: i64) -> Habit {
        let end = day("2024-03-10");
        Habit {
            id: id.to_string(),
            name: format!("Habit {id}"),
            description: None,
            category: "health".to_string(),
            frequency: Frequency::Daily,
            created_at: Utc::now(),
            history: (0..days)
                .map(|i| CompletionEntry::new(dates::add_days(end, -i), true))
                .collect(),
            streak: 0,
        }
    }

    /// Repository whose `get_habits` always fails.
    struct FlakyRepository(Habit);

    impl HabitRepository for FlakyRepository {
        fn get_habits(&self) -> Result<Vec<Habit>> {
            Err(Error::Storage("disk on fire".to_string()))
        }

        fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
            Ok((self.0.id == id).then(|| self.0.clone()))
        }
    }

    struct VecRepository(Vec<Habit>);

    impl HabitRepository for VecRepository {
        fn get_habits(&self) -> Result<Vec<Habit>> {
            Ok(self.0.clone())
        }

        fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
            Ok(self.0.iter().find(|h| h.id == id).cloned())
        }
    }

    #[test]
    fn test_get_analytics_empty() {
        let summary = AnalyticsEngine::default().get_analytics(&[], &[], day("2024-03-10"));
        assert_eq!(summary.total_habits, 0);
        assert_eq!(summary.active_streaks, 0);
        assert_eq!(summary.completed_today, 0);
        assert_eq!(summary.current_streak, 0);
        assert_eq!(summary.longest_streak, 0);
        assert_eq!(summary.total_completed_days, 0);
        assert_eq!(summary.achievements, 0);
    }

    #[test]
    fn test_detailed_analytics_missing_habit() {
        let repo = VecRepository(vec![habit("a", 3)]);
        let clock = FixedClock::at_day(day("2024-03-10"));
        let result = AnalyticsEngine::default()
            .get_detailed_analytics("nope", &repo, &clock)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_detailed_analytics_sections() {
        let repo = VecRepository(vec![habit("a", 8), habit("b", 8)]);
        let clock = FixedClock::at_day(day("2024-03-10"));
        let detailed = AnalyticsEngine::default()
            .get_detailed_analytics("a", &repo, &clock)
            .unwrap()
            .unwrap();

        assert_eq!(detailed.habit_id, "a");
        assert_eq!(detailed.streak, StreakSummary { current: 8, longest: 8 });
        assert_eq!(detailed.metrics.completed, 8);
        assert_eq!(detailed.heatmap.len(), 365);
        assert!(!detailed.predictions.success.insufficient_data);
        assert_eq!(detailed.runs.len(), 8);
        assert!(detailed.is_complete());
    }

    #[test]
    fn test_repository_failure_degrades_correlations() {
        let repo = FlakyRepository(habit("a", 8));
        let clock = FixedClock::at_day(day("2024-03-10"));
        let detailed = AnalyticsEngine::default()
            .get_detailed_analytics("a", &repo, &clock)
            .unwrap()
            .unwrap();

        assert!(detailed.correlations.ranked.is_empty());
        assert_eq!(detailed.streak.current, 8);
        assert!(!detailed.is_complete());
        assert_eq!(detailed.runs[0].status, SectionStatus::Degraded);
    }

    #[test]
    fn test_collect_falls_back_on_error_and_panic() {
        let mut runs = Vec::new();

        let failed: std::thread::Result<Timed<u32>> =
            Ok((Err(Error::invalid("bad window")), 3));
        assert_eq!(collect("streak", failed, &mut runs, || 7), 7);

        let panicked = std::thread::scope(|s| {
            s.spawn(|| -> Timed<u32> { panic!("boom") }).join()
        });
        assert_eq!(collect("patterns", panicked, &mut runs, || 9), 9);

        assert_eq!(runs[0].status, SectionStatus::Error);
        assert_eq!(runs[1].status, SectionStatus::Panicked);
        assert_eq!(runs[1].error_message.as_deref(), Some("boom"));
    }
}
