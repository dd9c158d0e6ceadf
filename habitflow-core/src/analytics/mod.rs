//! Analytics module for habitflow
//!
//! Provides per-habit and cross-habit insights including:
//! - Streaks and completion metrics
//! - Completion and per-metric trends
//! - Correlations between habits
//! - Success, timing and difficulty predictions
//! - Behavioral and contextual patterns
//! - Dashboard summary and heatmap
//!
//! Everything here is a synchronous computation over habit snapshots. See
//! [`engine`] for the aggregator that wires the pieces together.

pub mod correlation;
pub mod dashboard;
pub mod engine;
pub mod metrics;
pub mod patterns;
pub mod prediction;
pub mod stats;
pub mod streak;
pub mod trend;

// Engine exports
pub use engine::{AnalyticsEngine, DetailedAnalytics, SectionRun, SectionStatus};

pub use correlation::{
    CorrelationAnalysis, CorrelationConfig, CorrelationEngine, CorrelationKind, CorrelationResult,
};
pub use dashboard::{AnalyticsSummary, HeatmapCell};
pub use metrics::{compute_metrics, CompletionMetrics};
pub use patterns::{analyze_performance, detect_patterns, PatternReport};
pub use prediction::{PredictionConfig, PredictionEngine, Predictions};
pub use streak::{compute_streak, compute_union_streak, StreakSummary};
pub use trend::{analyze_trend, analyze_trends, bucket_history, metric_trends, TrendDirection};
