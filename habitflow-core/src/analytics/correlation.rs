//! Pairwise habit correlation.
//!
//! Two habits are compared along four independent axes, each scored in
//! [0, 1]:
//!
//! | Axis | Measures |
//! |------|----------|
//! | completion | agreement of the completed flag on shared days, over 7/30/90 day windows |
//! | timing | how often completions happen within 30 min (same time) or 2 h (sequential) |
//! | performance | positive Pearson correlation of per-entry performance scores |
//! | context | matching location / weather / time of day / day type |
//!
//! The overall score is the weighted sum of the four, so it is symmetric in
//! the two habits and stays in [0, 1] whenever the weights sum to 1.

use super::stats::{clamp01, pearson, rate, ratio};
use crate::dates;
use crate::types::{normalize_history, CompletionEntry, EntryMetrics, Habit, HabitId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Configuration
// ============================================

/// Weights of the four sub-scores. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationWeights {
    #[serde(default = "default_completion_weight")]
    pub completion: f64,
    #[serde(default = "default_timing_weight")]
    pub timing: f64,
    #[serde(default = "default_performance_weight")]
    pub performance: f64,
    #[serde(default = "default_context_weight")]
    pub context: f64,
}

fn default_completion_weight() -> f64 {
    0.4
}

fn default_timing_weight() -> f64 {
    0.3
}

fn default_performance_weight() -> f64 {
    0.2
}

fn default_context_weight() -> f64 {
    0.1
}

impl Default for CorrelationWeights {
    fn default() -> Self {
        Self {
            completion: default_completion_weight(),
            timing: default_timing_weight(),
            performance: default_performance_weight(),
            context: default_context_weight(),
        }
    }
}

impl CorrelationWeights {
    pub fn sum(&self) -> f64 {
        self.completion + self.timing + self.performance + self.context
    }
}

/// Tunable thresholds of the correlation engine (`[analytics.correlation]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default)]
    pub weights: CorrelationWeights,
    /// Minimum overall score of a significant correlation
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Minimum confidence of a significant correlation
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Sample size at which confidence reaches 1
    #[serde(default = "default_confidence_sample_size")]
    pub confidence_sample_size: u32,
    /// Overall score above which a pair is reported as a dependency
    #[serde(default = "default_dependency_threshold")]
    pub dependency_threshold: f64,
    /// Sub-score above which a dependency takes that sub-score's kind
    #[serde(default = "default_dependency_kind_threshold")]
    pub dependency_kind_threshold: f64,
    /// Sub-score above which an insight carries a recommendation
    #[serde(default = "default_recommendation_threshold")]
    pub recommendation_threshold: f64,
    #[serde(default = "default_same_time_minutes")]
    pub same_time_minutes: i64,
    #[serde(default = "default_sequential_minutes")]
    pub sequential_minutes: i64,
    /// Window of the dashboard completion overview
    #[serde(default = "default_overview_window_days")]
    pub overview_window_days: i64,
    /// Shared days needed before a pair shows up in the overview
    #[serde(default = "default_overview_min_shared_days")]
    pub overview_min_shared_days: u32,
}

fn default_min_score() -> f64 {
    0.5
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_confidence_sample_size() -> u32 {
    30
}

fn default_dependency_threshold() -> f64 {
    0.8
}

fn default_dependency_kind_threshold() -> f64 {
    0.9
}

fn default_recommendation_threshold() -> f64 {
    0.7
}

fn default_same_time_minutes() -> i64 {
    30
}

fn default_sequential_minutes() -> i64 {
    120
}

fn default_overview_window_days() -> i64 {
    30
}

fn default_overview_min_shared_days() -> u32 {
    7
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            weights: CorrelationWeights::default(),
            min_score: default_min_score(),
            min_confidence: default_min_confidence(),
            confidence_sample_size: default_confidence_sample_size(),
            dependency_threshold: default_dependency_threshold(),
            dependency_kind_threshold: default_dependency_kind_threshold(),
            recommendation_threshold: default_recommendation_threshold(),
            same_time_minutes: default_same_time_minutes(),
            sequential_minutes: default_sequential_minutes(),
            overview_window_days: default_overview_window_days(),
            overview_min_shared_days: default_overview_min_shared_days(),
        }
    }
}

/// Completion windows (days) and their weights.
const COMPLETION_WINDOWS: [(i64, f64); 3] = [(7, 0.5), (30, 0.3), (90, 0.2)];

// ============================================
// Results
// ============================================

/// Axis along which two habits correlate most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationKind {
    Completion,
    Timing,
    Performance,
    Context,
}

impl CorrelationKind {
    pub fn description(&self) -> &'static str {
        match self {
            CorrelationKind::Completion => "These habits are often completed together",
            CorrelationKind::Timing => "These habits are usually performed at similar times",
            CorrelationKind::Performance => {
                "Success in one habit often predicts success in the other"
            }
            CorrelationKind::Context => "These habits share similar environmental conditions",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubScore {
    pub score: f64,
    pub sample_size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CorrelationBreakdown {
    pub completion: SubScore,
    pub timing: SubScore,
    pub performance: SubScore,
    pub context: SubScore,
    /// Raw Pearson r behind the performance sub-score, in [-1, 1]
    pub performance_r: f64,
}

impl CorrelationBreakdown {
    /// Sub-scores in tie-break order.
    fn scores(&self) -> [(CorrelationKind, SubScore); 4] {
        [
            (CorrelationKind::Completion, self.completion),
            (CorrelationKind::Timing, self.timing),
            (CorrelationKind::Performance, self.performance),
            (CorrelationKind::Context, self.context),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub habit_a: HabitId,
    pub habit_b: HabitId,
    pub overall_score: f64,
    pub breakdown: CorrelationBreakdown,
    pub confidence: f64,
    pub kind: CorrelationKind,
}

impl CorrelationResult {
    pub fn rank_score(&self) -> f64 {
        0.7 * self.overall_score + 0.3 * self.confidence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn of(score: f64) -> Self {
        if score >= 0.8 {
            CorrelationStrength::Strong
        } else if score >= 0.6 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationInsight {
    pub habit_ids: (HabitId, HabitId),
    pub strength: CorrelationStrength,
    pub description: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Sequential,
    Coupled,
    Contextual,
    Related,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub primary: HabitId,
    pub dependent: HabitId,
    pub strength: f64,
    pub kind: DependencyKind,
}

/// Correlations of one habit against all others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationAnalysis {
    /// Significant correlations, strongest first
    pub ranked: Vec<CorrelationResult>,
    pub insights: Vec<CorrelationInsight>,
    pub dependencies: Vec<Dependency>,
}

/// Completion agreement of one habit pair over the overview window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAgreement {
    pub habit_a: HabitId,
    pub habit_b: HabitId,
    pub agreement: f64,
    pub shared_days: u32,
}

// ============================================
// Engine
// ============================================

/// Computes correlations between habits.
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Correlate two habits using entries up to `as_of`.
    pub fn correlate(&self, a: &Habit, b: &Habit, as_of: NaiveDate) -> CorrelationResult {
        let days_a = by_day(&a.history, as_of);
        let days_b = by_day(&b.history, as_of);

        let (performance, performance_r) = self.performance_correlation(&days_a, &days_b);
        let breakdown = CorrelationBreakdown {
            completion: completion_score(&days_a, &days_b, as_of),
            timing: self.timing_score(&days_a, &days_b),
            performance,
            context: context_score(&days_a, &days_b),
            performance_r,
        };

        let w = &self.config.weights;
        let overall_score = clamp01(
            w.completion * breakdown.completion.score
                + w.timing * breakdown.timing.score
                + w.performance * breakdown.performance.score
                + w.context * breakdown.context.score,
        );

        let min_sample = breakdown
            .scores()
            .iter()
            .map(|(_, s)| s.sample_size)
            .min()
            .unwrap_or(0);
        let confidence = ratio(
            min_sample as f64,
            self.config.confidence_sample_size as f64,
        )
        .min(1.0);

        let kind = dominant_kind(&breakdown);

        tracing::debug!(
            habit_a = %a.id,
            habit_b = %b.id,
            overall_score,
            confidence,
            kind = ?kind,
            "Correlated habits"
        );

        CorrelationResult {
            habit_a: a.id.clone(),
            habit_b: b.id.clone(),
            overall_score,
            breakdown,
            confidence,
            kind,
        }
    }

    pub fn is_significant(&self, result: &CorrelationResult) -> bool {
        result.overall_score >= self.config.min_score
            && result.confidence >= self.config.min_confidence
    }

    /// Correlate `target` with every other habit in `habits`.
    pub fn analyze_all(
        &self,
        target: &Habit,
        habits: &[Habit],
        as_of: NaiveDate,
    ) -> CorrelationAnalysis {
        let mut ranked: Vec<CorrelationResult> = habits
            .iter()
            .filter(|h| h.id != target.id)
            .map(|other| self.correlate(target, other, as_of))
            .filter(|r| self.is_significant(r))
            .collect();
        ranked.sort_by(|x, y| y.rank_score().total_cmp(&x.rank_score()));

        let insights = ranked.iter().map(|r| self.insight(r)).collect();
        let dependencies = ranked
            .iter()
            .filter(|r| r.overall_score > self.config.dependency_threshold)
            .map(|r| Dependency {
                primary: r.habit_a.clone(),
                dependent: r.habit_b.clone(),
                strength: r.overall_score,
                kind: self.dependency_kind(&r.breakdown),
            })
            .collect();

        CorrelationAnalysis {
            ranked,
            insights,
            dependencies,
        }
    }

    /// Completion agreement of every unordered habit pair over the trailing
    /// overview window, best agreement first.
    pub fn completion_overview(&self, habits: &[Habit], as_of: NaiveDate) -> Vec<PairAgreement> {
        let days: Vec<BTreeMap<NaiveDate, CompletionEntry>> =
            habits.iter().map(|h| by_day(&h.history, as_of)).collect();
        // Same convention as the completion windows: N days ending at as_of
        let start = dates::add_days(as_of, -(self.config.overview_window_days - 1));

        let mut pairs = Vec::new();
        for i in 0..habits.len() {
            for j in (i + 1)..habits.len() {
                let (agree, shared) = agreement(&days[i], &days[j], start);
                if shared < self.config.overview_min_shared_days.max(1) {
                    continue;
                }
                pairs.push(PairAgreement {
                    habit_a: habits[i].id.clone(),
                    habit_b: habits[j].id.clone(),
                    agreement: rate(agree as usize, shared as usize),
                    shared_days: shared,
                });
            }
        }
        pairs.sort_by(|x, y| y.agreement.total_cmp(&x.agreement));
        pairs
    }

    fn insight(&self, result: &CorrelationResult) -> CorrelationInsight {
        let threshold = self.config.recommendation_threshold;
        let b = &result.breakdown;
        let mut recommendations = Vec::new();
        if b.timing.score > threshold {
            recommendations.push("Consider scheduling these habits together".to_string());
        }
        if b.performance.score > threshold {
            recommendations
                .push("Try to maintain consistent energy levels for both habits".to_string());
        }
        if b.context.score > threshold {
            recommendations
                .push("The environmental conditions are ideal for both habits".to_string());
        }

        CorrelationInsight {
            habit_ids: (result.habit_a.clone(), result.habit_b.clone()),
            strength: CorrelationStrength::of(result.overall_score),
            description: result.kind.description().to_string(),
            recommendations,
        }
    }

    fn dependency_kind(&self, b: &CorrelationBreakdown) -> DependencyKind {
        let threshold = self.config.dependency_kind_threshold;
        if b.timing.score > threshold {
            DependencyKind::Sequential
        } else if b.completion.score > threshold {
            DependencyKind::Coupled
        } else if b.context.score > threshold {
            DependencyKind::Contextual
        } else {
            DependencyKind::Related
        }
    }

    fn timing_score(
        &self,
        a: &BTreeMap<NaiveDate, CompletionEntry>,
        b: &BTreeMap<NaiveDate, CompletionEntry>,
    ) -> SubScore {
        let times = |days: &BTreeMap<NaiveDate, CompletionEntry>| -> Vec<i64> {
            days.values()
                .filter(|e| e.completed)
                .filter_map(|e| e.timestamp)
                .map(|t| t.timestamp())
                .collect()
        };
        let times_a = times(a);
        let times_b = times(b);

        let same_secs = self.config.same_time_minutes * 60;
        let sequential_secs = self.config.sequential_minutes * 60;
        let mut same = 0usize;
        let mut sequential = 0usize;
        for ta in &times_a {
            for tb in &times_b {
                let diff = (ta - tb).abs();
                if diff <= same_secs {
                    same += 1;
                } else if diff <= sequential_secs {
                    sequential += 1;
                }
            }
        }
        let comparisons = times_a.len() * times_b.len();

        SubScore {
            score: ratio(same as f64 + 0.5 * sequential as f64, comparisons as f64),
            sample_size: times_a.len().min(times_b.len()) as u32,
        }
    }

    fn performance_correlation(
        &self,
        a: &BTreeMap<NaiveDate, CompletionEntry>,
        b: &BTreeMap<NaiveDate, CompletionEntry>,
    ) -> (SubScore, f64) {
        let pairs: Vec<(f64, f64)> = a
            .iter()
            .filter_map(|(date, ea)| {
                let eb = b.get(date)?;
                if !ea.completed || !eb.completed {
                    return None;
                }
                Some((
                    performance_score(ea.metrics.as_ref()?)?,
                    performance_score(eb.metrics.as_ref()?)?,
                ))
            })
            .collect();

        let r = pearson(&pairs);
        (
            SubScore {
                score: r.max(0.0),
                sample_size: pairs.len() as u32,
            },
            r,
        )
    }
}

/// Weighted blend of the metrics present on an entry, in [0, 1].
///
/// Quality 0.4, duration 0.3 (capped at one hour), inverted difficulty 0.2,
/// energy 0.1. `None` when no metric is present.
pub fn performance_score(metrics: &EntryMetrics) -> Option<f64> {
    let parts = [
        (metrics.quality.map(|q| (q - 1.0) / 4.0), 0.4),
        (metrics.duration.map(|d| d / 60.0), 0.3),
        (metrics.difficulty.map(|d| (5.0 - d) / 4.0), 0.2),
        (metrics.energy.map(|e| (e - 1.0) / 4.0), 0.1),
    ];

    let mut score = 0.0;
    let mut total_weight = 0.0;
    for (value, weight) in parts {
        if let Some(v) = value {
            score += clamp01(v) * weight;
            total_weight += weight;
        }
    }
    if total_weight == 0.0 {
        None
    } else {
        Some(score / total_weight)
    }
}

fn by_day(history: &[CompletionEntry], as_of: NaiveDate) -> BTreeMap<NaiveDate, CompletionEntry> {
    normalize_history(history)
        .into_iter()
        .filter(|e| e.date <= as_of)
        .map(|e| (e.date, e))
        .collect()
}

/// Agreeing and shared day counts on or after `start`.
fn agreement(
    a: &BTreeMap<NaiveDate, CompletionEntry>,
    b: &BTreeMap<NaiveDate, CompletionEntry>,
    start: NaiveDate,
) -> (u32, u32) {
    let mut agree = 0u32;
    let mut shared = 0u32;
    for (date, ea) in a.range(start..) {
        if let Some(eb) = b.get(date) {
            shared += 1;
            if ea.completed == eb.completed {
                agree += 1;
            }
        }
    }
    (agree, shared)
}

fn completion_score(
    a: &BTreeMap<NaiveDate, CompletionEntry>,
    b: &BTreeMap<NaiveDate, CompletionEntry>,
    as_of: NaiveDate,
) -> SubScore {
    let mut weighted = 0.0;
    let mut weight_used = 0.0;
    let mut sample_size = 0;

    for (window, weight) in COMPLETION_WINDOWS {
        // `window` calendar days ending at as_of
        let start = dates::add_days(as_of, -(window - 1));
        let (agree, shared) = agreement(a, b, start);
        if shared > 0 {
            weighted += weight * rate(agree as usize, shared as usize);
            weight_used += weight;
        }
        sample_size = shared;
    }

    SubScore {
        score: clamp01(ratio(weighted, weight_used)),
        sample_size,
    }
}

fn context_score(
    a: &BTreeMap<NaiveDate, CompletionEntry>,
    b: &BTreeMap<NaiveDate, CompletionEntry>,
) -> SubScore {
    let mut matched = 0usize;
    let mut days = 0usize;
    for (date, ea) in a {
        let Some(eb) = b.get(date) else { continue };
        if !ea.completed || !eb.completed {
            continue;
        }
        let (Some(ca), Some(cb)) = (ea.context(), eb.context()) else {
            continue;
        };
        days += 1;
        matched += ca
            .fields()
            .iter()
            .zip(cb.fields().iter())
            .filter(|(x, y)| x.is_some() && x == y)
            .count();
    }

    SubScore {
        score: rate(matched, days * 4),
        sample_size: days as u32,
    }
}

fn dominant_kind(breakdown: &CorrelationBreakdown) -> CorrelationKind {
    let mut best = (CorrelationKind::Completion, f64::NEG_INFINITY);
    for (kind, sub) in breakdown.scores() {
        if sub.score > best.1 {
            best = (kind, sub.score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryContext, Frequency};
    use chrono::{TimeZone, Utc};

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    fn habit(id: &str, history: Vec<CompletionEntry>) -> Habit {
        Habit {
            id: id.to_string(),
            name: format!("Habit {id}"),
            description: None,
            category: "health".to_string(),
            frequency: Frequency::Daily,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            history,
            streak: 0,
        }
    }

    /// `len` days ending at `end`, completed where `pattern(i)` holds.
    fn history(end: &str, len: i64, pattern: impl Fn(i64) -> bool) -> Vec<CompletionEntry> {
        let end = day(end);
        (0..len)
            .map(|i| CompletionEntry::new(dates::add_days(end, -(len - 1 - i)), pattern(i)))
            .collect()
    }

    #[test]
    fn test_identical_completion_scores_one() {
        let a = habit("a", history("2024-03-10", 10, |_| true));
        let b = habit("b", history("2024-03-10", 10, |_| true));
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        assert_eq!(result.breakdown.completion.score, 1.0);
        assert_eq!(result.breakdown.completion.sample_size, 10);
        assert_eq!(result.kind, CorrelationKind::Completion);
        // completion only: 0.4 * 1.0
        assert!((result.overall_score - 0.4).abs() < 1e-12);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_correlation_is_symmetric() {
        let a = habit("a", history("2024-03-10", 40, |i| i % 2 == 0));
        let b = habit("b", history("2024-03-10", 25, |i| i % 3 != 0));
        let engine = CorrelationEngine::default();
        let ab = engine.correlate(&a, &b, day("2024-03-10"));
        let ba = engine.correlate(&b, &a, day("2024-03-10"));
        assert!((ab.overall_score - ba.overall_score).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&ab.overall_score));
    }

    #[test]
    fn test_no_shared_days() {
        let a = habit("a", history("2024-03-10", 5, |_| true));
        let b = habit("b", history("2024-02-10", 5, |_| true));
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_completion_windows_renormalise() {
        // Shared days fall only inside the 90-day window
        let a = habit("a", history("2024-02-05", 10, |_| true));
        let b = habit("b", history("2024-02-05", 10, |i| i < 5));
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        assert!((result.breakdown.completion.score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_timing_same_and_sequential() {
        let at = |d: u32, h: u32, m: u32| Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap();
        let a = habit(
            "a",
            vec![CompletionEntry::new(day("2024-03-01"), true).with_timestamp(at(1, 23, 0))],
        );
        let b = habit(
            "b",
            vec![
                CompletionEntry::new(day("2024-03-01"), true).with_timestamp(at(1, 22, 40)),
                CompletionEntry::new(day("2024-03-02"), true).with_timestamp(at(2, 0, 30)),
            ],
        );
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        // one same-time + one sequential over two comparisons
        assert!((result.breakdown.timing.score - 0.75).abs() < 1e-12);
        assert_eq!(result.breakdown.timing.sample_size, 1);
    }

    #[test]
    fn test_performance_uses_positive_r_only() {
        let with_quality = |d: i64, q: f64| {
            CompletionEntry::new(dates::add_days(day("2024-03-01"), d), true).with_metrics(
                EntryMetrics {
                    quality: Some(q),
                    ..Default::default()
                },
            )
        };
        let a = habit("a", (0..4).map(|i| with_quality(i, 1.0 + i as f64)).collect());
        let b = habit("b", (0..4).map(|i| with_quality(i, 5.0 - i as f64)).collect());
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        assert_eq!(result.breakdown.performance.score, 0.0);
        assert!((result.breakdown.performance_r + 1.0).abs() < 1e-9);
        assert_eq!(result.breakdown.performance.sample_size, 4);
    }

    #[test]
    fn test_context_counts_present_matching_fields() {
        let ctx = |location: &str, weather: Option<&str>| EntryMetrics {
            context: Some(EntryContext {
                location: Some(location.to_string()),
                weather: weather.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };
        let a = habit(
            "a",
            vec![CompletionEntry::new(day("2024-03-01"), true).with_metrics(ctx("home", None))],
        );
        let b = habit(
            "b",
            vec![CompletionEntry::new(day("2024-03-01"), true).with_metrics(ctx("home", None))],
        );
        let result = CorrelationEngine::default().correlate(&a, &b, day("2024-03-10"));
        assert!((result.breakdown.context.score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_performance_score_blend() {
        let metrics = EntryMetrics {
            quality: Some(5.0),
            difficulty: Some(5.0),
            ..Default::default()
        };
        // (1.0 * 0.4 + 0.0 * 0.2) / 0.6
        let score = performance_score(&metrics).unwrap();
        assert!((score - 0.4 / 0.6).abs() < 1e-12);
        assert!(performance_score(&EntryMetrics::default()).is_none());
    }

    #[test]
    fn test_analyze_all_ranks_significant_pairs() {
        let at = |i: i64| {
            dates::start_of_day(dates::add_days(day("2024-03-10"), -i)) + chrono::Duration::hours(7)
        };
        let timed = |len: i64| -> Vec<CompletionEntry> {
            (0..len)
                .map(|i| {
                    CompletionEntry::new(dates::add_days(day("2024-03-10"), -i), true)
                        .with_timestamp(at(i))
                        .with_metrics(EntryMetrics {
                            quality: Some(1.0 + (i % 5) as f64),
                            context: Some(EntryContext {
                                location: Some("home".to_string()),
                                weather: Some("sunny".to_string()),
                                time_of_day: Some("morning".to_string()),
                                day_type: Some("weekday".to_string()),
                            }),
                            ..Default::default()
                        })
                })
                .collect()
        };
        let target = habit("a", timed(40));
        let twin = habit("b", timed(40));
        let unrelated = habit("c", history("2024-03-10", 5, |_| false));

        let habits = [target.clone(), twin, unrelated];

        let analysis = CorrelationEngine::default().analyze_all(&target, &habits, day("2024-03-10"));
        assert_eq!(analysis.ranked.len(), 1);
        let top = &analysis.ranked[0];
        assert_eq!(top.habit_b, "b");
        assert_eq!(top.confidence, 1.0);
        // completion, performance and context are perfect; timing only
        // matches on the same day: 0.4 + 0.3 * 40 / 1600 + 0.2 + 0.1
        assert!((top.overall_score - 0.7075).abs() < 1e-9);
        assert_eq!(analysis.insights[0].strength, CorrelationStrength::Moderate);
        assert_eq!(analysis.insights[0].recommendations.len(), 2);
        assert!(analysis.dependencies.is_empty());

        let relaxed = CorrelationEngine::new(CorrelationConfig {
            dependency_threshold: 0.7,
            ..Default::default()
        });
        let analysis = relaxed.analyze_all(&target, &habits, day("2024-03-10"));
        assert_eq!(analysis.dependencies.len(), 1);
        assert_eq!(analysis.dependencies[0].primary, "a");
        assert_eq!(analysis.dependencies[0].dependent, "b");
        assert_eq!(analysis.dependencies[0].kind, DependencyKind::Coupled);
    }

    #[test]
    fn test_completion_overview_requires_shared_days() {
        let a = habit("a", history("2024-03-10", 10, |_| true));
        let b = habit("b", history("2024-03-10", 10, |i| i % 2 == 0));
        let c = habit("c", history("2024-03-10", 3, |_| true));
        let overview = CorrelationEngine::default().completion_overview(&[a, b, c], day("2024-03-10"));
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].shared_days, 10);
        assert!((overview[0].agreement - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_completion_overview_covers_thirty_days() {
        // Identical except on the day just outside the window
        let a = habit("a", history("2024-03-31", 31, |_| true));
        let b = habit("b", history("2024-03-31", 31, |i| i != 0));
        let overview = CorrelationEngine::default().completion_overview(&[a, b], day("2024-03-31"));
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].shared_days, 30);
        assert_eq!(overview[0].agreement, 1.0);
    }
}
