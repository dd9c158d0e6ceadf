//! Completion trends over daily, weekly and monthly periods, plus per-metric
//! performance trends.

use super::stats::{linear_regression, mean, ratio};
use crate::dates;
use crate::types::{normalize_history, CompletionEntry, EntryMetrics};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Period size used when bucketing a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    /// ISO-8601 weeks
    Weekly,
    Monthly,
}

impl Granularity {
    /// Sortable period key of `date`.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Daily => dates::day_key(date),
            Granularity::Weekly => dates::iso_week_key(date),
            Granularity::Monthly => dates::month_key(date),
        }
    }
}

/// Entry counts for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    pub period: String,
    pub completed: u32,
    pub total: u32,
}

impl PeriodBucket {
    /// Completion rate as a percentage, 0 for an empty period.
    pub fn rate(&self) -> f64 {
        ratio(self.completed as f64, self.total as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            TrendDirection::Improving
        } else if slope < 0.0 {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    /// Completion rate in percent
    pub rate: f64,
}

/// Least-squares trend line over a series of period rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    /// Percentage points per period
    pub slope: f64,
    pub intercept: f64,
    pub direction: TrendDirection,
    pub series: Vec<TrendPoint>,
}

/// Group a history into periods, sorted by period key.
pub fn bucket_history(history: &[CompletionEntry], granularity: Granularity) -> Vec<PeriodBucket> {
    let mut periods: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for entry in normalize_history(history) {
        let counts = periods.entry(granularity.key(entry.date)).or_default();
        counts.1 += 1;
        if entry.completed {
            counts.0 += 1;
        }
    }
    periods
        .into_iter()
        .map(|(period, (completed, total))| PeriodBucket {
            period,
            completed,
            total,
        })
        .collect()
}

/// Fit a trend line to period rates against period index.
///
/// Returns `None` for fewer than two periods.
pub fn analyze_trend(series: &[PeriodBucket]) -> Option<TrendResult> {
    if series.len() < 2 {
        return None;
    }
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, bucket)| (i as f64, bucket.rate()))
        .collect();
    let fit = linear_regression(&points)?;

    Some(TrendResult {
        slope: fit.slope,
        intercept: fit.intercept,
        direction: TrendDirection::from_slope(fit.slope),
        series: series
            .iter()
            .map(|b| TrendPoint {
                period: b.period.clone(),
                rate: b.rate(),
            })
            .collect(),
    })
}

/// Trends at every granularity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub daily: Option<TrendResult>,
    pub weekly: Option<TrendResult>,
    pub monthly: Option<TrendResult>,
}

pub fn analyze_trends(history: &[CompletionEntry]) -> TrendReport {
    let report = TrendReport {
        daily: analyze_trend(&bucket_history(history, Granularity::Daily)),
        weekly: analyze_trend(&bucket_history(history, Granularity::Weekly)),
        monthly: analyze_trend(&bucket_history(history, Granularity::Monthly)),
    };
    tracing::debug!(
        daily = ?report.daily.as_ref().map(|t| t.direction),
        weekly = ?report.weekly.as_ref().map(|t| t.direction),
        monthly = ?report.monthly.as_ref().map(|t| t.direction),
        "Analyzed completion trends"
    );
    report
}

// ============================================
// Metric trends
// ============================================

/// Trend of one logged metric over completed entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricTrend {
    /// Most recent value
    pub current: f64,
    pub average: f64,
    /// Change per calendar day
    pub slope_per_day: f64,
    /// min(samples / 10, 1)
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrends {
    pub duration: Option<MetricTrend>,
    pub quality: Option<MetricTrend>,
    pub difficulty: Option<MetricTrend>,
    pub energy: Option<MetricTrend>,
    /// Recent quality compared with earlier quality
    pub quality_direction: TrendDirection,
}

impl Default for MetricTrends {
    fn default() -> Self {
        Self {
            duration: None,
            quality: None,
            difficulty: None,
            energy: None,
            quality_direction: TrendDirection::Stable,
        }
    }
}

const RECENT_QUALITY_SAMPLES: usize = 3;
const QUALITY_CHANGE_THRESHOLD: f64 = 0.5;

pub fn metric_trends(history: &[CompletionEntry]) -> MetricTrends {
    let entries = normalize_history(history);
    let quality = samples(&entries, |m| m.quality);

    MetricTrends {
        duration: metric_trend(&samples(&entries, |m| m.duration)),
        quality: metric_trend(&quality),
        difficulty: metric_trend(&samples(&entries, |m| m.difficulty)),
        energy: metric_trend(&samples(&entries, |m| m.energy)),
        quality_direction: quality_direction(&quality),
    }
}

fn samples(
    entries: &[CompletionEntry],
    pick: impl Fn(&EntryMetrics) -> Option<f64>,
) -> Vec<(NaiveDate, f64)> {
    entries
        .iter()
        .filter(|e| e.completed)
        .filter_map(|e| e.metrics.as_ref().and_then(&pick).map(|v| (e.date, v)))
        .collect()
}

fn metric_trend(samples: &[(NaiveDate, f64)]) -> Option<MetricTrend> {
    let (first, _) = *samples.first()?;
    let (_, current) = *samples.last()?;
    if samples.len() < 2 {
        return None;
    }

    let values: Vec<f64> = samples.iter().map(|s| s.1).collect();
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|(date, v)| (dates::days_between(first, *date) as f64, *v))
        .collect();

    Some(MetricTrend {
        current,
        average: mean(&values),
        slope_per_day: linear_regression(&points).map_or(0.0, |fit| fit.slope),
        confidence: (samples.len() as f64 / 10.0).min(1.0),
    })
}

fn quality_direction(samples: &[(NaiveDate, f64)]) -> TrendDirection {
    if samples.len() <= RECENT_QUALITY_SAMPLES {
        return TrendDirection::Stable;
    }
    let split = samples.len() - RECENT_QUALITY_SAMPLES;
    let earlier: Vec<f64> = samples[..split].iter().map(|s| s.1).collect();
    let recent: Vec<f64> = samples[split..].iter().map(|s| s.1).collect();
    let delta = mean(&recent) - mean(&earlier);

    if delta.abs() < QUALITY_CHANGE_THRESHOLD {
        TrendDirection::Stable
    } else {
        TrendDirection::from_slope(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(period: &str, completed: u32, total: u32) -> PeriodBucket {
        PeriodBucket {
            period: period.to_string(),
            completed,
            total,
        }
    }

    fn day(s: &str) -> NaiveDate {
        dates::parse_day(s).unwrap()
    }

    #[test]
    fn test_weekly_rates_improving() {
        let series = vec![
            bucket("2024-W01", 1, 5),
            bucket("2024-W02", 2, 5),
            bucket("2024-W03", 3, 5),
            bucket("2024-W04", 4, 5),
        ];
        let trend = analyze_trend(&series).unwrap();
        assert!((trend.slope - 20.0).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Improving);
        assert_eq!(trend.series[0].rate, 20.0);
    }

    #[test]
    fn test_constant_series_is_stable() {
        let series = vec![bucket("a", 1, 3), bucket("b", 1, 3), bucket("c", 1, 3)];
        let trend = analyze_trend(&series).unwrap();
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_declining_and_too_short() {
        let series = vec![bucket("a", 4, 4), bucket("b", 0, 4)];
        assert_eq!(analyze_trend(&series).unwrap().direction, TrendDirection::Declining);
        assert!(analyze_trend(&series[..1]).is_none());
        assert!(analyze_trend(&[]).is_none());
    }

    #[test]
    fn test_empty_period_rate_is_zero() {
        assert_eq!(bucket("a", 0, 0).rate(), 0.0);
    }

    #[test]
    fn test_bucket_history_iso_weeks() {
        let history = vec![
            CompletionEntry::new(day("2024-12-29"), true), // 2024-W52
            CompletionEntry::new(day("2024-12-30"), true), // 2025-W01
            CompletionEntry::new(day("2025-01-02"), false), // 2025-W01
        ];
        let weekly = bucket_history(&history, Granularity::Weekly);
        assert_eq!(weekly, vec![bucket("2024-W52", 1, 1), bucket("2025-W01", 1, 2)]);

        let monthly = bucket_history(&history, Granularity::Monthly);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-12");
    }

    #[test]
    fn test_analyze_trends_report() {
        let history: Vec<_> = (0..14)
            .map(|i| CompletionEntry::new(dates::add_days(day("2024-03-04"), i), i >= 7))
            .collect();
        let report = analyze_trends(&history);
        assert_eq!(report.weekly.unwrap().direction, TrendDirection::Improving);
        assert!(report.monthly.is_none());
        assert!(report.daily.is_some());
    }

    #[test]
    fn test_metric_trends() {
        let history: Vec<_> = (0..6)
            .map(|i| {
                CompletionEntry::new(dates::add_days(day("2024-03-01"), i), true).with_metrics(
                    EntryMetrics {
                        quality: Some(if i < 3 { 2.0 } else { 4.0 }),
                        duration: Some(10.0 + i as f64 * 5.0),
                        ..Default::default()
                    },
                )
            })
            .collect();
        let trends = metric_trends(&history);

        let duration = trends.duration.unwrap();
        assert_eq!(duration.current, 35.0);
        assert!((duration.slope_per_day - 5.0).abs() < 1e-9);
        assert!((duration.confidence - 0.6).abs() < 1e-12);
        assert_eq!(trends.quality_direction, TrendDirection::Improving);
        assert!(trends.difficulty.is_none());
        assert!(trends.energy.is_none());
    }
}
