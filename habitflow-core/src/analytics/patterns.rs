//! Pattern recognition over a single habit history.
//!
//! Patterns fall into three families, each with its own confidence floor:
//! temporal (peak hours, optimal weekdays) 0.7, behavioral (energy,
//! performance level) 0.65 and contextual (location, weather) 0.6.

use super::stats::{mean, rate};
use crate::dates;
use crate::types::{normalize_history, CompletionEntry, EntryMetrics};
use serde::Serialize;
use std::collections::BTreeMap;

const TEMPORAL_MIN_CONFIDENCE: f64 = 0.7;
const BEHAVIORAL_MIN_CONFIDENCE: f64 = 0.65;
const CONTEXTUAL_MIN_CONFIDENCE: f64 = 0.6;

/// Timestamped completions needed before peak hours are reported.
const MIN_TIMED_COMPLETIONS: usize = 5;
/// Entries needed per value before a context value is considered.
const MIN_CONTEXT_SAMPLES: usize = 3;
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    BelowAverage,
    Average,
    Good,
    Excellent,
    Exceptional,
}

impl PerformanceLevel {
    /// Classify an average score on the 0-5 scale.
    pub fn of(score: f64) -> Self {
        if score >= 4.5 {
            PerformanceLevel::Exceptional
        } else if score >= 4.0 {
            PerformanceLevel::Excellent
        } else if score >= 3.5 {
            PerformanceLevel::Good
        } else if score >= 3.0 {
            PerformanceLevel::Average
        } else {
            PerformanceLevel::BelowAverage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceLevel::BelowAverage => "below average",
            PerformanceLevel::Average => "average",
            PerformanceLevel::Good => "good",
            PerformanceLevel::Excellent => "excellent",
            PerformanceLevel::Exceptional => "exceptional",
        }
    }
}

/// Performance of a single entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceAnalysis {
    /// Mean of the factors on a 0-5 scale
    pub score: f64,
    pub level: PerformanceLevel,
    /// At least two factors and a score of 3.5 or more
    pub significant: bool,
    pub factors: BTreeMap<String, f64>,
}

/// Score one entry's metrics.
///
/// Quality and energy count as-is, difficulty is inverted (`5 - d`) and
/// duration becomes hours capped at 5.
pub fn analyze_performance(metrics: &EntryMetrics) -> PerformanceAnalysis {
    let mut factors = BTreeMap::new();
    let mut contributions = Vec::new();

    if let Some(q) = metrics.quality {
        factors.insert("quality".to_string(), q);
        contributions.push(q);
    }
    if let Some(e) = metrics.energy {
        factors.insert("energy".to_string(), e);
        contributions.push(e);
    }
    if let Some(d) = metrics.difficulty {
        factors.insert("difficulty".to_string(), d);
        contributions.push(5.0 - d);
    }
    if let Some(d) = metrics.duration {
        let hours = (d / 60.0).min(5.0);
        factors.insert("duration".to_string(), hours);
        contributions.push(hours);
    }

    let score = mean(&contributions);
    PerformanceAnalysis {
        score,
        level: PerformanceLevel::of(score),
        significant: contributions.len() >= 2 && score >= 3.5,
        factors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    Temporal,
    Behavioral,
    Contextual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PatternKind {
    /// Hours (0-23) holding most timestamped completions
    PeakHours(Vec<u8>),
    /// Weekdays (0 = Sunday) with the best completion rate
    OptimalDays(Vec<u8>),
    /// Energy band ("low", "medium", "high") with the best quality
    EnergyLevel(String),
    /// Most frequent level among significant performances
    Performance(PerformanceLevel),
    Location(String),
    Weather(String),
}

impl PatternKind {
    pub fn category(&self) -> PatternCategory {
        match self {
            PatternKind::PeakHours(_) | PatternKind::OptimalDays(_) => PatternCategory::Temporal,
            PatternKind::EnergyLevel(_) | PatternKind::Performance(_) => {
                PatternCategory::Behavioral
            }
            PatternKind::Location(_) | PatternKind::Weather(_) => PatternCategory::Contextual,
        }
    }

    pub fn description(&self) -> String {
        match self {
            PatternKind::PeakHours(hours) => format!(
                "Most successful completions occur around {}",
                hours
                    .iter()
                    .map(|h| format!("{h}:00"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            PatternKind::OptimalDays(days) => format!(
                "Highest success rate on {}",
                days.iter()
                    .map(|d| dates::weekday_name(*d))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            PatternKind::EnergyLevel(band) => format!("Best results with {band} energy levels"),
            PatternKind::Performance(level) => {
                format!("Consistently {} performance", level.as_str())
            }
            PatternKind::Location(location) => format!("Most effective at {location}"),
            PatternKind::Weather(weather) => format!("Optimal conditions: {weather}"),
        }
    }

    fn recommendation(&self) -> String {
        match self {
            PatternKind::PeakHours(hours) => match hours.first() {
                Some(h) => format!("Schedule this habit around {h}:00"),
                None => "Keep a regular time for this habit".to_string(),
            },
            PatternKind::OptimalDays(_) => {
                "Plan harder sessions for your strongest days".to_string()
            }
            PatternKind::EnergyLevel(band) => {
                format!("Do this habit when your energy is {band}")
            }
            PatternKind::Performance(_) => {
                "Keep the conditions that produce your best sessions".to_string()
            }
            PatternKind::Location(location) => format!("Prefer doing this habit at {location}"),
            PatternKind::Weather(weather) => {
                format!("Have a backup plan for days that are not {weather}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub category: PatternCategory,
    pub description: String,
    pub confidence: f64,
    pub sample_size: u32,
}

impl Pattern {
    fn new(kind: PatternKind, confidence: f64, sample_size: usize) -> Self {
        Self {
            category: kind.category(),
            description: kind.description(),
            kind,
            confidence,
            sample_size: sample_size as u32,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternReport {
    /// Patterns above their family's confidence floor, strongest first
    pub patterns: Vec<Pattern>,
    pub recommendations: Vec<String>,
}

/// Detect significant patterns in a history.
pub fn detect_patterns(history: &[CompletionEntry]) -> PatternReport {
    let entries = normalize_history(history);

    let mut patterns: Vec<Pattern> = [
        peak_hours(&entries),
        optimal_days(&entries),
        energy_level(&entries),
        performance_level(&entries),
        context_value(&entries, |e| e.context()?.location.clone(), PatternKind::Location),
        context_value(&entries, |e| e.context()?.weather.clone(), PatternKind::Weather),
    ]
    .into_iter()
    .flatten()
    .filter(|p| p.confidence >= min_confidence(p.category))
    .collect();
    patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let recommendations = patterns
        .iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|p| p.kind.recommendation())
        .collect();

    tracing::debug!(
        entries = entries.len(),
        patterns = patterns.len(),
        "Detected patterns"
    );
    PatternReport {
        patterns,
        recommendations,
    }
}

fn min_confidence(category: PatternCategory) -> f64 {
    match category {
        PatternCategory::Temporal => TEMPORAL_MIN_CONFIDENCE,
        PatternCategory::Behavioral => BEHAVIORAL_MIN_CONFIDENCE,
        PatternCategory::Contextual => CONTEXTUAL_MIN_CONFIDENCE,
    }
}

/// Up to three hours with the most timestamped completions; confidence is
/// the share of timestamped completions they hold.
fn peak_hours(entries: &[CompletionEntry]) -> Option<Pattern> {
    let mut counts = [0usize; 24];
    for entry in entries.iter().filter(|e| e.completed && e.timestamp.is_some()) {
        counts[entry.hour() as usize % 24] += 1;
    }
    let total: usize = counts.iter().sum();
    if total < MIN_TIMED_COMPLETIONS {
        return None;
    }

    let mut ranked: Vec<(u8, usize)> = counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(h, c)| (h as u8, *c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(3);

    let covered: usize = ranked.iter().map(|(_, c)| c).sum();
    let mut hours: Vec<u8> = ranked.into_iter().map(|(h, _)| h).collect();
    hours.sort_unstable();
    Some(Pattern::new(
        PatternKind::PeakHours(hours),
        rate(covered, total),
        total,
    ))
}

/// Weekdays with at least two entries whose rate beats the overall rate by
/// ten points; confidence is their combined completion rate.
fn optimal_days(entries: &[CompletionEntry]) -> Option<Pattern> {
    let overall = rate(entries.iter().filter(|e| e.completed).count(), entries.len());
    let mut by_day = [(0usize, 0usize); 7];
    for entry in entries {
        let slot = &mut by_day[entry.weekday() as usize % 7];
        slot.1 += 1;
        if entry.completed {
            slot.0 += 1;
        }
    }

    let days: Vec<u8> = (0..7u8)
        .filter(|d| {
            let (done, total) = by_day[*d as usize];
            total >= 2 && rate(done, total) >= overall + 0.1
        })
        .collect();
    if days.is_empty() {
        return None;
    }
    let (done, total) = days.iter().fold((0, 0), |(d, t), day| {
        let (done, total) = by_day[*day as usize];
        (d + done, t + total)
    });
    Some(Pattern::new(PatternKind::OptimalDays(days), rate(done, total), total))
}

/// Energy band with the highest mean quality among completed entries.
fn energy_level(entries: &[CompletionEntry]) -> Option<Pattern> {
    let mut bands: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
    let mut samples = 0;
    for metrics in entries.iter().filter(|e| e.completed).filter_map(|e| e.metrics.as_ref()) {
        let (Some(energy), Some(quality)) = (metrics.energy, metrics.quality) else {
            continue;
        };
        let band = if energy >= 4.0 {
            "high"
        } else if energy >= 3.0 {
            "medium"
        } else {
            "low"
        };
        bands.entry(band).or_default().push(quality);
        samples += 1;
    }
    if samples < MIN_TIMED_COMPLETIONS {
        return None;
    }

    let (band, qualities) = bands
        .iter()
        .max_by(|a, b| mean(a.1).total_cmp(&mean(b.1)))?;
    // Normalised best-band quality, discounted by how much of the data it covers
    let confidence = (mean(qualities) / 5.0) * (0.5 + 0.5 * rate(qualities.len(), samples));
    Some(Pattern::new(
        PatternKind::EnergyLevel(band.to_string()),
        confidence,
        samples,
    ))
}

/// Most common level among significant entry performances; confidence is the
/// share of scored entries that were significant.
fn performance_level(entries: &[CompletionEntry]) -> Option<Pattern> {
    let analyses: Vec<PerformanceAnalysis> = entries
        .iter()
        .filter(|e| e.completed)
        .filter_map(|e| e.metrics.as_ref())
        .map(analyze_performance)
        .filter(|a| !a.factors.is_empty())
        .collect();
    if analyses.is_empty() {
        return None;
    }

    let mut levels: BTreeMap<PerformanceLevel, usize> = BTreeMap::new();
    for analysis in analyses.iter().filter(|a| a.significant) {
        *levels.entry(analysis.level).or_default() += 1;
    }
    let significant: usize = levels.values().sum();
    let (level, _) = levels.into_iter().max_by_key(|(_, n)| *n)?;
    Some(Pattern::new(
        PatternKind::Performance(level),
        rate(significant, analyses.len()),
        analyses.len(),
    ))
}

/// Context value with the best completion rate.
fn context_value(
    entries: &[CompletionEntry],
    pick: impl Fn(&CompletionEntry) -> Option<String>,
    kind: impl Fn(String) -> PatternKind,
) -> Option<Pattern> {
    let mut values: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for entry in entries {
        if let Some(value) = pick(entry) {
            let slot = values.entry(value).or_default();
            slot.1 += 1;
            if entry.completed {
                slot.0 += 1;
            }
        }
    }
    let samples: usize = values.values().map(|(_, total)| total).sum();
    let (value, (done, total)) = values
        .into_iter()
        .filter(|(_, (_, total))| *total >= MIN_CONTEXT_SAMPLES)
        .max_by(|a, b| rate(a.1 .0, a.1 .1).total_cmp(&rate(b.1 .0, b.1 .1)))?;
    Some(Pattern::new(kind(value), rate(done, total), samples))
}
