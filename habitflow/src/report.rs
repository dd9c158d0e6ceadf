//! Plain-text rendering of habits and analytics.

use chrono::NaiveDate;
use habitflow_core::analytics::correlation::CorrelationResult;
use habitflow_core::analytics::dashboard::{format_hour_range, HeatmapCell, MAX_INTENSITY};
use habitflow_core::analytics::patterns::analyze_performance;
use habitflow_core::analytics::prediction::HorizonPrediction;
use habitflow_core::analytics::trend::{MetricTrend, TrendResult};
use habitflow_core::analytics::{AnalyticsSummary, DetailedAnalytics, SectionStatus};
use habitflow_core::categories::{self, Category};
use habitflow_core::{dates, Habit};

const HEATMAP_SHADES: [char; 5] = ['.', '░', '▒', '▓', '█'];
const HEATMAP_TEXT_DAYS: usize = 28;

pub fn print_habit_list(habits: &[Habit], today: NaiveDate) {
    if habits.is_empty() {
        println!("No habits yet.");
        println!("Run 'habitflow add <name> --category <id>' to create one.");
        return;
    }

    for habit in habits {
        let mark = if habit.completed_on(today) { "x" } else { " " };
        let short_id = &habit.id[..8.min(habit.id.len())];
        println!(
            "[{}] {:<30} {:<12} streak {:>3}  ({})",
            mark,
            habit.name,
            habit.category,
            habit.streak,
            short_id
        );
    }
}

pub fn print_summary(summary: &AnalyticsSummary, habits: &[Habit]) {
    println!("Habits:             {}", summary.total_habits);
    println!(
        "Completed today:    {}/{}",
        summary.completed_today, summary.total_habits
    );
    println!("Active streaks:     {}", summary.active_streaks);
    println!(
        "Current streak:     {} day(s) (longest {})",
        summary.current_streak, summary.longest_streak
    );
    println!("Days with progress: {}", summary.total_completed_days);
    println!("Achievements:       {}", summary.achievements);

    if !summary.category_completions.is_empty() {
        println!("\nBy category:");
        for (id, completion) in &summary.category_completions {
            let name = categories::category(id).map_or(id.as_str(), |c| c.name);
            println!("  {:<14} {}/{}", name, completion.completed, completion.total);
        }
    }

    if !summary.completion_overview.is_empty() {
        println!("\nCompleted together (last 30 days):");
        for pair in &summary.completion_overview {
            println!(
                "  {} + {}: {:.0}% over {} day(s)",
                habit_name(habits, &pair.habit_a),
                habit_name(habits, &pair.habit_b),
                pair.agreement * 100.0,
                pair.shared_days
            );
        }
    }
}

pub fn print_detail(habit: &Habit, detailed: &DetailedAnalytics, habits: &[Habit]) {
    println!("{} ({})", habit.name, habit.category);
    println!("As of {}\n", detailed.as_of);

    println!(
        "Streak: {} day(s), longest {}",
        detailed.streak.current, detailed.streak.longest
    );
    let metrics = &detailed.metrics;
    println!(
        "Completion: {}/{} ({:.0}%)",
        metrics.completed,
        metrics.total,
        metrics.overall_rate * 100.0
    );
    if let Some(hour) = metrics.peak_hour() {
        println!("Peak hour: {}", format_hour_range(hour));
    }
    if let Some(day) = metrics.best_weekday() {
        println!("Best day: {}", dates::weekday_name(day));
    }
    if let Some(latest) = habit
        .history
        .iter()
        .max_by_key(|e| e.date)
        .and_then(|e| e.metrics.as_ref())
    {
        let performance = analyze_performance(latest);
        if !performance.factors.is_empty() {
            println!(
                "Latest entry: {} ({:.1})",
                performance.level.as_str(),
                performance.score
            );
        }
    }
    println!("Last {} days: {}", HEATMAP_TEXT_DAYS, heatmap_strip(&detailed.heatmap));

    println!("\nTrends:");
    print_trend("daily", detailed.trends.daily.as_ref());
    print_trend("weekly", detailed.trends.weekly.as_ref());
    print_trend("monthly", detailed.trends.monthly.as_ref());
    let mt = &detailed.metric_trends;
    for (name, trend) in [
        ("duration", mt.duration),
        ("quality", mt.quality),
        ("difficulty", mt.difficulty),
        ("energy", mt.energy),
    ] {
        if let Some(trend) = trend {
            print_metric_trend(name, &trend);
        }
    }

    let success = &detailed.predictions.success;
    println!("\nPredictions:");
    print_horizon("next day", &success.next_day);
    print_horizon("next week", &success.next_week);
    print_horizon("long term", &success.long_term);
    let timing = &detailed.predictions.timing;
    if !timing.optimal_times.is_empty() {
        let hours: Vec<String> = timing
            .optimal_times
            .iter()
            .map(|t| format_hour_range(t.hour))
            .collect();
        println!("  best times: {}", hours.join(", "));
    }
    if !timing.recommended_weekdays.is_empty() {
        let days: Vec<&str> = timing
            .recommended_weekdays
            .iter()
            .map(|d| dates::weekday_name(*d))
            .collect();
        println!("  best days: {}", days.join(", "));
    }
    let difficulty = &detailed.predictions.difficulty;
    if !difficulty.insufficient_data {
        println!(
            "  difficulty: {:.1} (trend {:+.3}/day, adaptation {:.0}%)",
            difficulty.baseline,
            difficulty.trend_per_day,
            difficulty.adaptation_rate * 100.0
        );
    }

    if !detailed.correlations.ranked.is_empty() {
        println!("\nCorrelated habits:");
        for result in &detailed.correlations.ranked {
            print_correlation(result, habit, habits);
        }
        for dependency in &detailed.correlations.dependencies {
            println!(
                "  {} -> {} ({:?}, {:.2})",
                habit_name(habits, &dependency.primary),
                habit_name(habits, &dependency.dependent),
                dependency.kind,
                dependency.strength
            );
        }
    }

    if !detailed.patterns.patterns.is_empty() {
        println!("\nPatterns:");
        for pattern in &detailed.patterns.patterns {
            println!(
                "  {} ({:.0}% confidence)",
                pattern.description,
                pattern.confidence * 100.0
            );
        }
    }
    let recommendations: Vec<&String> = detailed
        .patterns
        .recommendations
        .iter()
        .chain(
            detailed
                .correlations
                .insights
                .iter()
                .flat_map(|i| i.recommendations.iter()),
        )
        .collect();
    if !recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in recommendations {
            println!("  - {}", recommendation);
        }
    }

    let failed: Vec<_> = detailed
        .runs
        .iter()
        .filter(|r| r.status != SectionStatus::Success)
        .collect();
    if !failed.is_empty() {
        println!();
        for run in failed {
            println!(
                "  [!] {} {}: {}",
                run.section,
                run.status.as_str(),
                run.error_message.as_deref().unwrap_or("")
            );
        }
    }
}

pub fn print_categories(categories: &[Category]) {
    for category in categories {
        println!("{} ({})", category.name, category.id);
        for suggestion in category.suggestions {
            println!("  - {}", suggestion);
        }
    }
}

fn habit_name<'a>(habits: &'a [Habit], id: &'a str) -> &'a str {
    habits
        .iter()
        .find(|h| h.id == id)
        .map_or(id, |h| h.name.as_str())
}

fn heatmap_strip(cells: &[HeatmapCell]) -> String {
    let start = cells.len().saturating_sub(HEATMAP_TEXT_DAYS);
    cells[start..]
        .iter()
        .map(|cell| {
            let level = (cell.intensity / MAX_INTENSITY * 4.0).ceil() as usize;
            HEATMAP_SHADES[level.min(HEATMAP_SHADES.len() - 1)]
        })
        .collect()
}

fn print_trend(label: &str, trend: Option<&TrendResult>) {
    match trend {
        Some(t) => println!(
            "  {:<8} {} ({:+.2}%/period)",
            label,
            t.direction.as_str(),
            t.slope
        ),
        None => println!("  {:<8} not enough data", label),
    }
}

fn print_metric_trend(label: &str, trend: &MetricTrend) {
    println!(
        "  {:<8} now {:.1}, avg {:.1} ({:+.3}/day)",
        label, trend.current, trend.average, trend.slope_per_day
    );
}

fn print_horizon(label: &str, prediction: &HorizonPrediction) {
    if prediction.insufficient_data {
        println!("  {:<9} {:.0}% (not enough data)", label, prediction.probability * 100.0);
    } else {
        println!(
            "  {:<9} {:.0}% (confidence {:.0}%)",
            label,
            prediction.probability * 100.0,
            prediction.confidence * 100.0
        );
    }
}

fn print_correlation(result: &CorrelationResult, habit: &Habit, habits: &[Habit]) {
    let other = if result.habit_a == habit.id {
        &result.habit_b
    } else {
        &result.habit_a
    };
    println!(
        "  {}: {:.0}% ({})",
        habit_name(habits, other),
        result.overall_score * 100.0,
        result.kind.description()
    );
}
