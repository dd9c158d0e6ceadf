//! habitflow - habit tracking with streak, trend, correlation and
//! prediction analytics
//!
//! Reads and writes the habit store in the XDG data directory.

mod report;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use habitflow_core::analytics::AnalyticsEngine;
use habitflow_core::db::{Backup, HabitRepository, HabitStore};
use habitflow_core::types::{CompletionEntry, EntryContext, EntryMetrics, Frequency, NewHabit};
use habitflow_core::{categories, dates, Clock, Config, Database, FixedClock, Habit, SystemClock};

#[derive(Parser)]
#[command(name = "habitflow")]
#[command(about = "Track habits and analyze streaks, trends and correlations")]
#[command(version)]
struct Cli {
    /// Pin "today" to a date (YYYY-MM-DD) instead of the system clock
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Output format for reports
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a habit
    Add {
        name: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
    },
    /// Log a day for a habit (id, id prefix or name)
    Log {
        habit: String,
        /// Day to log, defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Record the day as missed instead of completed
        #[arg(long)]
        missed: bool,
        /// Time of day (HH:MM, UTC)
        #[arg(long, value_parser = parse_time)]
        at: Option<NaiveTime>,
        /// Minutes spent
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        quality: Option<f64>,
        #[arg(long)]
        difficulty: Option<f64>,
        #[arg(long)]
        energy: Option<f64>,
        /// Percent of the goal reached
        #[arg(long)]
        progress: Option<f64>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        weather: Option<String>,
    },
    /// List habits
    List,
    /// Dashboard summary across all habits
    Summary,
    /// Detailed analytics for one habit
    Detail { habit: String },
    /// Replace stored data with a backup file
    Import { file: PathBuf },
    /// Write a backup of all data
    Export {
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show habit categories and suggestions
    Categories {
        /// Only this category
        id: Option<String>,
    },
    /// Delete a habit
    Delete { habit: String },
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    dates::parse_day(s).map_err(|e| e.to_string())
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("invalid time '{s}': {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        habitflow_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let clock: Box<dyn Clock> = match cli.today {
        Some(day) => Box::new(FixedClock::at_day(day)),
        None => Box::new(SystemClock),
    };

    // Open database
    let db_path = config.resolved_database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let store = HabitStore::new(db)
        .with_streak_window(config.analytics.streak_window_days)
        .context("invalid streak window")?;
    let engine = AnalyticsEngine::new(config.analytics.clone());

    match cli.command {
        Command::Add {
            name,
            category,
            description,
            frequency,
        } => {
            if categories::category(&category).is_none() {
                tracing::warn!(category = %category, "Unknown category");
            }
            let habit = store
                .add_habit(
                    NewHabit {
                        name,
                        description,
                        category,
                        frequency,
                    },
                    clock.as_ref(),
                )
                .context("failed to add habit")?;
            println!("Added habit '{}' ({})", habit.name, habit.id);
        }
        Command::Log {
            habit,
            date,
            missed,
            at,
            duration,
            quality,
            difficulty,
            energy,
            progress,
            mood,
            location,
            weather,
        } => {
            let target = resolve_habit(&store, &habit)?;
            let date = date.unwrap_or_else(|| clock.today());

            let mut entry = CompletionEntry::new(date, !missed);
            match at {
                Some(time) => entry = entry.with_timestamp(date.and_time(time).and_utc()),
                None if date == clock.today() => entry = entry.with_timestamp(clock.now()),
                None => {}
            }

            let context = (location.is_some() || weather.is_some()).then(|| EntryContext {
                location,
                weather,
                ..Default::default()
            });
            let metrics = EntryMetrics {
                duration,
                quality,
                difficulty,
                energy,
                progress,
                mood,
                context,
            };
            if metrics != EntryMetrics::default() {
                entry = entry.with_metrics(metrics);
            }
            let entry = entry.with_observed_context();

            let update = store
                .track_progress(&target.id, entry)
                .context("failed to log progress")?;
            println!(
                "Logged {} for '{}' on {} (streak: {})",
                if missed { "miss" } else { "completion" },
                update.habit.name,
                date,
                update.habit.streak
            );
            for id in &update.unlocked {
                println!("Achievement unlocked: {}", id);
            }
        }
        Command::List => {
            let habits = store.get_habits().context("failed to load habits")?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&habits)?),
                OutputFormat::Text => report::print_habit_list(&habits, clock.today()),
            }
        }
        Command::Summary => {
            let habits = store.get_habits().context("failed to load habits")?;
            let achievements = store.achievements().context("failed to load achievements")?;
            let summary = engine.get_analytics(&habits, &achievements, clock.today());
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => report::print_summary(&summary, &habits),
            }
        }
        Command::Detail { habit } => {
            let target = resolve_habit(&store, &habit)?;
            let Some(detailed) = engine
                .get_detailed_analytics(&target.id, &store, clock.as_ref())
                .context("failed to compute analytics")?
            else {
                bail!("No habit found matching '{}'", habit);
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detailed)?),
                OutputFormat::Text => {
                    let habits = store.get_habits().context("failed to load habits")?;
                    report::print_detail(&target, &detailed, &habits)
                }
            }
        }
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let backup: Backup =
                serde_json::from_str(&content).context("invalid backup file format")?;
            let count = store
                .import_backup(backup)
                .context("failed to import backup")?;
            println!("Imported {} habit(s)", count);
        }
        Command::Export { output } => {
            let backup = store
                .export_backup(clock.as_ref())
                .context("failed to export backup")?;
            let json = serde_json::to_string_pretty(&backup)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported backup to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Categories { id } => {
            let selected: Vec<_> = match id {
                Some(id) => match categories::category(&id) {
                    Some(category) => vec![*category],
                    None => bail!("Unknown category '{}'", id),
                },
                None => categories::categories().to_vec(),
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
                OutputFormat::Text => report::print_categories(&selected),
            }
        }
        Command::Delete { habit } => {
            let target = resolve_habit(&store, &habit)?;
            store
                .delete_habit(&target.id)
                .context("failed to delete habit")?;
            println!("Deleted habit '{}'", target.name);
        }
    }

    Ok(())
}

/// Find a habit by exact id, id prefix or case-insensitive name.
fn resolve_habit(store: &dyn HabitRepository, query: &str) -> Result<Habit> {
    if let Some(habit) = store.get_habit(query)? {
        return Ok(habit);
    }

    let habits = store.get_habits().context("failed to load habits")?;
    let mut matches: Vec<Habit> = habits
        .into_iter()
        .filter(|h| h.id.starts_with(query) || h.name.eq_ignore_ascii_case(query))
        .collect();

    if matches.len() > 1 {
        bail!(
            "'{}' matches {} habits; use the habit id",
            query,
            matches.len()
        );
    }
    matches
        .pop()
        .with_context(|| format!("No habit found matching '{}'", query))
}
