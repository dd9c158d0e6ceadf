//! # habitflow-core
//!
//! Core library for habitflow - a habit tracker with streak, trend,
//! correlation and prediction analytics.
//!
//! This library provides:
//! - Domain types for habits and completion entries
//! - Analytics over habit histories
//! - A SQLite-backed key-value store and habit repository
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use habitflow_core::analytics::AnalyticsEngine;
//! use habitflow_core::db::{HabitRepository, HabitStore};
//! use habitflow_core::{Clock, Config, Database, SystemClock};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let store = HabitStore::new(db);
//! let engine = AnalyticsEngine::new(config.analytics.clone());
//! let habits = store.get_habits().expect("failed to load habits");
//! let achievements = store.achievements().expect("failed to load achievements");
//! let summary = engine.get_analytics(&habits, &achievements, SystemClock.today());
//! println!("{} habits, {} done today", summary.total_habits, summary.completed_today);
//! ```

// Re-export commonly used items at the crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::{Database, HabitRepository, HabitStore};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod categories;
pub mod clock;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
