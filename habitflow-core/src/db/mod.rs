//! Storage layer for habitflow
//!
//! This module provides:
//! - A SQLite-backed key-value store with schema migrations
//! - The habit repository built on top of it

pub mod habits;
pub mod repo;
pub mod schema;

pub use habits::{Backup, HabitRepository, HabitStore, ProgressUpdate};
pub use repo::{Database, KeyValueStore, KeyValueStoreExt};
