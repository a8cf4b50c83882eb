#![forbid(unsafe_code)]

//! Core domain model and business logic for the liftweek training tracker.
//!
//! This crate provides:
//! - Domain types (exercises, templates, weeks, workout logs)
//! - ISO week arithmetic
//! - Document store contract with in-memory and on-disk implementations
//! - Schedule engine and workout logging sessions
//! - Analytics, history paging and CSV export

pub mod types;
pub mod error;
pub mod week;
pub mod clock;
pub mod config;
pub mod logging;
pub mod subscription;
pub mod store;
pub mod memory_store;
pub mod file_store;
pub mod exercises;
pub mod templates;
pub mod schedule;
pub mod recorder;
pub mod ticker;
pub mod history;
pub mod analytics;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use week::{DayKey, WeekKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use subscription::Subscription;
pub use store::{ExerciseRepo, LogCursor, LogRepo, ScheduleRepo, SortOrder, TemplateRepo};
pub use memory_store::MemoryStore;
pub use file_store::FileStore;
pub use exercises::ExerciseLibrary;
pub use templates::TemplateLibrary;
pub use schedule::{ScheduleEngine, ScheduledWorkout};
pub use recorder::{FinishOutcome, LogSession, SessionDefaults, SessionState, SetUpdate};
pub use ticker::SessionTicker;
pub use history::{fetch_all_logs, LogPager};
pub use export::{export_rows, write_csv, ExportRow};
