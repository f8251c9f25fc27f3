//! Core library for Habitual.
//!
//! This crate provides the domain models, database operations and the streak
//! engine for Habitual, independent of any transport layer (HTTP, MCP, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use habitual_core::{Database, HabitEngine, SystemClock, TracingSink};
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let engine = HabitEngine::new(db, Arc::new(SystemClock));
//! let report = engine.check_and_reset_broken_streaks()?.dispatch(&TracingSink);
//! println!("reset {} broken streaks", report.affected);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod clock;
pub mod db;
pub mod effects;
pub mod engine;
pub mod error;
pub mod models;

// Re-export commonly used types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::Database;
pub use effects::{Effect, EffectSink, Outcome, RecordingSink, TracingSink};
pub use engine::HabitEngine;
pub use error::{HabitError, Result};
