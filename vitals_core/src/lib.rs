#![forbid(unsafe_code)]

//! Core domain model and business logic for the Vitals journal.
//!
//! This crate provides:
//! - Domain types (readings, blood sugar context, metrics snapshots)
//! - Byte store abstraction (in-memory and file-backed)
//! - Journal persistence with corruption recovery
//! - Derived metrics (today count, streak, health score)
//! - The engine that records entries and re-derives metrics
//! - CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod journal;
pub mod metrics;
pub mod engine;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{ByteStore, FileStore, MemoryStore};
pub use journal::{Journal, JournalStore, LoadStatus, Loaded, JOURNAL_KEY};
pub use engine::{initial_snapshot, load_journal, Engine};
pub use export::write_csv;
