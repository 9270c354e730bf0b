//! SQLite backend for the bitext link store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Two store types cover the two
//! database shapes of the pipeline: [`SentenceDb`] (sentence texts plus the
//! per-document local-ID index) and [`LinkDb`] (resolved links, projections,
//! and range tables).

mod encode;
mod schema;

pub mod error;
pub mod links;
pub mod sentence;

pub use error::{Error, Result};
pub use links::LinkDb;
pub use sentence::SentenceDb;

use std::time::Duration;

/// Lock-wait allowance for writable connections. Large batch jobs hold the
/// write lock in bounded bursts; a generous timeout avoids spurious
/// failures when several jobs share one database file.
pub(crate) const LOCK_WAIT: Duration = Duration::from_secs(7200);
