//! Core types and trait definitions for the bitext link store.
//!
//! This crate is deliberately free of database dependencies. The sqlite
//! backend and the ingestion pipeline depend on it; it depends on nothing
//! but serde and thiserror.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod align;
pub mod corpus;
pub mod error;
pub mod id;
pub mod range;
pub mod record;
pub mod store;

pub use error::{Error, Result};
