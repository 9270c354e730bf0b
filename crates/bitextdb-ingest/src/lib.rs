//! Ingestion, merging, and range validation over abstract link stores.
//!
//! Everything here is generic over the storage traits in [`bitextdb_core`]:
//! the [`Ingester`] drives one corpus release's alignment records into a
//! [`LinkStore`](bitextdb_core::store::LinkStore), [`merge`] folds
//! per-language-pair stores into a macro-language store, and [`validate`]
//! checks the derived range tables for structural faults.

mod error;
mod ingester;
mod merge;
mod summary;
mod validate;

pub use error::{Error, Result};
pub use ingester::Ingester;
pub use merge::merge_lang_pair;
pub use summary::{IngestSummary, MergeSummary};
pub use validate::{check_ranges, recompute_corpus_ranges};

#[cfg(test)]
mod tests;
