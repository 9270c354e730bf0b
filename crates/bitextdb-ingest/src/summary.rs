//! Run summaries reported by the pipeline transforms.

use bitextdb_core::range::RangeOverlap;
use serde::Serialize;

/// Outcome counts of one ingestion run.
///
/// Every input record lands in exactly one of `accepted`,
/// `dropped_unresolved`, `dropped_malformed`, or `skipped_foreign`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
  /// Records fully resolved and persisted.
  pub accepted:           u64,
  /// Records with at least one local ID the sentence index could not
  /// resolve.
  pub dropped_unresolved: u64,
  /// Records with an unparseable alignment-type tag, or unparseable
  /// outright.
  pub dropped_malformed:  u64,
  /// Records belonging to a different corpus release than the run's.
  pub skipped_foreign:    u64,
  pub bitexts_committed:  u64,
  pub bitexts_dropped:    u64,
  /// Range-table faults found by the post-run validation scan.
  pub overlaps:           Vec<RangeOverlap>,
}

/// Outcome of merging one language pair into a macro-language store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
  /// Original pair code that was merged, e.g. `en-de`.
  pub pair:         String,
  pub links_copied: u64,
  pub bitexts:      u64,
  /// Whether the pair's direction was reversed to reach canonical order.
  pub reversed:     bool,
  /// Set when the pair had already been merged and the run was a no-op.
  pub skipped:      bool,
}
