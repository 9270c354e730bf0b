//! Alignment records — raw input items and their resolved, storable form.

use serde::{Deserialize, Serialize};

use crate::{
  align::AlignType,
  id::{BitextId, LinkId, SentenceId},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// One raw alignment record as produced by an external parser.
///
/// The local-ID groups are ordered and carry the identifiers given by the
/// original document markup, unique only within their document. Score
/// fields distinguish "no score" from "score = 0.0".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentRecord {
  pub corpus:   String,
  pub version:  String,
  pub from_doc: String,
  pub to_doc:   String,
  #[serde(default)]
  pub src_ids:  Vec<String>,
  #[serde(default)]
  pub trg_ids:  Vec<String>,
  /// Explicit `"m-n"` tag from the markup, if present; derived from the
  /// group cardinalities otherwise.
  #[serde(default)]
  pub align_type: Option<String>,
  #[serde(default)]
  pub aligner_score: Option<f64>,
  #[serde(default)]
  pub cleaner_score: Option<f64>,
}

// ─── Resolved ────────────────────────────────────────────────────────────────

/// A fully resolved alignment link, ready to persist.
///
/// Only emitted when every non-empty local ID on both sides resolved to a
/// global sentence ID, so `src_ids.len() == src_sentences.len()` (and
/// likewise for the target side) always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
  pub bitext_id:     BitextId,
  /// Cleaned (non-empty) local IDs, in markup order.
  pub src_ids:       Vec<String>,
  pub trg_ids:       Vec<String>,
  pub src_sentences: Vec<SentenceId>,
  pub trg_sentences: Vec<SentenceId>,
  pub align_type:    AlignType,
  pub aligner_score: Option<f64>,
  pub cleaner_score: Option<f64>,
}

impl LinkRecord {
  /// The link with its source and target sides exchanged.
  pub fn swapped(self) -> Self {
    Self {
      bitext_id:     self.bitext_id,
      src_ids:       self.trg_ids,
      trg_ids:       self.src_ids,
      src_sentences: self.trg_sentences,
      trg_sentences: self.src_sentences,
      align_type:    self.align_type.swapped(),
      aligner_score: self.aligner_score,
      cleaner_score: self.cleaner_score,
    }
  }
}

/// A link as stored, with its assigned insertion-order ID.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLink {
  pub id:   LinkId,
  pub link: LinkRecord,
}
