//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! ID groups are stored as ordered, whitespace-joined strings — the
//! cross-system interchange format downstream consumers split on.

use bitextdb_core::{
  align::AlignType,
  id::{BitextId, LinkId, SentenceId},
  record::{LinkRecord, StoredLink},
};

use crate::Result;

// ─── ID groups ───────────────────────────────────────────────────────────────

pub fn encode_group(ids: &[String]) -> String { ids.join(" ") }

pub fn decode_group(s: &str) -> Vec<String> {
  s.split_whitespace().map(str::to_owned).collect()
}

pub fn encode_sentences(ids: &[SentenceId]) -> String {
  ids
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn decode_sentences(s: &str) -> Result<Vec<SentenceId>> {
  s.split_whitespace()
    .map(|tok| {
      tok
        .parse::<i64>()
        .map(SentenceId)
        .map_err(|_| {
          bitextdb_core::Error::InvalidSentenceId(tok.to_owned()).into()
        })
    })
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values read directly from a `links` row.
pub struct RawLink {
  pub link_id:       i64,
  pub bitext_id:     i64,
  pub src_ids:       String,
  pub trg_ids:       String,
  pub src_sent_ids:  String,
  pub trg_sent_ids:  String,
  pub align_type:    String,
  pub aligner_score: Option<f64>,
  pub cleaner_score: Option<f64>,
}

impl RawLink {
  pub fn into_stored(self) -> Result<StoredLink> {
    let align_type: AlignType =
      self.align_type.parse().map_err(crate::Error::Core)?;

    Ok(StoredLink {
      id:   LinkId(self.link_id),
      link: LinkRecord {
        bitext_id:     BitextId(self.bitext_id),
        src_ids:       decode_group(&self.src_ids),
        trg_ids:       decode_group(&self.trg_ids),
        src_sentences: decode_sentences(&self.src_sent_ids)?,
        trg_sentences: decode_sentences(&self.trg_sent_ids)?,
        align_type,
        aligner_score: self.aligner_score,
        cleaner_score: self.cleaner_score,
      },
    })
  }
}
