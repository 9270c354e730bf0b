//! Corpus releases, bitexts, and language pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::{BitextId, CorpusId},
};

// ─── Corpus release ──────────────────────────────────────────────────────────

/// Identity of one corpus release for one language pair.
///
/// `latest` marks the newest release within a `(corpus, srclang, trglang)`
/// group; setting it on one row atomically clears it on siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusMeta {
  pub corpus:   String,
  pub version:  String,
  /// Source language code in the corpus collection's own labelling scheme.
  pub srclang:  String,
  pub trglang:  String,
  /// ISO-639-3 source language code (macro-language where available).
  pub srclang3: String,
  pub trglang3: String,
  pub latest:   bool,
}

impl CorpusMeta {
  /// Selector for the corpus-level range: all bitexts of this release whose
  /// document paths carry the release's language prefixes.
  pub fn selector(&self) -> CorpusSelector {
    CorpusSelector {
      corpus:    self.corpus.clone(),
      version:   self.version.clone(),
      doc_langs: Some((self.srclang.clone(), self.trglang.clone())),
    }
  }
}

impl fmt::Display for CorpusMeta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}/{}/{}-{}",
      self.corpus, self.version, self.srclang, self.trglang
    )
  }
}

/// Which bitexts a corpus-level range aggregates over.
///
/// Per-language-pair stores restrict by the document-path language prefixes
/// (`fromDoc LIKE 'srclang/%'`); merged macro-language stores aggregate over
/// every bitext of the `(corpus, version)` release, so `doc_langs` is `None`
/// there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSelector {
  pub corpus:    String,
  pub version:   String,
  pub doc_langs: Option<(String, String)>,
}

// ─── Bitext ──────────────────────────────────────────────────────────────────

/// Identity of one aligned document pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitextKey {
  pub corpus:   String,
  pub version:  String,
  pub from_doc: String,
  pub to_doc:   String,
}

impl BitextKey {
  /// The key with source and target documents exchanged.
  pub fn swapped(self) -> Self {
    Self {
      corpus:   self.corpus,
      version:  self.version,
      from_doc: self.to_doc,
      to_doc:   self.from_doc,
    }
  }
}

impl fmt::Display for BitextKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}/{}/{}-{}",
      self.corpus, self.version, self.from_doc, self.to_doc
    )
  }
}

/// A bitext as stored, with its assigned surrogate ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitext {
  pub id:  BitextId,
  pub key: BitextKey,
}

/// A corpus release row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRelease {
  pub id:   CorpusId,
  pub meta: CorpusMeta,
}

// ─── Language pairs ──────────────────────────────────────────────────────────

/// A directed language pair, e.g. `en-de`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LangPair {
  pub src: String,
  pub trg: String,
}

impl LangPair {
  pub fn new(src: impl Into<String>, trg: impl Into<String>) -> Self {
    Self { src: src.into(), trg: trg.into() }
  }

  /// Parse a `"xx-yy"` pair code.
  pub fn parse(code: &str) -> Result<Self> {
    match code.split_once('-') {
      Some((src, trg)) if !src.is_empty() && !trg.is_empty() => {
        Ok(Self::new(src, trg))
      }
      _ => Err(Error::InvalidLangPair(code.to_owned())),
    }
  }

  /// The pair code, `"xx-yy"`.
  pub fn code(&self) -> String { format!("{}-{}", self.src, self.trg) }

  /// Canonical ordering: lexicographically smaller code first. Returns the
  /// canonical pair and whether the direction had to be reversed.
  pub fn canonical(&self) -> (LangPair, bool) {
    if self.src > self.trg {
      (LangPair::new(self.trg.clone(), self.src.clone()), true)
    } else {
      (self.clone(), false)
    }
  }
}

impl fmt::Display for LangPair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.src, self.trg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_orders_lexicographically() {
    let (pair, reversed) = LangPair::new("eng", "deu").canonical();
    assert_eq!(pair.code(), "deu-eng");
    assert!(reversed);

    let (pair, reversed) = LangPair::new("deu", "eng").canonical();
    assert_eq!(pair.code(), "deu-eng");
    assert!(!reversed);
  }

  #[test]
  fn parse_rejects_bare_codes() {
    assert!(LangPair::parse("en").is_err());
    assert!(LangPair::parse("-de").is_err());
    assert_eq!(LangPair::parse("en-de").unwrap().code(), "en-de");
  }
}
