//! Surrogate identifiers.
//!
//! Every entity in the store is keyed by a monotonically increasing integer
//! assigned by the storage engine on first insertion (a SQLite rowid in the
//! bundled backend). IDs are never reused or renumbered.

use serde::{Deserialize, Serialize};

macro_rules! surrogate_id {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
      Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl From<i64> for $name {
      fn from(raw: i64) -> Self { Self(raw) }
    }
  };
}

surrogate_id! {
  /// Store-wide identifier for a deduplicated sentence text.
  /// Assigned on first occurrence; identity is purely by text equality.
  SentenceId
}

surrogate_id! {
  /// Identifier for a `(corpus, version, document)` triple.
  DocumentId
}

surrogate_id! {
  /// Identifier for an aligned document pair.
  BitextId
}

surrogate_id! {
  /// Identifier for a corpus release row.
  CorpusId
}

surrogate_id! {
  /// Identifier for one alignment link in the link table. Equal to the
  /// link's insertion-order position, which is what ranges are built over.
  LinkId
}
