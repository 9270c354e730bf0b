//! The storage traits and supporting option types.
//!
//! The traits are implemented by storage backends (e.g.
//! `bitextdb-store-sqlite`). The ingestion pipeline depends on this
//! abstraction, not on any concrete engine: anything offering point lookup,
//! prefix scan, batched insert-if-absent, transactional batch commit, and an
//! immutable-snapshot open mode can satisfy it.

use crate::{
  corpus::{Bitext, BitextKey, CorpusMeta, CorpusRelease, CorpusSelector},
  id::{BitextId, CorpusId, DocumentId, SentenceId},
  range::{LinkRange, ScopedRange},
  record::{LinkRecord, StoredLink},
};

/// Reference flush threshold: buffered rows (links plus projection rows)
/// before a batch transaction is committed.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

// ─── Options ─────────────────────────────────────────────────────────────────

/// Output-shape options for a link store.
///
/// The historical pipeline existed in several near-duplicate variants with
/// and without the corpus-ID projection column and the bitext range table;
/// these flags configure one store to produce any of those shapes.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// Carry the corpus ID on `linkedsource`/`linkedtarget` projection rows.
  pub include_corpus_id:  bool,
  /// Maintain the per-bitext range table.
  pub track_bitext_range: bool,
  /// Buffered-row threshold that triggers a flush.
  pub batch_size:         usize,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      include_corpus_id:  true,
      track_bitext_range: true,
      batch_size:         DEFAULT_BATCH_SIZE,
    }
  }
}

// ─── Sentence index (read-only collaborator) ─────────────────────────────────

/// Read surface of a pre-populated per-language sentence index.
///
/// During link ingestion this is opened against an immutable snapshot and
/// never mutated, so no reader/writer conflict arises. A `None` result is
/// an expected, non-fatal condition: the caller treats it as "this group is
/// not fully resolvable".
pub trait SentenceIndex {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up the surrogate ID of a `(corpus, version, document)` triple.
  async fn document_id(
    &self,
    corpus: &str,
    version: &str,
    document: &str,
  ) -> Result<Option<DocumentId>, Self::Error>;

  /// Resolve a document-local sentence ID to its global sentence ID.
  async fn resolve(
    &self,
    document: DocumentId,
    local_id: &str,
  ) -> Result<Option<SentenceId>, Self::Error>;
}

// ─── Link store (write surface) ──────────────────────────────────────────────

/// Write surface of a link store.
///
/// All inserts are insert-if-absent, so every operation is idempotent: a
/// killed and restarted ingestion run converges to the same end state as an
/// uninterrupted one. Single logical writer per store instance; write
/// methods take `&mut self` to make that explicit.
pub trait LinkStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert the corpus release row if absent and return its ID. When
  /// `meta.latest` is set, clears `latest` on sibling releases of the same
  /// `(corpus, srclang, trglang)` group in the same transaction.
  async fn ensure_corpus(
    &mut self,
    meta: &CorpusMeta,
  ) -> Result<CorpusId, Self::Error>;

  /// Look up a corpus release by its unique `(corpus, version, srclang,
  /// trglang)` key.
  async fn find_corpus(
    &self,
    corpus: &str,
    version: &str,
    srclang: &str,
    trglang: &str,
  ) -> Result<Option<CorpusId>, Self::Error>;

  /// Insert the bitext row if absent and return its ID.
  async fn ensure_bitext(
    &mut self,
    key: &BitextKey,
  ) -> Result<BitextId, Self::Error>;

  /// Buffer one resolved link together with its projection rows. Flushes
  /// automatically when the buffered-row threshold is reached.
  async fn push_link(
    &mut self,
    link: LinkRecord,
    corpus: Option<CorpusId>,
  ) -> Result<(), Self::Error>;

  /// Commit all buffered rows as a single transaction.
  async fn flush(&mut self) -> Result<(), Self::Error>;

  /// Flush, then recompute and persist this bitext's range from the link
  /// table. Returns the range, or `None` if the bitext has no links.
  async fn commit_bitext(
    &mut self,
    id: BitextId,
  ) -> Result<Option<LinkRange>, Self::Error>;

  /// Roll back a bitext that produced no accepted links: delete its bitext
  /// row and range entry. Shared sentences are never deleted.
  async fn drop_bitext(&mut self, id: BitextId) -> Result<(), Self::Error>;

  /// Flush, then recompute and persist the corpus-level range over all
  /// bitexts matching `selector`. Returns `None` if no links match.
  async fn commit_corpus(
    &mut self,
    id: CorpusId,
    selector: &CorpusSelector,
  ) -> Result<Option<LinkRange>, Self::Error>;

  /// Roll back a corpus release that produced no accepted links.
  async fn drop_corpus(&mut self, id: CorpusId) -> Result<(), Self::Error>;

  /// Whether `pair_code` already contributed to this (merged) store.
  async fn has_lang_pair(
    &self,
    pair_code: &str,
  ) -> Result<bool, Self::Error>;

  /// Record an original pair code as merged into this store.
  async fn add_lang_pair(
    &mut self,
    pair_code: &str,
  ) -> Result<(), Self::Error>;
}

// ─── Link source (read surface) ──────────────────────────────────────────────

/// Snapshot read surface of a link store — the merge transform's input and
/// the range validator's view.
pub trait LinkSource {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All bitexts in insertion order.
  async fn bitexts(&self) -> Result<Vec<Bitext>, Self::Error>;

  /// All links of one bitext in insertion order.
  async fn links(
    &self,
    bitext: BitextId,
  ) -> Result<Vec<StoredLink>, Self::Error>;

  /// All corpus release rows.
  async fn releases(&self) -> Result<Vec<CorpusRelease>, Self::Error>;

  /// Original pair codes merged into this store.
  async fn lang_pairs(&self) -> Result<Vec<String>, Self::Error>;

  /// Every persisted bitext range, labelled with the bitext identity.
  async fn bitext_ranges(&self) -> Result<Vec<ScopedRange>, Self::Error>;

  /// Every persisted corpus range, labelled with the release identity.
  async fn corpus_ranges(&self) -> Result<Vec<ScopedRange>, Self::Error>;
}
