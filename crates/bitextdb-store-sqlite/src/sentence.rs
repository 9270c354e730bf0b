//! [`SentenceDb`] — sentence interning and the per-document local-ID index.

use std::path::Path;

use bitextdb_core::{
  id::{DocumentId, SentenceId},
  store::{DEFAULT_BATCH_SIZE, SentenceIndex},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{Error, LOCK_WAIT, Result, schema::SENTENCE_SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Sentence store and document index backed by a single SQLite file.
///
/// Writable handles own a buffer of pending local-ID mappings that is
/// flushed in batches; sentence interning itself writes through immediately
/// because callers need the assigned ID back. One logical writer per store;
/// ingestion readers use [`SentenceDb::open_snapshot`].
pub struct SentenceDb {
  conn:       tokio_rusqlite::Connection,
  /// Pending `sentids` rows: (sentence ID, document ID, local ID).
  buffer:     Vec<(i64, i64, String)>,
  batch_size: usize,
}

impl SentenceDb {
  /// Open (or create) a writable store at `path` and run schema
  /// initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open a writable in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Open an immutable snapshot of an existing store. Reads see a frozen
  /// view and never take locks, so a concurrent writer on another file
  /// cannot conflict with resolution lookups.
  ///
  /// The file itself must be quiescent: immutable mode skips all locking,
  /// so the database must have no attached writer and its WAL must be
  /// checkpointed. A cleanly closed store satisfies both.
  pub async fn open_snapshot(path: impl AsRef<Path>) -> Result<Self> {
    let uri = format!("file:{}?immutable=1", path.as_ref().display());
    let conn = tokio_rusqlite::Connection::open_with_flags(
      uri,
      rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
        | rusqlite::OpenFlags::SQLITE_OPEN_URI,
    )
    .await?;
    Ok(Self { conn, buffer: Vec::new(), batch_size: DEFAULT_BATCH_SIZE })
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.busy_timeout(LOCK_WAIT)?;
        conn.execute_batch(SENTENCE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, buffer: Vec::new(), batch_size: DEFAULT_BATCH_SIZE })
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Deduplicate `text` and return its stable global ID.
  ///
  /// Normalises by trimming surrounding whitespace, looks the text up by
  /// exact equality, and inserts only on first occurrence. Repeated calls
  /// with identical text always converge to the same ID; the insert-if-
  /// absent plus re-select runs as one statement sequence on the connection
  /// thread, so a duplicate ID cannot be allocated for the same text.
  pub async fn intern(&self, text: &str) -> Result<SentenceId> {
    let text = text.trim().to_owned();

    let id: i64 = self
      .conn
      .call(move |conn| {
        let existing: Option<i64> = conn
          .query_row(
            "SELECT rowid FROM sentences WHERE sentence = ?1",
            rusqlite::params![text],
            |row| row.get(0),
          )
          .optional()?;

        if let Some(id) = existing {
          return Ok(id);
        }

        conn.execute(
          "INSERT OR IGNORE INTO sentences (sentence) VALUES (?1)",
          rusqlite::params![text],
        )?;
        let id = conn.query_row(
          "SELECT rowid FROM sentences WHERE sentence = ?1",
          rusqlite::params![text],
          |row| row.get(0),
        )?;
        Ok(id)
      })
      .await?;

    Ok(SentenceId(id))
  }

  /// Insert the document triple if absent and return its ID.
  pub async fn add_document(
    &self,
    corpus: &str,
    version: &str,
    document: &str,
  ) -> Result<DocumentId> {
    let corpus = corpus.to_owned();
    let version = version.to_owned();
    let document = document.to_owned();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO documents (corpus, version, document)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![corpus, version, document],
        )?;
        let id = conn.query_row(
          "SELECT rowid FROM documents
           WHERE corpus = ?1 AND version = ?2 AND document = ?3",
          rusqlite::params![corpus, version, document],
          |row| row.get(0),
        )?;
        Ok(id)
      })
      .await?;

    Ok(DocumentId(id))
  }

  /// Intern one sentence and buffer its `(document, local ID)` mapping.
  pub async fn index_sentence(
    &mut self,
    document: DocumentId,
    local_id: &str,
    text: &str,
  ) -> Result<SentenceId> {
    let sentence = self.intern(text).await?;
    self.buffer.push((sentence.0, document.0, local_id.to_owned()));
    if self.buffer.len() >= self.batch_size {
      self.flush().await?;
    }
    Ok(sentence)
  }

  /// Commit all buffered local-ID mappings as a single transaction.
  pub async fn flush(&mut self) -> Result<()> {
    if self.buffer.is_empty() {
      return Ok(());
    }
    let batch = std::mem::take(&mut self.buffer);
    debug!(rows = batch.len(), "flushing sentence-index buffer");

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO sentids (id, docID, sentID)
             VALUES (?1, ?2, ?3)",
          )?;
          for (id, doc_id, local_id) in &batch {
            stmt.execute(rusqlite::params![id, doc_id, local_id])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}

// ─── SentenceIndex impl ──────────────────────────────────────────────────────

impl SentenceIndex for SentenceDb {
  type Error = Error;

  async fn document_id(
    &self,
    corpus: &str,
    version: &str,
    document: &str,
  ) -> Result<Option<DocumentId>> {
    let corpus = corpus.to_owned();
    let version = version.to_owned();
    let document = document.to_owned();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT rowid FROM documents
               WHERE corpus = ?1 AND version = ?2 AND document = ?3",
              rusqlite::params![corpus, version, document],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(id.map(DocumentId))
  }

  async fn resolve(
    &self,
    document: DocumentId,
    local_id: &str,
  ) -> Result<Option<SentenceId>> {
    let local_id = local_id.to_owned();
    let doc_id = document.0;

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id FROM sentids WHERE docID = ?1 AND sentID = ?2",
              rusqlite::params![doc_id, local_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(id.map(SentenceId))
  }
}
