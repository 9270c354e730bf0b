//! [`LinkDb`] — the SQLite implementation of the link store.

use std::path::Path;

use bitextdb_core::{
  corpus::{Bitext, BitextKey, CorpusMeta, CorpusRelease, CorpusSelector},
  id::{BitextId, CorpusId},
  range::{LinkRange, ScopedRange},
  record::{LinkRecord, StoredLink},
  store::{LinkSource, LinkStore, StoreOptions},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  LOCK_WAIT, Error, Result,
  encode::{RawLink, encode_group, encode_sentences},
  schema::LINK_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A link store backed by a single SQLite file.
///
/// Owns its pending-row buffer and batch size; flushes as one transaction
/// when the threshold is reached and unconditionally at end of bitext.
/// Every insert is insert-if-absent, so re-ingesting the same input is a
/// no-op and an interrupted run can simply be restarted.
pub struct LinkDb {
  pub(crate) conn: tokio_rusqlite::Connection,
  opts:            StoreOptions,
  pending:         Vec<PendingLink>,
  /// Link rows plus projection rows currently buffered.
  buffered_rows:   usize,
}

struct PendingLink {
  link:   LinkRecord,
  corpus: Option<CorpusId>,
}

impl LinkDb {
  /// Open (or create) a writable store at `path` and run schema
  /// initialisation.
  pub async fn open(
    path: impl AsRef<Path>,
    opts: StoreOptions,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, opts).await
  }

  /// Open a writable in-memory store — useful for testing.
  pub async fn open_in_memory(opts: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, opts).await
  }

  /// Open an immutable snapshot of an existing store, e.g. as the source
  /// side of a merge.
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
    Ok(Self {
      conn,
      opts: StoreOptions::default(),
      pending: Vec::new(),
      buffered_rows: 0,
    })
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    opts: StoreOptions,
  ) -> Result<Self> {
    conn
      .call(|conn| {
        conn.busy_timeout(LOCK_WAIT)?;
        conn.execute_batch(LINK_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, opts, pending: Vec::new(), buffered_rows: 0 })
  }

  async fn range_query(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Option<LinkRange>> {
    let bounds: (Option<i64>, Option<i64>) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          sql,
          rusqlite::params_from_iter(params),
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(LinkRange::from_bounds(bounds.0, bounds.1))
  }
}

// ─── LinkStore impl ──────────────────────────────────────────────────────────

impl LinkStore for LinkDb {
  type Error = Error;

  async fn ensure_corpus(&mut self, meta: &CorpusMeta) -> Result<CorpusId> {
    let meta = meta.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT OR IGNORE INTO corpora
             (corpus, version, srclang, trglang, srclang3, trglang3, latest)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
          rusqlite::params![
            meta.corpus,
            meta.version,
            meta.srclang,
            meta.trglang,
            meta.srclang3,
            meta.trglang3,
          ],
        )?;
        // At most one latest release per (corpus, srclang, trglang) group;
        // promoting this release demotes its siblings in the same
        // transaction.
        if meta.latest {
          tx.execute(
            "UPDATE corpora SET latest = 0
             WHERE corpus = ?1 AND srclang = ?2 AND trglang = ?3",
            rusqlite::params![meta.corpus, meta.srclang, meta.trglang],
          )?;
          tx.execute(
            "UPDATE corpora SET latest = 1
             WHERE corpus = ?1 AND version = ?2
               AND srclang = ?3 AND trglang = ?4",
            rusqlite::params![
              meta.corpus,
              meta.version,
              meta.srclang,
              meta.trglang
            ],
          )?;
        }
        let id = tx.query_row(
          "SELECT corpusID FROM corpora
           WHERE corpus = ?1 AND version = ?2
             AND srclang = ?3 AND trglang = ?4",
          rusqlite::params![
            meta.corpus,
            meta.version,
            meta.srclang,
            meta.trglang
          ],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(CorpusId(id))
  }

  async fn find_corpus(
    &self,
    corpus: &str,
    version: &str,
    srclang: &str,
    trglang: &str,
  ) -> Result<Option<CorpusId>> {
    let key = [
      corpus.to_owned(),
      version.to_owned(),
      srclang.to_owned(),
      trglang.to_owned(),
    ];

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT corpusID FROM corpora
               WHERE corpus = ?1 AND version = ?2
                 AND srclang = ?3 AND trglang = ?4",
              rusqlite::params_from_iter(key),
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(id.map(CorpusId))
  }

  async fn ensure_bitext(&mut self, key: &BitextKey) -> Result<BitextId> {
    let key = key.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO bitexts (corpus, version, fromDoc, toDoc)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![key.corpus, key.version, key.from_doc, key.to_doc],
        )?;
        let id = conn.query_row(
          "SELECT bitextID FROM bitexts
           WHERE corpus = ?1 AND version = ?2
             AND fromDoc = ?3 AND toDoc = ?4",
          rusqlite::params![key.corpus, key.version, key.from_doc, key.to_doc],
          |row| row.get(0),
        )?;
        Ok(id)
      })
      .await?;

    Ok(BitextId(id))
  }

  async fn push_link(
    &mut self,
    link: LinkRecord,
    corpus: Option<CorpusId>,
  ) -> Result<()> {
    self.buffered_rows +=
      1 + link.src_sentences.len() + link.trg_sentences.len();
    self.pending.push(PendingLink { link, corpus });

    if self.buffered_rows >= self.opts.batch_size {
      self.flush().await?;
    }
    Ok(())
  }

  async fn flush(&mut self) -> Result<()> {
    if self.pending.is_empty() {
      return Ok(());
    }
    let batch = std::mem::take(&mut self.pending);
    debug!(rows = self.buffered_rows, links = batch.len(), "flushing link buffer");
    self.buffered_rows = 0;
    let include_corpus_id = self.opts.include_corpus_id;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut insert_link = tx.prepare_cached(
            "INSERT OR IGNORE INTO links
               (bitextID, srcIDs, trgIDs, srcSentIDs, trgSentIDs,
                alignType, alignerScore, cleanerScore)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          // The unique (bitextID, srcIDs, trgIDs) key resolves the actual
          // linkID, so a rerun attaches projection rows to the link row
          // committed by the first run.
          let mut find_link = tx.prepare_cached(
            "SELECT linkID FROM links
             WHERE bitextID = ?1 AND srcIDs = ?2 AND trgIDs = ?3",
          )?;
          let mut insert_src = tx.prepare_cached(
            "INSERT OR IGNORE INTO linkedsource
               (sentID, linkID, bitextID, corpusID)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          let mut insert_trg = tx.prepare_cached(
            "INSERT OR IGNORE INTO linkedtarget
               (sentID, linkID, bitextID, corpusID)
             VALUES (?1, ?2, ?3, ?4)",
          )?;

          for PendingLink { link, corpus } in &batch {
            let src_ids = encode_group(&link.src_ids);
            let trg_ids = encode_group(&link.trg_ids);
            let bitext_id = link.bitext_id.0;
            let corpus_id =
              if include_corpus_id { corpus.map(|c| c.0) } else { None };

            insert_link.execute(rusqlite::params![
              bitext_id,
              src_ids,
              trg_ids,
              encode_sentences(&link.src_sentences),
              encode_sentences(&link.trg_sentences),
              link.align_type.to_string(),
              link.aligner_score,
              link.cleaner_score,
            ])?;
            let link_id: i64 = find_link.query_row(
              rusqlite::params![bitext_id, src_ids, trg_ids],
              |row| row.get(0),
            )?;

            for sent in &link.src_sentences {
              insert_src.execute(rusqlite::params![
                sent.0, link_id, bitext_id, corpus_id
              ])?;
            }
            for sent in &link.trg_sentences {
              insert_trg.execute(rusqlite::params![
                sent.0, link_id, bitext_id, corpus_id
              ])?;
            }
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn commit_bitext(&mut self, id: BitextId) -> Result<Option<LinkRange>> {
    self.flush().await?;

    let range = self
      .range_query(
        "SELECT MIN(rowid), MAX(rowid) FROM links WHERE bitextID = ?1",
        vec![rusqlite::types::Value::Integer(id.0)],
      )
      .await?;

    if let (Some(range), true) = (range, self.opts.track_bitext_range) {
      let bitext_id = id.0;
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO bitext_range (bitextID, start, \"end\")
             VALUES (?1, ?2, ?3)
             ON CONFLICT(bitextID)
             DO UPDATE SET start = excluded.start, \"end\" = excluded.\"end\"",
            rusqlite::params![bitext_id, range.start, range.end],
          )?;
          Ok(())
        })
        .await?;
    }

    Ok(range)
  }

  async fn drop_bitext(&mut self, id: BitextId) -> Result<()> {
    let bitext_id = id.0;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM bitexts WHERE bitextID = ?1",
          rusqlite::params![bitext_id],
        )?;
        conn.execute(
          "DELETE FROM bitext_range WHERE bitextID = ?1",
          rusqlite::params![bitext_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn commit_corpus(
    &mut self,
    id: CorpusId,
    selector: &CorpusSelector,
  ) -> Result<Option<LinkRange>> {
    self.flush().await?;

    let range = match &selector.doc_langs {
      Some((srclang, trglang)) => {
        self
          .range_query(
            "SELECT MIN(rowid), MAX(rowid) FROM links
             WHERE bitextID IN
               (SELECT bitextID FROM bitexts
                WHERE corpus = ?1 AND version = ?2
                  AND fromDoc LIKE ?3 AND toDoc LIKE ?4)",
            vec![
              rusqlite::types::Value::Text(selector.corpus.clone()),
              rusqlite::types::Value::Text(selector.version.clone()),
              rusqlite::types::Value::Text(format!("{srclang}/%")),
              rusqlite::types::Value::Text(format!("{trglang}/%")),
            ],
          )
          .await?
      }
      None => {
        self
          .range_query(
            "SELECT MIN(rowid), MAX(rowid) FROM links
             WHERE bitextID IN
               (SELECT bitextID FROM bitexts
                WHERE corpus = ?1 AND version = ?2)",
            vec![
              rusqlite::types::Value::Text(selector.corpus.clone()),
              rusqlite::types::Value::Text(selector.version.clone()),
            ],
          )
          .await?
      }
    };

    if let Some(range) = range {
      let corpus_id = id.0;
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO corpus_range (corpusID, start, \"end\")
             VALUES (?1, ?2, ?3)
             ON CONFLICT(corpusID)
             DO UPDATE SET start = excluded.start, \"end\" = excluded.\"end\"",
            rusqlite::params![corpus_id, range.start, range.end],
          )?;
          Ok(())
        })
        .await?;
    }

    Ok(range)
  }

  async fn drop_corpus(&mut self, id: CorpusId) -> Result<()> {
    let corpus_id = id.0;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM corpora WHERE corpusID = ?1",
          rusqlite::params![corpus_id],
        )?;
        conn.execute(
          "DELETE FROM corpus_range WHERE corpusID = ?1",
          rusqlite::params![corpus_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn has_lang_pair(&self, pair_code: &str) -> Result<bool> {
    let pair_code = pair_code.to_owned();
    let found: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM langpairs WHERE langpair = ?1",
              rusqlite::params![pair_code],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn add_lang_pair(&mut self, pair_code: &str) -> Result<()> {
    let pair_code = pair_code.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO langpairs (langpair) VALUES (?1)",
          rusqlite::params![pair_code],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── LinkSource impl ─────────────────────────────────────────────────────────

impl LinkSource for LinkDb {
  type Error = Error;

  async fn bitexts(&self) -> Result<Vec<Bitext>> {
    let rows: Vec<(i64, String, String, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT bitextID, corpus, version, fromDoc, toDoc
           FROM bitexts ORDER BY bitextID",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              row.get(0)?,
              row.get(1)?,
              row.get(2)?,
              row.get(3)?,
              row.get(4)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(id, corpus, version, from_doc, to_doc)| Bitext {
          id:  BitextId(id),
          key: BitextKey { corpus, version, from_doc, to_doc },
        })
        .collect(),
    )
  }

  async fn links(&self, bitext: BitextId) -> Result<Vec<StoredLink>> {
    let bitext_id = bitext.0;
    let raws: Vec<RawLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT linkID, bitextID, srcIDs, trgIDs, srcSentIDs, trgSentIDs,
                  alignType, alignerScore, cleanerScore
           FROM links WHERE bitextID = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![bitext_id], |row| {
            Ok(RawLink {
              link_id:       row.get(0)?,
              bitext_id:     row.get(1)?,
              src_ids:       row.get(2)?,
              trg_ids:       row.get(3)?,
              src_sent_ids:  row.get(4)?,
              trg_sent_ids:  row.get(5)?,
              align_type:    row.get(6)?,
              aligner_score: row.get(7)?,
              cleaner_score: row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLink::into_stored).collect()
  }

  async fn releases(&self) -> Result<Vec<CorpusRelease>> {
    let rows: Vec<(i64, String, String, String, String, String, String, i64)> =
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT corpusID, corpus, version, srclang, trglang,
                    srclang3, trglang3, latest
             FROM corpora ORDER BY corpusID",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
              ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

    Ok(
      rows
        .into_iter()
        .map(
          |(id, corpus, version, srclang, trglang, srclang3, trglang3, latest)| {
            CorpusRelease {
              id:   CorpusId(id),
              meta: CorpusMeta {
                corpus,
                version,
                srclang,
                trglang,
                srclang3,
                trglang3,
                latest: latest != 0,
              },
            }
          },
        )
        .collect(),
    )
  }

  async fn lang_pairs(&self) -> Result<Vec<String>> {
    let pairs = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT langpair FROM langpairs ORDER BY langpair")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(pairs)
  }

  async fn bitext_ranges(&self) -> Result<Vec<ScopedRange>> {
    let rows: Vec<(String, Option<i64>, Option<i64>)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          // Comma between the documents: paths routinely contain '-', so
          // a dash would make the label ambiguous.
          "SELECT b.corpus || '/' || b.version || '/'
                    || b.fromDoc || ',' || b.toDoc,
                  r.start, r.\"end\"
           FROM bitext_range r
           JOIN bitexts b ON b.bitextID = r.bitextID
           ORDER BY r.bitextID",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .filter_map(|(scope, start, end)| {
          LinkRange::from_bounds(start, end)
            .map(|range| ScopedRange { scope, range })
        })
        .collect(),
    )
  }

  async fn corpus_ranges(&self) -> Result<Vec<ScopedRange>> {
    let rows: Vec<(String, Option<i64>, Option<i64>)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT c.corpus || '/' || c.version || '/'
                    || c.srclang || '-' || c.trglang,
                  r.start, r.\"end\"
           FROM corpus_range r
           JOIN corpora c ON c.corpusID = r.corpusID
           ORDER BY r.corpusID",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .filter_map(|(scope, start, end)| {
          LinkRange::from_bounds(start, end)
            .map(|range| ScopedRange { scope, range })
        })
        .collect(),
    )
  }
}
