//! [`Ingester`] — drives one corpus release's alignment records into a
//! link store.

use bitextdb_core::{
  align::AlignType,
  corpus::{BitextKey, CorpusMeta},
  id::{BitextId, CorpusId, DocumentId, SentenceId},
  record::{AlignmentRecord, LinkRecord},
  store::{LinkSource, LinkStore, SentenceIndex},
};
use tracing::{debug, info, warn};

use crate::{Error, IngestSummary, Result, validate::check_ranges};

// ─── Ingester ────────────────────────────────────────────────────────────────

/// Streaming ingestion of one corpus release.
///
/// Records arrive grouped by document pair; a change of document pair
/// finishes the current bitext (committing or rolling it back) before the
/// next one starts. The sentence indexes are read-only collaborators; the
/// ingester is the single writer of its link store for the duration of the
/// run.
pub struct Ingester<'a, I, L> {
  src_index: &'a I,
  trg_index: &'a I,
  store:     &'a mut L,
  meta:      CorpusMeta,
  corpus:    CorpusId,
  session:   Option<Session>,
  summary:   IngestSummary,
}

/// State of the bitext currently being ingested.
struct Session {
  key:      BitextKey,
  id:       BitextId,
  from_doc: Option<DocumentId>,
  to_doc:   Option<DocumentId>,
  accepted: u64,
}

impl<'a, I, L> Ingester<'a, I, L>
where
  I: SentenceIndex,
  L: LinkStore,
{
  /// Start an ingestion run: registers the corpus release (promoting it to
  /// latest if `meta` says so) and returns the ingester.
  pub async fn new(
    src_index: &'a I,
    trg_index: &'a I,
    store: &'a mut L,
    meta: CorpusMeta,
  ) -> Result<Self> {
    let corpus = store.ensure_corpus(&meta).await.map_err(Error::store)?;
    info!(corpus = %meta, "ingesting corpus release");
    Ok(Self {
      src_index,
      trg_index,
      store,
      meta,
      corpus,
      session: None,
      summary: IngestSummary::default(),
    })
  }

  /// Feed one raw alignment record.
  ///
  /// A record is persisted only when every non-empty local ID on both sides
  /// resolves against the sentence indexes; anything less is counted and
  /// dropped, never partially stored.
  pub async fn ingest(&mut self, record: AlignmentRecord) -> Result<()> {
    if record.corpus != self.meta.corpus
      || record.version != self.meta.version
    {
      self.summary.skipped_foreign += 1;
      return Ok(());
    }

    let (bitext, from_doc, to_doc) = match &self.session {
      Some(s)
        if s.key.from_doc == record.from_doc
          && s.key.to_doc == record.to_doc =>
      {
        (s.id, s.from_doc, s.to_doc)
      }
      _ => {
        self.finish_bitext().await?;
        self.begin_bitext(&record).await?
      }
    };

    // An explicit tag that does not parse makes the whole record
    // malformed; a missing tag is derived from the group sizes as given.
    let align_type = match &record.align_type {
      Some(tag) => match tag.parse::<AlignType>() {
        Ok(align_type) => align_type,
        Err(_) => {
          warn!(tag = %tag, "unparseable alignment type; dropping record");
          self.summary.dropped_malformed += 1;
          return Ok(());
        }
      },
      None => {
        AlignType::of_groups(record.src_ids.len(), record.trg_ids.len())
      }
    };

    let src_ids = clean_group(&record.src_ids);
    let trg_ids = clean_group(&record.trg_ids);

    let src = resolve_group(self.src_index, from_doc, &src_ids).await?;
    let trg = resolve_group(self.trg_index, to_doc, &trg_ids).await?;
    let (Some(src_sentences), Some(trg_sentences)) = (src, trg) else {
      self.summary.dropped_unresolved += 1;
      return Ok(());
    };

    self
      .store
      .push_link(
        LinkRecord {
          bitext_id: bitext,
          src_ids,
          trg_ids,
          src_sentences,
          trg_sentences,
          align_type,
          aligner_score: record.aligner_score,
          cleaner_score: record.cleaner_score,
        },
        Some(self.corpus),
      )
      .await
      .map_err(Error::store)?;

    if let Some(session) = self.session.as_mut() {
      session.accepted += 1;
    }
    self.summary.accepted += 1;
    Ok(())
  }

  /// Count a record that could not even be parsed into an
  /// [`AlignmentRecord`].
  pub fn note_malformed(&mut self) {
    self.summary.dropped_malformed += 1;
  }

  async fn begin_bitext(
    &mut self,
    record: &AlignmentRecord,
  ) -> Result<(BitextId, Option<DocumentId>, Option<DocumentId>)> {
    let key = BitextKey {
      corpus:   self.meta.corpus.clone(),
      version:  self.meta.version.clone(),
      from_doc: record.from_doc.clone(),
      to_doc:   record.to_doc.clone(),
    };
    let id = self.store.ensure_bitext(&key).await.map_err(Error::store)?;

    let from_doc = self
      .src_index
      .document_id(&key.corpus, &key.version, &key.from_doc)
      .await
      .map_err(Error::index)?;
    let to_doc = self
      .trg_index
      .document_id(&key.corpus, &key.version, &key.to_doc)
      .await
      .map_err(Error::index)?;
    if from_doc.is_none() || to_doc.is_none() {
      // Every record of this bitext will fail resolution; the bitext row
      // gets rolled back when it finishes.
      warn!(bitext = %key, "document pair missing from sentence index");
    }
    debug!(bitext = %key, "starting bitext");

    self.session = Some(Session { key, id, from_doc, to_doc, accepted: 0 });
    Ok((id, from_doc, to_doc))
  }

  async fn finish_bitext(&mut self) -> Result<()> {
    let Some(session) = self.session.take() else {
      return Ok(());
    };
    if session.accepted > 0 {
      let range =
        self.store.commit_bitext(session.id).await.map_err(Error::store)?;
      self.summary.bitexts_committed += 1;
      debug!(
        bitext = %session.key,
        links = session.accepted,
        ?range,
        "committed bitext"
      );
    } else {
      self.store.drop_bitext(session.id).await.map_err(Error::store)?;
      self.summary.bitexts_dropped += 1;
      debug!(bitext = %session.key, "rolled back empty bitext");
    }
    Ok(())
  }
}

impl<I, L> Ingester<'_, I, L>
where
  I: SentenceIndex,
  L: LinkStore + LinkSource,
{
  /// Finish the run: close the last bitext, commit or roll back the corpus
  /// release, and validate the range tables.
  pub async fn finish(mut self) -> Result<IngestSummary> {
    self.finish_bitext().await?;

    if self.summary.accepted > 0 {
      let range = self
        .store
        .commit_corpus(self.corpus, &self.meta.selector())
        .await
        .map_err(Error::store)?;
      info!(
        corpus = %self.meta,
        accepted = self.summary.accepted,
        ?range,
        "corpus release committed"
      );
    } else {
      self.store.drop_corpus(self.corpus).await.map_err(Error::store)?;
      info!(corpus = %self.meta, "corpus release produced no links; rolled back");
    }

    self.summary.overlaps = check_ranges(&*self.store).await?;
    for overlap in &self.summary.overlaps {
      warn!(%overlap, "range overlap detected");
    }
    Ok(self.summary)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Drop empty tokens; an empty group is a valid side of a `0-1`/`1-0` link.
fn clean_group(ids: &[String]) -> Vec<String> {
  ids
    .iter()
    .map(|id| id.trim())
    .filter(|id| !id.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Resolve every local ID of one group, or `None` if any fails. The empty
/// group resolves vacuously even when the document itself is unknown.
async fn resolve_group<I: SentenceIndex>(
  index: &I,
  document: Option<DocumentId>,
  ids: &[String],
) -> Result<Option<Vec<SentenceId>>> {
  if ids.is_empty() {
    return Ok(Some(Vec::new()));
  }
  let Some(document) = document else {
    return Ok(None);
  };

  let mut sentences = Vec::with_capacity(ids.len());
  for id in ids {
    match index.resolve(document, id).await.map_err(Error::index)? {
      Some(sentence) => sentences.push(sentence),
      None => return Ok(None),
    }
  }
  Ok(Some(sentences))
}
