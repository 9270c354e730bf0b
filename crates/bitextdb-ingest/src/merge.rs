//! Folding per-language-pair stores into one macro-language store.

use std::collections::BTreeMap;

use bitextdb_core::{
  corpus::{CorpusMeta, CorpusSelector, LangPair},
  id::CorpusId,
  store::{LinkSource, LinkStore},
};
use tracing::{debug, info};

use crate::{Error, MergeSummary, Result};

/// Copy every link of `source` into `dest` under the macro-language pair
/// `macro_pair`.
///
/// The destination pair is brought into canonical order (lexicographically
/// smaller code first); when that reverses the direction, every bitext key
/// and link is swapped source-for-target on the way over. `orig_pair` is
/// the pair code the source store was built as (e.g. `en-de`); it guards
/// reruns: a pair already recorded in the destination is skipped outright,
/// and it is recorded only after the whole copy has completed, so an
/// interrupted merge is re-run from scratch and converges via
/// insert-if-absent.
pub async fn merge_lang_pair<S, D>(
  source: &S,
  dest: &mut D,
  orig_pair: &LangPair,
  macro_pair: &LangPair,
) -> Result<MergeSummary>
where
  S: LinkSource,
  D: LinkStore,
{
  let (canon, reversed) = macro_pair.canonical();
  let mut summary = MergeSummary {
    pair: orig_pair.code(),
    reversed,
    ..MergeSummary::default()
  };

  // A source already keyed by the canonical macro pair is its own merge
  // destination; copying it onto itself would race the snapshot reader.
  if orig_pair.code() == canon.code() {
    info!(pair = %orig_pair, "pair is already in canonical macro form; nothing to be done");
    summary.skipped = true;
    return Ok(summary);
  }

  if dest.has_lang_pair(&orig_pair.code()).await.map_err(Error::store)? {
    info!(pair = %orig_pair, "pair already merged; skipping");
    summary.skipped = true;
    return Ok(summary);
  }
  info!(pair = %orig_pair, as_pair = %canon, reversed, "merging language pair");

  // Register the destination corpus releases first so projection rows can
  // carry their IDs. Merged releases are keyed by the macro codes alone;
  // `latest` bookkeeping stays with the per-pair stores.
  let mut corpora: BTreeMap<(String, String), CorpusId> = BTreeMap::new();
  for release in source.releases().await.map_err(Error::store)? {
    let meta = CorpusMeta {
      corpus:   release.meta.corpus.clone(),
      version:  release.meta.version.clone(),
      srclang:  canon.src.clone(),
      trglang:  canon.trg.clone(),
      srclang3: canon.src.clone(),
      trglang3: canon.trg.clone(),
      latest:   false,
    };
    let id = dest.ensure_corpus(&meta).await.map_err(Error::store)?;
    corpora.insert((meta.corpus, meta.version), id);
  }

  for bitext in source.bitexts().await.map_err(Error::store)? {
    let links = source.links(bitext.id).await.map_err(Error::store)?;
    let key = if reversed {
      bitext.key.clone().swapped()
    } else {
      bitext.key.clone()
    };
    let corpus = corpora
      .get(&(key.corpus.clone(), key.version.clone()))
      .copied();

    let dest_bitext = dest.ensure_bitext(&key).await.map_err(Error::store)?;
    let copied = links.len() as u64;
    for stored in links {
      // Links get fresh IDs in the destination; per-pair link IDs collide
      // across merged stores.
      let mut link =
        if reversed { stored.link.swapped() } else { stored.link };
      link.bitext_id = dest_bitext;
      dest.push_link(link, corpus).await.map_err(Error::store)?;
    }

    if copied > 0 {
      dest.commit_bitext(dest_bitext).await.map_err(Error::store)?;
      summary.bitexts += 1;
      summary.links_copied += copied;
      debug!(bitext = %key, links = copied, "merged bitext");
    } else {
      dest.drop_bitext(dest_bitext).await.map_err(Error::store)?;
    }
  }

  for ((corpus, version), id) in &corpora {
    let selector = CorpusSelector {
      corpus:    corpus.clone(),
      version:   version.clone(),
      doc_langs: None,
    };
    if dest.commit_corpus(*id, &selector).await.map_err(Error::store)?.is_none()
    {
      dest.drop_corpus(*id).await.map_err(Error::store)?;
    }
  }

  dest.add_lang_pair(&orig_pair.code()).await.map_err(Error::store)?;
  info!(
    pair = %orig_pair,
    links = summary.links_copied,
    bitexts = summary.bitexts,
    "merge complete"
  );
  Ok(summary)
}
