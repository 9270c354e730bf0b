//! Structural validation of the derived range tables.

use bitextdb_core::{
  corpus::CorpusSelector,
  range::{RangeOverlap, find_overlaps},
  store::{LinkSource, LinkStore},
};
use tracing::{debug, info};

use crate::{Error, Result};

/// Scan both range families for overlapping scopes.
///
/// Bitext ranges may legitimately fall inside their corpus range, so the
/// two families are checked independently, never against each other.
/// Purely diagnostic; nothing is repaired.
pub async fn check_ranges<S: LinkSource>(
  source: &S,
) -> Result<Vec<RangeOverlap>> {
  let bitext_ranges =
    source.bitext_ranges().await.map_err(Error::store)?;
  let corpus_ranges =
    source.corpus_ranges().await.map_err(Error::store)?;
  debug!(
    bitexts = bitext_ranges.len(),
    corpora = corpus_ranges.len(),
    "checking range tables"
  );

  let mut overlaps = find_overlaps(&bitext_ranges);
  overlaps.extend(find_overlaps(&corpus_ranges));
  Ok(overlaps)
}

/// Recompute every corpus range from the link table, then validate.
///
/// Backfills stores written before corpus ranges were tracked and repairs
/// ranges left stale by an interrupted run. Merged macro-language stores
/// are recognised by their recorded pair codes; their corpora aggregate
/// over whole releases rather than by document-path language prefix.
pub async fn recompute_corpus_ranges<L>(
  store: &mut L,
) -> Result<Vec<RangeOverlap>>
where
  L: LinkStore + LinkSource,
{
  let merged = !store.lang_pairs().await.map_err(Error::store)?.is_empty();

  let releases = store.releases().await.map_err(Error::store)?;
  for release in releases {
    let selector = if merged {
      CorpusSelector {
        corpus:    release.meta.corpus.clone(),
        version:   release.meta.version.clone(),
        doc_langs: None,
      }
    } else {
      release.meta.selector()
    };
    let range = store
      .commit_corpus(release.id, &selector)
      .await
      .map_err(Error::store)?;
    info!(corpus = %release.meta, ?range, "recomputed corpus range");
  }

  check_ranges(&*store).await
}
