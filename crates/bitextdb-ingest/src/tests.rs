//! End-to-end pipeline tests over in-memory SQLite stores.

use bitextdb_core::{
  corpus::{CorpusMeta, LangPair},
  record::AlignmentRecord,
  store::{LinkSource, LinkStore, StoreOptions},
};
use bitextdb_store_sqlite::{LinkDb, SentenceDb};

use crate::{Ingester, merge_lang_pair, recompute_corpus_ranges};

const CORPUS: &str = "books";
const VERSION: &str = "v1";

fn meta() -> CorpusMeta {
  CorpusMeta {
    corpus:   CORPUS.into(),
    version:  VERSION.into(),
    srclang:  "en".into(),
    trglang:  "de".into(),
    srclang3: "eng".into(),
    trglang3: "deu".into(),
    latest:   true,
  }
}

/// Build a sentence index holding the given documents, each with local IDs
/// `s1..=sN`.
async fn index_of(documents: &[(&str, usize)]) -> SentenceDb {
  let mut db = SentenceDb::open_in_memory().await.unwrap();
  for (document, sentences) in documents {
    let doc = db.add_document(CORPUS, VERSION, document).await.unwrap();
    for n in 1..=*sentences {
      db.index_sentence(doc, &format!("s{n}"), &format!("{document} #{n}"))
        .await
        .unwrap();
    }
  }
  db.flush().await.unwrap();
  db
}

fn record(
  from_doc: &str,
  to_doc: &str,
  src: &[&str],
  trg: &[&str],
) -> AlignmentRecord {
  AlignmentRecord {
    corpus:        CORPUS.into(),
    version:       VERSION.into(),
    from_doc:      from_doc.into(),
    to_doc:        to_doc.into(),
    src_ids:       src.iter().map(|s| (*s).to_owned()).collect(),
    trg_ids:       trg.iter().map(|s| (*s).to_owned()).collect(),
    align_type:    None,
    aligner_score: None,
    cleaner_score: None,
  }
}

async fn run(
  src_index: &SentenceDb,
  trg_index: &SentenceDb,
  store: &mut LinkDb,
  records: &[AlignmentRecord],
) -> crate::IngestSummary {
  let mut ingester =
    Ingester::new(src_index, trg_index, store, meta()).await.unwrap();
  for record in records {
    ingester.ingest(record.clone()).await.unwrap();
  }
  ingester.finish().await.unwrap()
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_run_commits_links_and_ranges() {
  let src = index_of(&[("en/a.xml", 3)]).await;
  let trg = index_of(&[("de/a.xml", 3)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let summary = run(&src, &trg, &mut store, &[
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
    record("en/a.xml", "de/a.xml", &["s2", "s3"], &["s2"]),
  ])
  .await;

  assert_eq!(summary.accepted, 2);
  assert_eq!(summary.bitexts_committed, 1);
  assert_eq!(summary.bitexts_dropped, 0);
  assert!(summary.overlaps.is_empty());

  let bitexts = store.bitexts().await.unwrap();
  assert_eq!(bitexts.len(), 1);
  let links = store.links(bitexts[0].id).await.unwrap();
  assert_eq!(links.len(), 2);
  assert_eq!(links[1].link.align_type.to_string(), "2-1");
  assert_eq!(links[1].link.src_sentences.len(), 2);

  assert_eq!(store.bitext_ranges().await.unwrap().len(), 1);
  let corpus_ranges = store.corpus_ranges().await.unwrap();
  assert_eq!(corpus_ranges.len(), 1);
  assert_eq!(corpus_ranges[0].scope, "books/v1/en-de");
}

#[tokio::test]
async fn rerun_converges_to_the_same_state() {
  let src = index_of(&[("en/a.xml", 2)]).await;
  let trg = index_of(&[("de/a.xml", 2)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let records = [
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
    record("en/a.xml", "de/a.xml", &["s2"], &["s2"]),
  ];
  run(&src, &trg, &mut store, &records).await;
  let first_links =
    store.links(store.bitexts().await.unwrap()[0].id).await.unwrap();

  let summary = run(&src, &trg, &mut store, &records).await;
  assert_eq!(summary.accepted, 2);
  assert!(summary.overlaps.is_empty());

  let bitexts = store.bitexts().await.unwrap();
  assert_eq!(bitexts.len(), 1);
  assert_eq!(store.links(bitexts[0].id).await.unwrap(), first_links);
  assert_eq!(store.bitext_ranges().await.unwrap().len(), 1);
  assert_eq!(store.corpus_ranges().await.unwrap().len(), 1);
}

#[tokio::test]
async fn partially_resolvable_records_are_dropped_whole() {
  let src = index_of(&[("en/a.xml", 1)]).await;
  let trg = index_of(&[("de/a.xml", 1)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let summary = run(&src, &trg, &mut store, &[
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
    // s9 is unknown on the source side.
    record("en/a.xml", "de/a.xml", &["s1", "s9"], &["s1"]),
  ])
  .await;

  assert_eq!(summary.accepted, 1);
  assert_eq!(summary.dropped_unresolved, 1);
  let links =
    store.links(store.bitexts().await.unwrap()[0].id).await.unwrap();
  assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn empty_groups_are_accepted() {
  let src = index_of(&[("en/a.xml", 1)]).await;
  let trg = index_of(&[("de/a.xml", 1)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let summary = run(&src, &trg, &mut store, &[record(
    "en/a.xml",
    "de/a.xml",
    &[],
    &["s1"],
  )])
  .await;

  assert_eq!(summary.accepted, 1);
  let links =
    store.links(store.bitexts().await.unwrap()[0].id).await.unwrap();
  assert_eq!(links[0].link.align_type.to_string(), "0-1");
  assert!(links[0].link.src_sentences.is_empty());
}

#[tokio::test]
async fn malformed_alignment_tags_drop_the_record() {
  let src = index_of(&[("en/a.xml", 1)]).await;
  let trg = index_of(&[("de/a.xml", 1)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let mut bad = record("en/a.xml", "de/a.xml", &["s1"], &["s1"]);
  bad.align_type = Some("1:1".into());
  let good = record("en/a.xml", "de/a.xml", &["s1"], &["s1"]);

  let summary = run(&src, &trg, &mut store, &[bad, good]).await;
  assert_eq!(summary.dropped_malformed, 1);
  assert_eq!(summary.accepted, 1);
}

#[tokio::test]
async fn foreign_records_are_skipped() {
  let src = index_of(&[("en/a.xml", 1)]).await;
  let trg = index_of(&[("de/a.xml", 1)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let mut foreign = record("en/a.xml", "de/a.xml", &["s1"], &["s1"]);
  foreign.version = "v2".into();

  let summary = run(&src, &trg, &mut store, &[
    foreign,
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
  ])
  .await;
  assert_eq!(summary.skipped_foreign, 1);
  assert_eq!(summary.accepted, 1);
}

#[tokio::test]
async fn fruitless_run_leaves_no_trace() {
  let src = index_of(&[]).await;
  let trg = index_of(&[]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  // Neither document is in any index, so nothing resolves.
  let summary = run(&src, &trg, &mut store, &[record(
    "en/a.xml",
    "de/a.xml",
    &["s1"],
    &["s1"],
  )])
  .await;

  assert_eq!(summary.accepted, 0);
  assert_eq!(summary.dropped_unresolved, 1);
  assert_eq!(summary.bitexts_dropped, 1);
  assert!(store.bitexts().await.unwrap().is_empty());
  assert!(store.releases().await.unwrap().is_empty());
  assert!(store.corpus_ranges().await.unwrap().is_empty());
}

#[tokio::test]
async fn bitext_boundary_detected_on_document_change() {
  let src = index_of(&[("en/a.xml", 1), ("en/b.xml", 1)]).await;
  let trg = index_of(&[("de/a.xml", 1), ("de/b.xml", 1)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let summary = run(&src, &trg, &mut store, &[
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
    record("en/b.xml", "de/b.xml", &["s1"], &["s1"]),
  ])
  .await;

  assert_eq!(summary.bitexts_committed, 2);
  assert_eq!(store.bitext_ranges().await.unwrap().len(), 2);
}

// ─── Merging ─────────────────────────────────────────────────────────────────

async fn ingested_pair_store() -> LinkDb {
  let src = index_of(&[("en/a.xml", 3)]).await;
  let trg = index_of(&[("de/a.xml", 3)]).await;
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();
  run(&src, &trg, &mut store, &[
    record("en/a.xml", "de/a.xml", &["s1"], &["s1"]),
    record("en/a.xml", "de/a.xml", &["s2", "s3"], &["s2"]),
  ])
  .await;
  store
}

#[tokio::test]
async fn merge_reverses_into_canonical_order() {
  let source = ingested_pair_store().await;
  let mut dest = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  // eng-deu canonicalises to deu-eng, so the direction flips.
  let summary = merge_lang_pair(
    &source,
    &mut dest,
    &LangPair::new("en", "de"),
    &LangPair::new("eng", "deu"),
  )
  .await
  .unwrap();

  assert!(summary.reversed);
  assert!(!summary.skipped);
  assert_eq!(summary.links_copied, 2);
  assert_eq!(summary.bitexts, 1);

  let bitexts = dest.bitexts().await.unwrap();
  assert_eq!(bitexts[0].key.from_doc, "de/a.xml");
  assert_eq!(bitexts[0].key.to_doc, "en/a.xml");

  let links = dest.links(bitexts[0].id).await.unwrap();
  assert_eq!(links[1].link.align_type.to_string(), "1-2");
  assert_eq!(links[1].link.trg_sentences.len(), 2);

  let releases = dest.releases().await.unwrap();
  assert_eq!(releases.len(), 1);
  assert_eq!(releases[0].meta.srclang, "deu");
  assert_eq!(releases[0].meta.trglang, "eng");

  let corpus_ranges = dest.corpus_ranges().await.unwrap();
  assert_eq!(corpus_ranges.len(), 1);
  assert_eq!(corpus_ranges[0].scope, "books/v1/deu-eng");

  assert_eq!(dest.lang_pairs().await.unwrap(), vec!["en-de".to_owned()]);
}

#[tokio::test]
async fn merge_is_a_no_op_for_an_already_canonical_pair() {
  let source = ingested_pair_store().await;
  let mut dest = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  // deu-eng is already in canonical order, so the store would be merging
  // onto itself.
  let pair = LangPair::new("deu", "eng");
  let summary =
    merge_lang_pair(&source, &mut dest, &pair, &pair).await.unwrap();

  assert!(summary.skipped);
  assert_eq!(summary.links_copied, 0);
  assert!(dest.bitexts().await.unwrap().is_empty());
  assert!(dest.lang_pairs().await.unwrap().is_empty());
}

#[tokio::test]
async fn merge_skips_pairs_already_recorded() {
  let source = ingested_pair_store().await;
  let mut dest = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();

  let en_de = LangPair::new("en", "de");
  let eng_deu = LangPair::new("eng", "deu");
  merge_lang_pair(&source, &mut dest, &en_de, &eng_deu).await.unwrap();
  let again =
    merge_lang_pair(&source, &mut dest, &en_de, &eng_deu).await.unwrap();

  assert!(again.skipped);
  assert_eq!(again.links_copied, 0);
  let bitexts = dest.bitexts().await.unwrap();
  assert_eq!(dest.links(bitexts[0].id).await.unwrap().len(), 2);
}

// ─── Range maintenance ───────────────────────────────────────────────────────

#[tokio::test]
async fn recompute_fills_in_missing_corpus_ranges() {
  use bitextdb_core::{
    corpus::BitextKey, id::SentenceId, record::LinkRecord,
  };

  // A store written without corpus-range maintenance, as an interrupted
  // run would leave it.
  let mut store = LinkDb::open_in_memory(StoreOptions::default())
    .await
    .unwrap();
  let corpus = store.ensure_corpus(&meta()).await.unwrap();
  let bitext = store
    .ensure_bitext(&BitextKey {
      corpus:   CORPUS.into(),
      version:  VERSION.into(),
      from_doc: "en/a.xml".into(),
      to_doc:   "de/a.xml".into(),
    })
    .await
    .unwrap();
  store
    .push_link(
      LinkRecord {
        bitext_id:     bitext,
        src_ids:       vec!["s1".into()],
        trg_ids:       vec!["s1".into()],
        src_sentences: vec![SentenceId(1)],
        trg_sentences: vec![SentenceId(11)],
        align_type:    "1-1".parse().unwrap(),
        aligner_score: None,
        cleaner_score: None,
      },
      Some(corpus),
    )
    .await
    .unwrap();
  store.commit_bitext(bitext).await.unwrap();
  assert!(store.corpus_ranges().await.unwrap().is_empty());

  let overlaps = recompute_corpus_ranges(&mut store).await.unwrap();
  assert!(overlaps.is_empty());
  let ranges = store.corpus_ranges().await.unwrap();
  assert_eq!(ranges.len(), 1);
  assert_eq!(ranges[0].scope, "books/v1/en-de");
}
