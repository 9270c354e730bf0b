//! `bitextdb` — build and maintain sentence-alignment link databases.
//!
//! # Usage
//!
//! ```
//! bitextdb index --db en.db --corpus books --version v1 sentences.jsonl
//! bitextdb ingest --links-db en-de.db --src-index en.db --trg-index de.db \
//!     --corpus books --version v1 --srclang en --trglang de links.jsonl
//! bitextdb merge --source en-de.db --dest deu-eng.db \
//!     --pair en-de --as-pair eng-deu
//! bitextdb check-ranges --db en-de.db
//! bitextdb corpus-ranges --db en-de.db
//! ```
//!
//! `index` and `ingest` read JSON Lines from the given file, or stdin when
//! the file argument is omitted.

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use bitextdb_core::{
  corpus::{CorpusMeta, LangPair},
  record::AlignmentRecord,
  store::{DEFAULT_BATCH_SIZE, StoreOptions},
};
use bitextdb_ingest::{
  Ingester, check_ranges, merge_lang_pair, recompute_corpus_ranges,
};
use bitextdb_store_sqlite::{LinkDb, SentenceDb};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  name = "bitextdb",
  about = "Build and maintain sentence-alignment link databases"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build a per-language sentence index from JSONL sentence records.
  Index {
    /// Sentence index database to create or extend.
    #[arg(long)]
    db: PathBuf,

    #[arg(long)]
    corpus: String,

    #[arg(long)]
    version: String,

    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
  },

  /// Ingest alignment records for one corpus release into a link database.
  Ingest {
    /// Link database to create or extend.
    #[arg(long)]
    links_db: PathBuf,

    /// Source-language sentence index (opened as an immutable snapshot).
    #[arg(long)]
    src_index: PathBuf,

    /// Target-language sentence index (opened as an immutable snapshot).
    #[arg(long)]
    trg_index: PathBuf,

    #[arg(long)]
    corpus: String,

    #[arg(long)]
    version: String,

    #[arg(long)]
    srclang: String,

    #[arg(long)]
    trglang: String,

    /// ISO-639-3 source code; defaults to --srclang.
    #[arg(long)]
    srclang3: Option<String>,

    /// ISO-639-3 target code; defaults to --trglang.
    #[arg(long)]
    trglang3: Option<String>,

    /// Mark this release as the latest of its corpus and language pair.
    #[arg(long)]
    latest: bool,

    /// Omit the corpus-ID column on projection rows.
    #[arg(long)]
    no_corpus_id: bool,

    /// Skip maintaining the per-bitext range table.
    #[arg(long)]
    no_bitext_range: bool,

    /// Buffered rows per write transaction.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
  },

  /// Merge a per-language-pair link database into a macro-language one.
  Merge {
    /// Source link database (opened as an immutable snapshot).
    #[arg(long)]
    source: PathBuf,

    /// Destination link database.
    #[arg(long)]
    dest: PathBuf,

    /// Original pair code of the source database, e.g. `en-de`.
    #[arg(long)]
    pair: String,

    /// Macro-language pair to merge as, e.g. `eng-deu`; canonicalised to
    /// lexicographic order, reversing link directions when necessary.
    #[arg(long = "as-pair")]
    as_pair: String,
  },

  /// Report overlapping bitext or corpus ranges in a link database.
  CheckRanges {
    #[arg(long)]
    db: PathBuf,
  },

  /// Recompute all corpus ranges from the link table, then validate.
  CorpusRanges {
    #[arg(long)]
    db: PathBuf,
  },
}

// ─── Input records ───────────────────────────────────────────────────────────

/// Shape of one `index` input line.
#[derive(Deserialize)]
struct SentenceLine {
  document: String,
  id:       String,
  text:     String,
}

fn open_input(path: Option<PathBuf>) -> anyhow::Result<Box<dyn BufRead>> {
  match path {
    Some(path) => {
      let file = File::open(&path)
        .with_context(|| format!("opening input file {}", path.display()))?;
      Ok(Box::new(BufReader::new(file)))
    }
    None => Ok(Box::new(BufReader::new(std::io::stdin()))),
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match Cli::parse().command {
    Command::Index { db, corpus, version, input } => {
      build_index(db, &corpus, &version, input).await
    }
    Command::Ingest {
      links_db,
      src_index,
      trg_index,
      corpus,
      version,
      srclang,
      trglang,
      srclang3,
      trglang3,
      latest,
      no_corpus_id,
      no_bitext_range,
      batch_size,
      input,
    } => {
      let meta = CorpusMeta {
        corpus,
        version,
        srclang3: srclang3.unwrap_or_else(|| srclang.clone()),
        trglang3: trglang3.unwrap_or_else(|| trglang.clone()),
        srclang,
        trglang,
        latest,
      };
      let opts = StoreOptions {
        include_corpus_id:  !no_corpus_id,
        track_bitext_range: !no_bitext_range,
        batch_size,
      };
      ingest(links_db, src_index, trg_index, meta, opts, input).await
    }
    Command::Merge { source, dest, pair, as_pair } => {
      merge(source, dest, &pair, &as_pair).await
    }
    Command::CheckRanges { db } => {
      let store = LinkDb::open_snapshot(&db).await?;
      let overlaps = check_ranges(&store).await?;
      for overlap in &overlaps {
        println!("{overlap}");
      }
      if overlaps.is_empty() {
        println!("no overlapping ranges");
      }
      Ok(())
    }
    Command::CorpusRanges { db } => {
      let mut store =
        LinkDb::open(&db, StoreOptions::default()).await?;
      let overlaps = recompute_corpus_ranges(&mut store).await?;
      for overlap in &overlaps {
        println!("{overlap}");
      }
      Ok(())
    }
  }
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

async fn build_index(
  db: PathBuf,
  corpus: &str,
  version: &str,
  input: Option<PathBuf>,
) -> anyhow::Result<()> {
  let mut store = SentenceDb::open(&db).await?;
  let input = open_input(input)?;

  let mut document = None;
  let mut current = String::new();
  let mut indexed = 0u64;
  let mut malformed = 0u64;

  for line in input.lines() {
    let line = line.context("reading input")?;
    if line.trim().is_empty() {
      continue;
    }
    let record: SentenceLine = match serde_json::from_str(&line) {
      Ok(record) => record,
      Err(err) => {
        warn!(%err, "skipping malformed sentence record");
        malformed += 1;
        continue;
      }
    };

    // Input arrives grouped by document.
    if document.is_none() || current != record.document {
      document =
        Some(store.add_document(corpus, version, &record.document).await?);
      current = record.document.clone();
    }
    if let Some(doc) = document {
      store.index_sentence(doc, &record.id, &record.text).await?;
      indexed += 1;
    }
  }
  store.flush().await?;

  println!(
    "{}",
    serde_json::json!({ "indexed": indexed, "malformed": malformed })
  );
  Ok(())
}

async fn ingest(
  links_db: PathBuf,
  src_index: PathBuf,
  trg_index: PathBuf,
  meta: CorpusMeta,
  opts: StoreOptions,
  input: Option<PathBuf>,
) -> anyhow::Result<()> {
  let src_index = SentenceDb::open_snapshot(&src_index).await?;
  let trg_index = SentenceDb::open_snapshot(&trg_index).await?;
  let mut store = LinkDb::open(&links_db, opts).await?;
  let input = open_input(input)?;

  let mut ingester =
    Ingester::new(&src_index, &trg_index, &mut store, meta).await?;
  for line in input.lines() {
    let line = line.context("reading input")?;
    if line.trim().is_empty() {
      continue;
    }
    match serde_json::from_str::<AlignmentRecord>(&line) {
      Ok(record) => ingester.ingest(record).await?,
      Err(err) => {
        warn!(%err, "skipping malformed alignment record");
        ingester.note_malformed();
      }
    }
  }
  let summary = ingester.finish().await?;

  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

async fn merge(
  source: PathBuf,
  dest: PathBuf,
  pair: &str,
  as_pair: &str,
) -> anyhow::Result<()> {
  let pair = LangPair::parse(pair)?;
  let as_pair = LangPair::parse(as_pair)?;

  // The immutable snapshot open disables locking entirely, so reading and
  // writing the same file would race. Refuse before opening either handle.
  if same_database(&source, &dest) {
    println!("source and destination are the same database; nothing to be done");
    return Ok(());
  }

  let source = LinkDb::open_snapshot(&source).await?;
  let mut dest = LinkDb::open(&dest, StoreOptions::default()).await?;

  let summary = merge_lang_pair(&source, &mut dest, &pair, &as_pair).await?;
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

/// Whether two paths name the same database file. Paths that do not resolve
/// (e.g. a destination not created yet) are compared as given.
fn same_database(a: &Path, b: &Path) -> bool {
  let resolve =
    |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
  resolve(a) == resolve(b)
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::same_database;

  #[test]
  fn same_database_compares_plain_paths() {
    assert!(same_database(Path::new("links.db"), Path::new("links.db")));
    assert!(!same_database(Path::new("en-de.db"), Path::new("deu-eng.db")));
  }

  #[test]
  fn same_database_resolves_indirect_paths() {
    let dir = std::env::temp_dir();
    let file = dir.join("bitextdb-same-database-test.db");
    std::fs::write(&file, b"").unwrap();

    let indirect = dir.join(".").join("bitextdb-same-database-test.db");
    assert!(same_database(&file, &indirect));

    std::fs::remove_file(&file).ok();
  }
}
