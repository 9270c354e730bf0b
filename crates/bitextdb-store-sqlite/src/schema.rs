//! SQL schemas for the two store shapes.
//!
//! Both are idempotent thanks to `CREATE ... IF NOT EXISTS`, so opening an
//! existing database is a no-op. Table and column names are the persisted
//! interchange surface downstream tools rely on; do not rename them.

/// Sentence side: deduplicated texts plus the per-document local-ID index.
pub const SENTENCE_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

-- Deduplicated sentence texts. The rowid is the global sentence ID;
-- rows are never deleted or renumbered.
CREATE TABLE IF NOT EXISTS sentences ( sentence TEXT UNIQUE PRIMARY KEY NOT NULL );

CREATE TABLE IF NOT EXISTS documents ( corpus, version, document );
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents ON documents (corpus, version, document);

-- Maps a document-local sentence ID to a global sentence ID.
CREATE TABLE IF NOT EXISTS sentids ( id INTEGER, docID INTEGER, sentID TEXT );
CREATE UNIQUE INDEX IF NOT EXISTS idx_sentids ON sentids ( docID, sentID );

-- Flat lookup view over the document join; the trigger lets bulk loaders
-- insert through the view without resolving docIDs themselves.
CREATE VIEW IF NOT EXISTS sentindex (id, corpus, version, document, sentID)
  AS SELECT id, corpus, version, document, sentID
  FROM sentids INNER JOIN documents ON documents.rowid = sentids.docID;

CREATE TRIGGER IF NOT EXISTS insert_sentid
  INSTEAD OF INSERT ON sentindex
  BEGIN
    INSERT OR IGNORE INTO documents(corpus, version, document)
      VALUES (NEW.corpus, NEW.version, NEW.document);
    INSERT INTO sentids(docID, id, sentID)
      VALUES ( ( SELECT rowid FROM documents
                 WHERE corpus = NEW.corpus AND version = NEW.version
                   AND document = NEW.document ),
               NEW.id, NEW.sentID );
  END;
"#;

/// Link side: resolved links, sentence projections, corpus/bitext identity
/// tables, and the derived range tables.
pub const LINK_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

-- The alignment links, carrying both the original document-local ID groups
-- and the resolved global sentence-ID groups as ordered, space-joined
-- strings. Append-only apart from idempotent re-insertion.
CREATE TABLE IF NOT EXISTS links ( linkID INTEGER NOT NULL PRIMARY KEY, bitextID,
                                   srcIDs TEXT, trgIDs TEXT, srcSentIDs TEXT, trgSentIDs TEXT,
                                   alignType TEXT, alignerScore REAL, cleanerScore REAL );
CREATE UNIQUE INDEX IF NOT EXISTS idx_links ON links ( bitextID, srcIDs, trgIDs );
CREATE INDEX IF NOT EXISTS idx_aligntype ON links ( bitextID, alignType );
CREATE INDEX IF NOT EXISTS idx_bitextid ON links ( bitextID );

-- Fan-out projections: which links (and thereby bitexts and corpora)
-- reference a sentence. One row per (sentence, link) pair.
CREATE TABLE IF NOT EXISTS linkedsource ( sentID INTEGER, linkID INTEGER, bitextID INTEGER, corpusID INTEGER, PRIMARY KEY(linkID, sentID) );
CREATE TABLE IF NOT EXISTS linkedtarget ( sentID INTEGER, linkID INTEGER, bitextID INTEGER, corpusID INTEGER, PRIMARY KEY(linkID, sentID) );

CREATE INDEX IF NOT EXISTS idx_linkedsource_bitext ON linkedsource (corpusID, bitextID, sentID);
CREATE INDEX IF NOT EXISTS idx_linkedtarget_bitext ON linkedtarget (corpusID, bitextID, sentID);
CREATE INDEX IF NOT EXISTS idx_linkedsource_linkid ON linkedsource (linkID);
CREATE INDEX IF NOT EXISTS idx_linkedtarget_linkid ON linkedtarget (linkID);
CREATE INDEX IF NOT EXISTS idx_linkedsource_sentid ON linkedsource (sentID);
CREATE INDEX IF NOT EXISTS idx_linkedtarget_sentid ON linkedtarget (sentID);

CREATE TABLE IF NOT EXISTS corpora ( corpusID INTEGER NOT NULL PRIMARY KEY,
                                     corpus TEXT, version TEXT, srclang TEXT, trglang TEXT,
                                     srclang3 TEXT, trglang3 TEXT, latest INTEGER );
CREATE UNIQUE INDEX IF NOT EXISTS idx_release ON corpora (corpus, version, srclang, trglang);

CREATE TABLE IF NOT EXISTS bitexts ( bitextID INTEGER NOT NULL PRIMARY KEY,
                                     corpus TEXT, version TEXT, fromDoc TEXT, toDoc TEXT );
CREATE UNIQUE INDEX IF NOT EXISTS idx_bitexts ON bitexts (corpus, version, fromDoc, toDoc);

-- Derived row-id ranges over the links table. Recomputed after each bitext
-- completes, never patched incrementally.
CREATE TABLE IF NOT EXISTS bitext_range ( bitextID INTEGER NOT NULL PRIMARY KEY, start INTEGER, "end" INTEGER );
CREATE TABLE IF NOT EXISTS corpus_range ( corpusID INTEGER NOT NULL PRIMARY KEY, start INTEGER, "end" INTEGER );

-- Original language-pair codes contributing to a merged store.
CREATE TABLE IF NOT EXISTS langpairs ( langpair TEXT NOT NULL PRIMARY KEY );
"#;
