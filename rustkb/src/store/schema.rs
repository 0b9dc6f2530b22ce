//! Database schema for the knowledge base
//!
//! The store is a rebuild-on-boot cache: `recreate_schema` drops any prior
//! tables before creating fresh ones, so no migration path exists or is
//! needed.

use crate::error::Result;
use rusqlite::Connection;

const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS doc_tags;
DROP TABLE IF EXISTS doc_examples;
DROP TABLE IF EXISTS docs_fts;
DROP TABLE IF EXISTS documents;
DROP TABLE IF EXISTS patterns;
DROP TABLE IF EXISTS error_solutions;
"#;

const SCHEMA_SQL: &str = r#"
-- Documentation entries
CREATE TABLE documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crate_name TEXT NOT NULL,
    version TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL,
    framework TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Tag children, owned by their document
CREATE TABLE doc_tags (
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    tag TEXT NOT NULL
);

-- Ordered code examples, owned by their document
CREATE TABLE doc_examples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    code TEXT NOT NULL
);

-- Reusable code templates, queried by exact framework match
CREATE TABLE patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    code_template TEXT NOT NULL,
    framework TEXT NOT NULL,
    category TEXT NOT NULL
);

-- Known error signatures and their remediations
CREATE TABLE error_solutions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    error_pattern TEXT NOT NULL,
    solution TEXT NOT NULL,
    example_fix TEXT,
    framework TEXT
);

CREATE INDEX idx_documents_framework ON documents(framework);
CREATE INDEX idx_doc_tags_document ON doc_tags(document_id);
CREATE INDEX idx_doc_examples_document ON doc_examples(document_id);
CREATE INDEX idx_patterns_framework ON patterns(framework);

-- Full-text search index using FTS5 with Porter stemmer.
-- One row per document (rowid = documents.id); the extra column carries the
-- document's tags and examples as they were at insert time.
CREATE VIRTUAL TABLE docs_fts USING fts5(
    title,
    content,
    category,
    framework,
    extra,
    tokenize='porter unicode61'
);
"#;

/// Drop any existing tables and create a fresh schema
pub fn recreate_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(DROP_SQL)?;
    conn.execute_batch(SCHEMA_SQL)?;
    tracing::info!("recreated knowledge base schema");
    Ok(())
}
