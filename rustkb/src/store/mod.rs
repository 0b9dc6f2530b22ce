//! Knowledge base store
//!
//! The store manages the SQLite database containing:
//! - Documents (crate docs with tag/example children)
//! - Patterns (reusable code templates per framework)
//! - Error solutions (known error signatures and fixes)
//! - FTS5 index (full-text search, one row per document)
//!
//! Lifecycle is two-phase: `open` (or `open_memory`) builds the handle,
//! `initialize` destructively recreates the schema and flips the readiness
//! flag. Every operation fails with [`Error::NotInitialized`] until then.
//! The backing file is a rebuild-on-boot cache, not durable state.

mod schema;

use crate::error::{Error, Result};
use crate::search;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Cap applied to ranked search results; not part of the tool surface.
const MAX_SEARCH_RESULTS: usize = 50;

/// A stored documentation entry with its tag and example children
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(rename = "crate")]
    pub crate_name: String,
    pub version: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub framework: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for [`Store::insert_document`]
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct NewDocument {
    #[serde(rename = "crate")]
    pub crate_name: String,
    pub version: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub framework: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A reusable code template
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Pattern {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub code_template: String,
    pub framework: String,
    pub category: String,
}

/// Input for [`Store::insert_pattern`]
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct NewPattern {
    pub name: String,
    pub description: String,
    pub code_template: String,
    pub framework: String,
    pub category: String,
}

/// A known error signature paired with a remediation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorSolution {
    pub id: i64,
    pub error_pattern: String,
    pub solution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Input for [`Store::insert_error_solution`]
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct NewErrorSolution {
    pub error_pattern: String,
    pub solution: String,
    #[serde(default)]
    pub example_fix: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

/// The knowledge base store
pub struct Store {
    conn: Connection,
    path: PathBuf,
    initialized: bool,
}

impl Store {
    /// Open a database handle at the given path without touching the schema
    ///
    /// The store is unusable until [`Store::initialize`] has run.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Ok(Store {
            conn,
            path,
            initialized: false,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Store {
            conn,
            path: PathBuf::from(":memory:"),
            initialized: false,
        })
    }

    /// Destructively recreate the schema and mark the store ready
    ///
    /// Any prior persisted state is discarded: the store is a cache that is
    /// rebuilt on every boot.
    pub fn initialize(&mut self) -> Result<()> {
        schema::recreate_schema(&self.conn)?;
        self.initialized = true;
        Ok(())
    }

    /// Whether `initialize()` has completed
    pub fn is_ready(&self) -> bool {
        self.initialized
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ready(&self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Insert operations
    // -------------------------------------------------------------------------

    /// Insert a document with its tag and example children
    ///
    /// The document row, child rows, and FTS row are written in one
    /// transaction, so the index always reflects the children present at
    /// insert time. Blank examples are silently dropped. Returns the
    /// assigned id.
    pub fn insert_document(&self, doc: &NewDocument) -> Result<i64> {
        self.ready()?;
        require_field("crate", &doc.crate_name)?;
        require_field("version", &doc.version)?;
        require_field("title", &doc.title)?;
        require_field("content", &doc.content)?;
        require_field("category", &doc.category)?;
        require_field("framework", &doc.framework)?;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO documents
             (crate_name, version, title, content, category, framework, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                doc.crate_name,
                doc.version,
                doc.title,
                doc.content,
                doc.category,
                doc.framework,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();

        for tag in &doc.tags {
            tx.execute(
                "INSERT INTO doc_tags (document_id, tag) VALUES (?1, ?2)",
                params![id, tag],
            )?;
        }

        let mut kept_examples: Vec<&str> = Vec::new();
        for code in &doc.examples {
            if code.trim().is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO doc_examples (document_id, code) VALUES (?1, ?2)",
                params![id, code],
            )?;
            kept_examples.push(code);
        }

        let mut extra_parts: Vec<&str> = doc.tags.iter().map(String::as_str).collect();
        extra_parts.extend(kept_examples);
        let extra = extra_parts.join(" ");

        tx.execute(
            "INSERT INTO docs_fts (rowid, title, content, category, framework, extra)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                doc.title,
                doc.content,
                doc.category,
                doc.framework,
                extra
            ],
        )?;

        tx.commit()?;
        tracing::debug!(id, title = %doc.title, "inserted document");
        Ok(id)
    }

    /// Append a pattern; duplicates are permitted and accumulate
    pub fn insert_pattern(&self, pattern: &NewPattern) -> Result<i64> {
        self.ready()?;
        self.conn.execute(
            "INSERT INTO patterns (name, description, code_template, framework, category)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pattern.name,
                pattern.description,
                pattern.code_template,
                pattern.framework,
                pattern.category
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append an error solution; duplicates are permitted and accumulate
    pub fn insert_error_solution(&self, solution: &NewErrorSolution) -> Result<i64> {
        self.ready()?;
        self.conn.execute(
            "INSERT INTO error_solutions (error_pattern, solution, example_fix, framework)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                solution.error_pattern,
                solution.solution,
                solution.example_fix,
                solution.framework
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // -------------------------------------------------------------------------
    // Query operations
    // -------------------------------------------------------------------------

    /// Ranked full-text search over documents
    ///
    /// Query terms are OR-combined prefix matches: a document matching any
    /// one term ranks. Results are deduplicated by id, children are
    /// re-aggregated, and order is best bm25 rank first. An unmatched query
    /// is an empty result, not an error.
    pub fn search(&self, query: &str, framework: Option<&str>) -> Result<Vec<Document>> {
        self.ready()?;

        let match_expr = search::build_match_query(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }

        let base_sql = "SELECT d.id, d.crate_name, d.version, d.title, d.content,
                               d.category, d.framework, d.created_at, d.updated_at
                        FROM docs_fts
                        JOIN documents d ON d.id = docs_fts.rowid
                        WHERE docs_fts MATCH ?1";

        let rows: Vec<Document> = match framework {
            Some(fw) => {
                let sql = format!(
                    "{base_sql} AND d.framework = ?2 ORDER BY bm25(docs_fts) LIMIT {MAX_SEARCH_RESULTS}"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let mapped = stmt.query_map(params![match_expr, fw], map_document_row)?;
                mapped.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let sql =
                    format!("{base_sql} ORDER BY bm25(docs_fts) LIMIT {MAX_SEARCH_RESULTS}");
                let mut stmt = self.conn.prepare(&sql)?;
                let mapped = stmt.query_map(params![match_expr], map_document_row)?;
                mapped.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        let mut seen: HashSet<i64> = HashSet::new();
        let mut results = Vec::with_capacity(rows.len());
        for mut doc in rows {
            if !seen.insert(doc.id) {
                continue;
            }
            let (tags, examples) = self.document_children(doc.id)?;
            doc.tags = tags;
            doc.examples = examples;
            results.push(doc);
        }

        Ok(results)
    }

    /// Look up solutions whose stored pattern contains the supplied text
    ///
    /// Case-sensitive substring containment via `instr` (SQLite `LIKE` is
    /// ASCII case-insensitive). A solution without a framework is generic
    /// and matches any filter. Insertion order, no ranking.
    pub fn find_error_solutions(
        &self,
        error_text: &str,
        framework: Option<&str>,
    ) -> Result<Vec<ErrorSolution>> {
        self.ready()?;

        let rows = match framework {
            Some(fw) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, error_pattern, solution, example_fix, framework
                     FROM error_solutions
                     WHERE instr(error_pattern, ?1) > 0
                       AND (framework IS NULL OR framework = ?2)
                     ORDER BY id",
                )?;
                let mapped = stmt.query_map(params![error_text, fw], map_solution_row)?;
                mapped.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, error_pattern, solution, example_fix, framework
                     FROM error_solutions
                     WHERE instr(error_pattern, ?1) > 0
                     ORDER BY id",
                )?;
                let mapped = stmt.query_map(params![error_text], map_solution_row)?;
                mapped.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(rows)
    }

    /// List patterns for a framework, exact match, insertion order
    pub fn patterns_by_framework(&self, framework: &str) -> Result<Vec<Pattern>> {
        self.ready()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, code_template, framework, category
             FROM patterns WHERE framework = ?1 ORDER BY id",
        )?;
        let mapped = stmt.query_map([framework], |row| {
            Ok(Pattern {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                code_template: row.get(3)?,
                framework: row.get(4)?,
                category: row.get(5)?,
            })
        })?;
        Ok(mapped.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // -------------------------------------------------------------------------
    // Status surface
    // -------------------------------------------------------------------------

    /// Count stored documents
    pub fn count_documents(&self) -> Result<i64> {
        self.ready()?;
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count stored patterns
    pub fn count_patterns(&self) -> Result<i64> {
        self.ready()?;
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count stored error solutions
    pub fn count_error_solutions(&self) -> Result<i64> {
        self.ready()?;
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM error_solutions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database file size in bytes
    pub fn database_size(&self) -> Result<u64> {
        if self.path.to_str() == Some(":memory:") {
            return Ok(0);
        }
        let metadata = std::fs::metadata(&self.path)?;
        Ok(metadata.len())
    }

    /// Fetch a document's tags and examples, re-aggregated from child rows
    fn document_children(&self, id: i64) -> Result<(Vec<String>, Vec<String>)> {
        let mut tag_stmt = self
            .conn
            .prepare("SELECT tag FROM doc_tags WHERE document_id = ?1 ORDER BY rowid")?;
        let tags = tag_stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        let mut example_stmt = self
            .conn
            .prepare("SELECT code FROM doc_examples WHERE document_id = ?1 ORDER BY id")?;
        let examples = example_stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok((tags, examples))
    }
}

fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        crate_name: row.get(1)?,
        version: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        framework: row.get(6)?,
        tags: Vec::new(),
        examples: Vec::new(),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn map_solution_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ErrorSolution> {
    Ok(ErrorSolution {
        id: row.get(0)?,
        error_pattern: row.get(1)?,
        solution: row.get(2)?,
        example_fix: row.get(3)?,
        framework: row.get(4)?,
    })
}

fn require_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
