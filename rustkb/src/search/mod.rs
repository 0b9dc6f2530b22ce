//! Full-text query construction
//!
//! Turns free-form query text into an FTS5 MATCH expression. Terms are
//! OR-combined: a document matching any one term ranks. This is a deliberate
//! simplification over AND semantics; relevance ordering comes from bm25.

/// Build an FTS5 MATCH expression from free-form query text
///
/// - Splits on whitespace into terms
/// - Strips characters FTS5 would treat as syntax
/// - Quotes each term and adds prefix matching (`"term"*`)
/// - Joins terms with OR
///
/// Returns an empty string when nothing queryable remains; callers treat
/// that as an empty result set.
pub fn build_match_query(query: &str) -> String {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter_map(|term| {
            let clean: String = term
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect();

            if clean.is_empty() {
                None
            } else {
                Some(format!("\"{}\"*", clean))
            }
        })
        .collect();

    terms.join(" OR ")
}
