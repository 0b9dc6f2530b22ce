//! # rustkb - Rust framework documentation knowledge base
//!
//! A rebuild-on-boot store of crate docs, reusable code patterns, and known
//! error fixes, queryable through SQLite FTS5 and served to AI agents over a
//! line-delimited JSON-RPC 2.0 stdio protocol.
//!
//! rustkb provides:
//! - **Ranked full-text search** via FTS5 with OR-combined prefix terms
//! - **Pattern and error-fix lookup** per framework
//! - **MCP server** exposing the store and collaborator fetchers as tools
//! - **Collaborators** that harvest doc sites, GitHub, and crates.io
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rustkb::{seed, McpServer, Store};
//!
//! #[tokio::main]
//! async fn main() -> rustkb::Result<()> {
//!     let mut store = Store::open(rustkb::default_db_path())?;
//!     store.initialize()?;
//!     seed::load_builtin(&store)?;
//!     McpServer::new(store).run().await
//! }
//! ```

pub mod analyze;
pub mod error;
pub mod fetch;
pub mod mcp;
pub mod search;
pub mod seed;
pub mod store;

// Re-exports for convenience
pub use error::{Error, Result};
pub use mcp::McpServer;
pub use store::{
    Document, ErrorSolution, NewDocument, NewErrorSolution, NewPattern, Pattern, Store,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("rustkb")
        .join("kb.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_shape() {
        let path = default_db_path();
        assert!(path.ends_with("rustkb/kb.sqlite"));
    }
}
