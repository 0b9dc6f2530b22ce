//! rustkb MCP Server
//!
//! Serves the documentation knowledge base to AI agents over stdio.
//!
//! ## Usage
//!
//! ```bash
//! # Start with the default database path (~/.cache/rustkb/kb.sqlite)
//! rustkb-mcp
//!
//! # Custom database path, verbose logging, heartbeat every 10 seconds
//! rustkb-mcp --db-path /tmp/kb.sqlite --verbose --heartbeat-secs 10
//! ```
//!
//! ## MCP Configuration
//!
//! Add to your MCP client configuration (e.g., Claude Desktop):
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "rustkb": {
//!       "command": "rustkb-mcp"
//!     }
//!   }
//! }
//! ```
//!
//! The database is recreated on every start: it is a cache of seeded and
//! fetched records, not durable state.

use anyhow::Result;
use clap::Parser;
use rustkb::{seed, McpServer, Store};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// rustkb MCP Server - documentation knowledge base over stdio
#[derive(Parser, Debug)]
#[command(name = "rustkb-mcp")]
#[command(
    author,
    version,
    about = "rustkb MCP server - documentation knowledge base for AI agents"
)]
struct Args {
    /// Path to the knowledge base database file
    #[arg(long, short = 'd', env = "RUSTKB_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Enable verbose logging (outputs to stderr)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Heartbeat notification interval in seconds (0 disables)
    #[arg(long, default_value_t = 30)]
    heartbeat_secs: u64,

    /// Skip loading the built-in offline corpus
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging goes to stderr; stdout carries the protocol.
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("error")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let db_path = args.db_path.unwrap_or_else(rustkb::default_db_path);
    tracing::info!("starting rustkb MCP server with database: {}", db_path.display());

    // Two-phase bring-up: no line is read before the store is ready.
    let mut store = Store::open(&db_path)?;
    store.initialize()?;

    if !args.no_seed {
        let stats = seed::load_builtin(&store)?;
        tracing::info!(
            documents = stats.documents,
            patterns = stats.patterns,
            solutions = stats.solutions,
            "seeded offline corpus"
        );
    }

    let heartbeat = match args.heartbeat_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    McpServer::new(store)
        .with_heartbeat(heartbeat)
        .run()
        .await?;

    Ok(())
}
