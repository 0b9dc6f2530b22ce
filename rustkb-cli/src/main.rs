//! rustkb CLI - query the documentation knowledge base from a terminal
//!
//! Every invocation rebuilds the store (it is a cache), seeds the offline
//! corpus, runs one operation, and prints JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rustkb::fetch::{DocFetcher, GithubClient};
use rustkb::{seed, McpServer, Store};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rustkb")]
#[command(
    author,
    version,
    about = "rustkb - Rust framework documentation knowledge base"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Database path (default: ~/.cache/rustkb/kb.sqlite)
    #[arg(long, short = 'd', env = "RUSTKB_DB_PATH")]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the offline documentation store
    Search {
        /// Query text (terms are OR-combined)
        query: String,

        /// Filter to one framework (exact match)
        #[arg(long, short = 'f')]
        framework: Option<String>,
    },

    /// List code patterns for a framework
    Patterns {
        /// Framework name
        framework: String,
    },

    /// Look up known fixes for an error message
    Errors {
        /// Error text or code (e.g. 'E0382')
        error: String,

        /// Filter to one framework; generic fixes always match
        #[arg(long, short = 'f')]
        framework: Option<String>,
    },

    /// Harvest remote documentation into the store and report counts
    Fetch {
        /// Source: leptos, tauri, or github
        source: String,

        /// Repository as owner/name (github source only)
        #[arg(long)]
        repo: Option<String>,
    },

    /// Show store record counts
    Status,

    /// Run the MCP server on stdio
    Serve {
        /// Heartbeat notification interval in seconds (0 disables)
        #[arg(long, default_value_t = 30)]
        heartbeat_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("error")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let db_path = cli.database.unwrap_or_else(rustkb::default_db_path);
    let mut store = Store::open(&db_path)?;
    store.initialize()?;
    seed::load_builtin(&store)?;

    match cli.command {
        Commands::Search { query, framework } => {
            let results = store.search(&query, framework.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Patterns { framework } => {
            let patterns = store.patterns_by_framework(&framework)?;
            println!("{}", serde_json::to_string_pretty(&patterns)?);
        }
        Commands::Errors { error, framework } => {
            let solutions = store.find_error_solutions(&error, framework.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&solutions)?);
        }
        Commands::Fetch { source, repo } => {
            let inserted = match source.as_str() {
                "leptos" => DocFetcher::new().fetch_leptos_docs(&store).await?,
                "tauri" => DocFetcher::new().fetch_tauri_docs(&store).await?,
                "github" => {
                    let repo = repo
                        .ok_or_else(|| anyhow::anyhow!("--repo owner/name is required for github"))?;
                    let stats = GithubClient::new().harvest(&repo, &store).await?;
                    stats.documents + stats.solutions
                }
                other => anyhow::bail!("unknown source: {other} (expected leptos, tauri, or github)"),
            };
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "source": source,
                "inserted": inserted,
            }))?);
        }
        Commands::Status => {
            let status = serde_json::json!({
                "version": rustkb::VERSION,
                "databasePath": store.path().display().to_string(),
                "documents": store.count_documents()?,
                "patterns": store.count_patterns()?,
                "errorSolutions": store.count_error_solutions()?,
                "databaseSizeBytes": store.database_size()?,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Serve { heartbeat_secs } => {
            let heartbeat = match heartbeat_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
            McpServer::new(store).with_heartbeat(heartbeat).run().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["rustkb", "search", "signals", "-f", "leptos"]).unwrap();
        match cli.command {
            Commands::Search { query, framework } => {
                assert_eq!(query, "signals");
                assert_eq!(framework.as_deref(), Some("leptos"));
            }
            _ => panic!("expected search command"),
        }

        let cli = Cli::try_parse_from(["rustkb", "serve", "--heartbeat-secs", "0"]).unwrap();
        match cli.command {
            Commands::Serve { heartbeat_secs } => assert_eq!(heartbeat_secs, 0),
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_query() {
        assert!(Cli::try_parse_from(["rustkb", "search"]).is_err());
    }
}
