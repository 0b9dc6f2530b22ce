//! Tool registry and dispatcher
//!
//! Tool names resolve through the closed [`ToolKind`] set, so adding a tool
//! is a compile-checked change. Failures travel on two tiers: protocol
//! failures (unknown tool, missing required argument) become JSON-RPC
//! errors, while tool-body failures are downgraded to successful replies
//! whose payload carries `isError: true`.

use super::protocol::{JsonRpcError, ToolDefinition, ToolResult};
use crate::analyze;
use crate::error::Error;
use crate::fetch::{DocFetcher, GithubClient, RegistryClient};
use crate::store::Store;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

/// Everything a tool body may touch
pub struct ToolContext<'a> {
    pub store: &'a Store,
    pub docs: &'a DocFetcher,
    pub github: &'a GithubClient,
    pub registry: &'a RegistryClient,
    pub started_at: Instant,
}

/// The two failure tiers of a tool call
#[derive(Debug)]
pub enum ToolError {
    /// Caller fault, surfaced as a JSON-RPC error reply
    Protocol(JsonRpcError),
    /// Tool-body fault, surfaced as a successful reply with `isError: true`
    Execution(Error),
}

impl From<Error> for ToolError {
    fn from(err: Error) -> Self {
        ToolError::Execution(err)
    }
}

type ToolOutcome = Result<ToolResult, ToolError>;

/// The closed set of tools the dispatcher serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SearchOfflineDocs,
    GetCommonPatterns,
    FindErrorSolution,
    FetchLeptosDocs,
    FetchTauriDocs,
    FetchGithubDocs,
    AnalyzeCargoToml,
    SuggestImprovements,
    SearchRustManual,
    GetServerStatus,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::SearchOfflineDocs,
        ToolKind::GetCommonPatterns,
        ToolKind::FindErrorSolution,
        ToolKind::FetchLeptosDocs,
        ToolKind::FetchTauriDocs,
        ToolKind::FetchGithubDocs,
        ToolKind::AnalyzeCargoToml,
        ToolKind::SuggestImprovements,
        ToolKind::SearchRustManual,
        ToolKind::GetServerStatus,
    ];

    /// Wire name of this tool
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SearchOfflineDocs => "search_offline_docs",
            ToolKind::GetCommonPatterns => "get_common_patterns",
            ToolKind::FindErrorSolution => "find_error_solution",
            ToolKind::FetchLeptosDocs => "fetch_leptos_docs",
            ToolKind::FetchTauriDocs => "fetch_tauri_docs",
            ToolKind::FetchGithubDocs => "fetch_github_docs",
            ToolKind::AnalyzeCargoToml => "analyze_cargo_toml",
            ToolKind::SuggestImprovements => "suggest_improvements",
            ToolKind::SearchRustManual => "search_rust_manual",
            ToolKind::GetServerStatus => "get_server_status",
        }
    }

    /// Resolve a wire tool name; `None` means the tool does not exist
    pub fn parse(name: &str) -> Option<ToolKind> {
        ToolKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn definition(self) -> ToolDefinition {
        let (description, input_schema) = match self {
            ToolKind::SearchOfflineDocs => (
                "Ranked full-text search across the offline documentation store. \
                 Query terms are OR-combined prefix matches.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query text"
                        },
                        "framework": {
                            "type": "string",
                            "description": "Optional framework filter (exact match, e.g. 'leptos')"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            ToolKind::GetCommonPatterns => (
                "List reusable code patterns for a framework.",
                json!({
                    "type": "object",
                    "properties": {
                        "framework": {
                            "type": "string",
                            "description": "Framework name (exact match)"
                        }
                    },
                    "required": ["framework"]
                }),
            ),
            ToolKind::FindErrorSolution => (
                "Look up known fixes whose error signature contains the given text.",
                json!({
                    "type": "object",
                    "properties": {
                        "error": {
                            "type": "string",
                            "description": "Error text or code (e.g. 'E0382')"
                        },
                        "framework": {
                            "type": "string",
                            "description": "Optional framework filter; generic fixes always match"
                        }
                    },
                    "required": ["error"]
                }),
            ),
            ToolKind::FetchLeptosDocs => (
                "Fetch the Leptos book index and add its entries to the store.",
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            ),
            ToolKind::FetchTauriDocs => (
                "Fetch the Tauri guides index and add its entries to the store.",
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            ),
            ToolKind::FetchGithubDocs => (
                "Fetch a repository README and recent closed bug issues into the store.",
                json!({
                    "type": "object",
                    "properties": {
                        "repo": {
                            "type": "string",
                            "description": "Repository as owner/name (e.g. 'tauri-apps/tauri')"
                        }
                    },
                    "required": ["repo"]
                }),
            ),
            ToolKind::AnalyzeCargoToml => (
                "Parse a Cargo.toml and report its dependencies with registry freshness.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to the Cargo.toml to analyze"
                        }
                    },
                    "required": ["path"]
                }),
            ),
            ToolKind::SuggestImprovements => (
                "Run lexical lint heuristics over a Rust code snippet.",
                json!({
                    "type": "object",
                    "properties": {
                        "code_snippet": {
                            "type": "string",
                            "description": "Rust source text to inspect"
                        }
                    },
                    "required": ["code_snippet"]
                }),
            ),
            ToolKind::SearchRustManual => (
                "Match query terms against Rust book chapter titles.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query text"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            ToolKind::GetServerStatus => (
                "Report server version, uptime, and store record counts.",
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// The fixed tool catalog, in registration order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.iter().map(|kind| kind.definition()).collect()
}

/// Dispatch one tool call
///
/// Protocol-tier failures come back as `Err(JsonRpcError)`; tool-body
/// failures come back as `Ok` results flagged `isError: true`. A store that
/// is not ready is an ordering bug and is fatal for the request.
pub async fn handle_tool_call(
    ctx: &ToolContext<'_>,
    tool_name: &str,
    arguments: &Value,
) -> Result<ToolResult, JsonRpcError> {
    if !ctx.store.is_ready() {
        return Err(JsonRpcError::internal_error(Error::NotInitialized.to_string()));
    }

    let kind = ToolKind::parse(tool_name)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", tool_name)))?;

    let outcome = match kind {
        ToolKind::SearchOfflineDocs => tool_search_offline_docs(ctx, arguments),
        ToolKind::GetCommonPatterns => tool_get_common_patterns(ctx, arguments),
        ToolKind::FindErrorSolution => tool_find_error_solution(ctx, arguments),
        ToolKind::FetchLeptosDocs => tool_fetch_leptos_docs(ctx).await,
        ToolKind::FetchTauriDocs => tool_fetch_tauri_docs(ctx).await,
        ToolKind::FetchGithubDocs => tool_fetch_github_docs(ctx, arguments).await,
        ToolKind::AnalyzeCargoToml => tool_analyze_cargo_toml(ctx, arguments).await,
        ToolKind::SuggestImprovements => tool_suggest_improvements(arguments),
        ToolKind::SearchRustManual => tool_search_rust_manual(ctx, arguments).await,
        ToolKind::GetServerStatus => tool_get_server_status(ctx),
    };

    match outcome {
        Ok(result) => Ok(result),
        Err(ToolError::Protocol(err)) => Err(err),
        Err(ToolError::Execution(Error::NotInitialized)) => {
            Err(JsonRpcError::internal_error(Error::NotInitialized.to_string()))
        }
        Err(ToolError::Execution(err)) => {
            tracing::warn!(tool = tool_name, error = %err, "tool call failed");
            Ok(ToolResult::error(err.to_string()))
        }
    }
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
        ToolError::Protocol(JsonRpcError::invalid_params(format!(
            "Missing {} parameter",
            key
        )))
    })
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn pretty(value: &impl serde::Serialize) -> Result<ToolResult, ToolError> {
    let text = serde_json::to_string_pretty(value).map_err(Error::from)?;
    Ok(ToolResult::text(text))
}

fn tool_search_offline_docs(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let query = require_str(args, "query")?;
    let framework = optional_str(args, "framework");

    let results = ctx.store.search(query, framework)?;
    pretty(&results)
}

fn tool_get_common_patterns(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let framework = require_str(args, "framework")?;

    let patterns = ctx.store.patterns_by_framework(framework)?;
    pretty(&patterns)
}

fn tool_find_error_solution(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let error = require_str(args, "error")?;
    let framework = optional_str(args, "framework");

    let solutions = ctx.store.find_error_solutions(error, framework)?;
    pretty(&solutions)
}

async fn tool_fetch_leptos_docs(ctx: &ToolContext<'_>) -> ToolOutcome {
    let inserted = ctx.docs.fetch_leptos_docs(ctx.store).await?;
    pretty(&json!({ "framework": "leptos", "inserted": inserted }))
}

async fn tool_fetch_tauri_docs(ctx: &ToolContext<'_>) -> ToolOutcome {
    let inserted = ctx.docs.fetch_tauri_docs(ctx.store).await?;
    pretty(&json!({ "framework": "tauri", "inserted": inserted }))
}

async fn tool_fetch_github_docs(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let repo = require_str(args, "repo")?;

    let stats = ctx.github.harvest(repo, ctx.store).await?;
    pretty(&json!({ "repo": repo, "inserted": stats }))
}

async fn tool_analyze_cargo_toml(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let path = require_str(args, "path")?;

    let report = analyze::analyze_manifest(Path::new(path), Some(ctx.registry)).await?;
    pretty(&report)
}

fn tool_suggest_improvements(args: &Value) -> ToolOutcome {
    let code = require_str(args, "code_snippet")?;

    let suggestions = analyze::suggest_improvements(code);
    if suggestions.is_empty() {
        return Ok(ToolResult::text("No suggestions: the snippet looks clean."));
    }
    pretty(&suggestions)
}

async fn tool_search_rust_manual(ctx: &ToolContext<'_>, args: &Value) -> ToolOutcome {
    let query = require_str(args, "query")?;

    let matches = ctx.docs.search_rust_manual(query).await?;
    pretty(&matches)
}

fn tool_get_server_status(ctx: &ToolContext<'_>) -> ToolOutcome {
    let status = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": ctx.started_at.elapsed().as_secs(),
        "documents": ctx.store.count_documents()?,
        "patterns": ctx.store.count_patterns()?,
        "errorSolutions": ctx.store.count_error_solutions()?,
        "databaseSizeBytes": ctx.store.database_size()?,
        "databasePath": ctx.store.path().display().to_string(),
    });
    pretty(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHarness {
        store: Store,
        docs: DocFetcher,
        github: GithubClient,
        registry: RegistryClient,
    }

    impl TestHarness {
        fn new() -> Self {
            let mut store = Store::open_memory().unwrap();
            store.initialize().unwrap();
            Self::with_store(store)
        }

        fn with_store(store: Store) -> Self {
            Self {
                store,
                docs: DocFetcher::new(),
                github: GithubClient::new(),
                registry: RegistryClient::new(),
            }
        }

        fn ctx(&self) -> ToolContext<'_> {
            ToolContext {
                store: &self.store,
                docs: &self.docs,
                github: &self.github,
                registry: &self.registry,
                started_at: Instant::now(),
            }
        }
    }

    #[test]
    fn test_tool_definitions_complete() {
        let tools = tool_definitions();
        assert_eq!(tools.len(), 10);

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"search_offline_docs"));
        assert!(names.contains(&"get_common_patterns"));
        assert!(names.contains(&"find_error_solution"));
        assert!(names.contains(&"get_server_status"));
    }

    #[test]
    fn test_tool_definitions_have_schemas() {
        for tool in tool_definitions() {
            assert!(
                !tool.description.is_empty(),
                "{} has empty description",
                tool.name
            );
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(
                tool.input_schema.get("properties").is_some(),
                "{} has no properties",
                tool.name
            );
        }
    }

    #[test]
    fn test_tool_kind_parse_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::parse("nope"), None);
    }

    #[tokio::test]
    async fn test_unknown_tool_error() {
        let harness = TestHarness::new();
        let result = handle_tool_call(&harness.ctx(), "unknown_tool", &json!({})).await;
        let err = result.unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_query_is_protocol_error() {
        let harness = TestHarness::new();
        let result = handle_tool_call(&harness.ctx(), "search_offline_docs", &json!({})).await;
        let err = result.unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("Missing query"));
    }

    #[tokio::test]
    async fn test_store_not_ready_is_internal_error() {
        let harness = TestHarness::with_store(Store::open_memory().unwrap());
        let result = handle_tool_call(&harness.ctx(), "get_server_status", &json!({})).await;
        let err = result.unwrap_err();
        assert_eq!(err.code, -32603);
    }

    #[tokio::test]
    async fn test_search_empty_results() {
        let harness = TestHarness::new();
        let result = handle_tool_call(
            &harness.ctx(),
            "search_offline_docs",
            &json!({"query": "nonexistent"}),
        )
        .await
        .unwrap();
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("[]"));
    }

    #[tokio::test]
    async fn test_tool_body_failure_is_error_payload() {
        let harness = TestHarness::new();
        let result = handle_tool_call(
            &harness.ctx(),
            "analyze_cargo_toml",
            &json!({"path": "/definitely/not/here/Cargo.toml"}),
        )
        .await
        .unwrap();
        assert!(result.is_error);
        assert!(result.content[0].text.contains("IO error"));
    }

    #[tokio::test]
    async fn test_suggest_improvements_tool() {
        let harness = TestHarness::new();
        let result = handle_tool_call(
            &harness.ctx(),
            "suggest_improvements",
            &json!({"code_snippet": "let x = f().unwrap();"}),
        )
        .await
        .unwrap();
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("unwrap"));
    }

    #[tokio::test]
    async fn test_status_tool() {
        let harness = TestHarness::new();
        let result = handle_tool_call(&harness.ctx(), "get_server_status", &json!({}))
            .await
            .unwrap();
        assert!(result.content[0].text.contains("version"));
        assert!(result.content[0].text.contains("documents"));
    }
}
