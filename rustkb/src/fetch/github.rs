//! GitHub collaborator
//!
//! Harvests a repository's README into the document table and recent closed
//! bug issues into the error-solution table.

use crate::error::{Error, Result};
use crate::store::{NewDocument, NewErrorSolution, Store};
use serde::Deserialize;

const API_BASE: &str = "https://api.github.com";

/// Issues fetched per harvest
const ISSUE_PAGE_SIZE: u32 = 10;

/// Truncation applied to issue bodies kept as example fixes
const MAX_FIX_LEN: usize = 400;

#[derive(Debug, Deserialize)]
struct IssueRow {
    title: String,
    html_url: String,
    body: Option<String>,
}

/// Counts of records inserted by one harvest
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestStats {
    pub documents: usize,
    pub solutions: usize,
}

/// GitHub REST client
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    /// Create a client with the shared configuration
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Harvest README and closed bug issues for `owner/name` into the store
    pub async fn harvest(&self, repo: &str, store: &Store) -> Result<HarvestStats> {
        let (_, name) = repo
            .split_once('/')
            .ok_or_else(|| Error::Fetch(format!("repository must be owner/name, got {repo:?}")))?;

        let mut stats = HarvestStats {
            documents: 0,
            solutions: 0,
        };

        let readme = self.fetch_readme(repo).await?;
        store.insert_document(&NewDocument {
            crate_name: name.to_string(),
            version: "latest".to_string(),
            title: format!("{repo} README"),
            content: readme,
            category: "readme".to_string(),
            framework: name.to_string(),
            tags: vec!["github".to_string(), "readme".to_string()],
            examples: Vec::new(),
        })?;
        stats.documents += 1;

        for issue in self.fetch_closed_bug_issues(repo).await? {
            let example_fix = issue.body.as_deref().map(|body| truncate(body, MAX_FIX_LEN));
            store.insert_error_solution(&NewErrorSolution {
                error_pattern: issue.title,
                solution: format!("Resolved upstream, see {}", issue.html_url),
                example_fix,
                framework: Some(name.to_string()),
            })?;
            stats.solutions += 1;
        }

        tracing::info!(repo, documents = stats.documents, solutions = stats.solutions, "github harvest complete");
        Ok(stats)
    }

    async fn fetch_readme(&self, repo: &str) -> Result<String> {
        let url = format!("{}/repos/{}/readme", self.api_base, repo);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{} returned {}", url, response.status())));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(Error::Fetch(format!("{repo} README is empty")));
        }
        Ok(body)
    }

    async fn fetch_closed_bug_issues(&self, repo: &str) -> Result<Vec<IssueRow>> {
        let url = format!(
            "{}/repos/{}/issues?state=closed&labels=bug&per_page={}",
            self.api_base, repo, ISSUE_PAGE_SIZE
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{} returned {}", url, response.status())));
        }

        Ok(response.json().await?)
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harvest_rejects_bare_name() {
        let mut store = Store::open_memory().unwrap();
        store.initialize().unwrap();

        let client = GithubClient::new();
        let err = client.harvest("tauri", &store).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("owner/name"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let out = truncate(text, 3);
        assert!(out.ends_with('…'));

        assert_eq!(truncate("short", 400), "short");
    }
}
