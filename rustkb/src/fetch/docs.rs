//! Framework documentation fetchers
//!
//! Scrapes the index page of a framework's official documentation site and
//! inserts one document per entry. Also answers `search_rust_manual` from
//! the Rust book's table of contents.

use crate::error::{Error, Result};
use crate::store::{NewDocument, Store};
use scraper::{Html, Selector};
use serde::Serialize;

/// Cap on entries harvested from one index page
const MAX_ENTRIES: usize = 40;

const RUST_BOOK_URL: &str = "https://doc.rust-lang.org/book/";

/// A documentation site to harvest
struct DocSource {
    framework: &'static str,
    crate_name: &'static str,
    index_url: &'static str,
    link_selector: &'static str,
}

const LEPTOS: DocSource = DocSource {
    framework: "leptos",
    crate_name: "leptos",
    index_url: "https://book.leptos.dev/",
    link_selector: "ol.chapter li a",
};

const TAURI: DocSource = DocSource {
    framework: "tauri",
    crate_name: "tauri",
    index_url: "https://v2.tauri.app/start/",
    link_selector: "nav a[href]",
};

/// A Rust manual chapter matching a query
#[derive(Debug, Clone, Serialize)]
pub struct ManualMatch {
    pub title: String,
    pub url: String,
}

/// Fetches framework documentation indexes
pub struct DocFetcher {
    client: reqwest::Client,
}

impl Default for DocFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DocFetcher {
    /// Create a fetcher with the shared client configuration
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
        }
    }

    /// Harvest the Leptos book index into the store
    pub async fn fetch_leptos_docs(&self, store: &Store) -> Result<usize> {
        self.fetch_source(&LEPTOS, store).await
    }

    /// Harvest the Tauri guides index into the store
    pub async fn fetch_tauri_docs(&self, store: &Store) -> Result<usize> {
        self.fetch_source(&TAURI, store).await
    }

    /// Match query terms against Rust book chapter titles
    ///
    /// Terms are OR-combined and compared case-insensitively, mirroring the
    /// store's search semantics.
    pub async fn search_rust_manual(&self, query: &str) -> Result<Vec<ManualMatch>> {
        let body = self.get_text(RUST_BOOK_URL).await?;
        let chapters = extract_links(&body, "ol.chapter li a", RUST_BOOK_URL)?;

        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let matches = chapters
            .into_iter()
            .filter(|(title, _)| {
                let haystack = title.to_lowercase();
                terms.iter().any(|t| haystack.contains(t))
            })
            .map(|(title, url)| ManualMatch { title, url })
            .collect();

        Ok(matches)
    }

    async fn fetch_source(&self, source: &DocSource, store: &Store) -> Result<usize> {
        tracing::info!(framework = source.framework, url = source.index_url, "fetching docs index");

        let body = self.get_text(source.index_url).await?;
        let entries = extract_links(&body, source.link_selector, source.index_url)?;
        if entries.is_empty() {
            return Err(Error::Fetch(format!(
                "no documentation entries found at {}",
                source.index_url
            )));
        }

        let mut inserted = 0;
        for (title, url) in entries.into_iter().take(MAX_ENTRIES) {
            let doc = NewDocument {
                crate_name: source.crate_name.to_string(),
                version: "latest".to_string(),
                title,
                content: url.clone(),
                category: "guide".to_string(),
                framework: source.framework.to_string(),
                tags: vec![source.framework.to_string(), "official-docs".to_string()],
                examples: Vec::new(),
            };
            store.insert_document(&doc)?;
            inserted += 1;
        }

        tracing::info!(framework = source.framework, inserted, "docs harvested");
        Ok(inserted)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{} returned {}", url, response.status())));
        }
        Ok(response.text().await?)
    }
}

/// Extract (title, absolute url) pairs for a CSS selector
fn extract_links(html: &str, selector: &str, base: &str) -> Result<Vec<(String, String)>> {
    let selector = Selector::parse(selector)
        .map_err(|e| Error::Fetch(format!("invalid selector: {e}")))?;
    let document = Html::parse_document(html);

    let links = document
        .select(&selector)
        .filter_map(|element| {
            let title = element.text().collect::<String>().trim().to_string();
            let href = element.value().attr("href")?;
            if title.is_empty() {
                return None;
            }
            Some((title, absolutize(base, href)))
        })
        .collect();

    Ok(links)
}

fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), ensure_leading_slash(href))
    }
}

fn ensure_leading_slash(href: &str) -> String {
    if href.starts_with('/') {
        href.to_string()
    } else {
        format!("/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOC_HTML: &str = r#"
        <html><body>
        <ol class="chapter">
            <li><a href="ch01-getting-started.html">Getting Started</a></li>
            <li><a href="ch04-ownership.html">Understanding Ownership</a></li>
            <li><a href=""></a></li>
        </ol>
        </body></html>
    "#;

    #[test]
    fn test_extract_links() {
        let links = extract_links(TOC_HTML, "ol.chapter li a", "https://example.com/").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "Getting Started");
        assert_eq!(links[0].1, "https://example.com/ch01-getting-started.html");
    }

    #[test]
    fn test_extract_links_bad_selector() {
        let err = extract_links(TOC_HTML, "][", "https://example.com/").unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://example.com/", "https://other.dev/x"),
            "https://other.dev/x"
        );
        assert_eq!(
            absolutize("https://example.com/", "guide.html"),
            "https://example.com/guide.html"
        );
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_search_rust_manual_live() {
        let fetcher = DocFetcher::new();
        let matches = fetcher.search_rust_manual("ownership").await.unwrap();
        assert!(!matches.is_empty());
    }
}
