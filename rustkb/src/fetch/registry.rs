//! crates.io freshness collaborator

use crate::error::{Error, Result};
use serde::Deserialize;

const REGISTRY_BASE: &str = "https://crates.io";

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateData,
}

#[derive(Debug, Deserialize)]
struct CrateData {
    max_stable_version: Option<String>,
    newest_version: String,
}

/// Minimal crates.io API client used for dependency-freshness lookups
pub struct RegistryClient {
    client: reqwest::Client,
    base: String,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    /// Create a client with the shared configuration
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
            base: REGISTRY_BASE.to_string(),
        }
    }

    /// Latest stable version of a crate, falling back to the newest release
    pub async fn latest_version(&self, name: &str) -> Result<String> {
        let url = format!("{}/api/v1/crates/{}", self.base, name);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{} returned {}", url, response.status())));
        }

        let data: CrateResponse = response.json().await?;
        Ok(data
            .krate
            .max_stable_version
            .unwrap_or(data.krate.newest_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_response_shape() {
        let json = r#"{"crate":{"max_stable_version":"1.2.3","newest_version":"2.0.0-beta.1"}}"#;
        let parsed: CrateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.krate.max_stable_version.as_deref(), Some("1.2.3"));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_latest_version_live() {
        let client = RegistryClient::new();
        let version = client.latest_version("serde").await.unwrap();
        assert!(!version.is_empty());
    }
}
