//! External collaborators that harvest fresh records into the store
//!
//! Each fetcher owns its own HTTP client with a hard timeout, so a slow or
//! unreachable upstream surfaces as [`crate::Error::Fetch`] instead of
//! stalling the single processing loop.

mod docs;
mod github;
mod registry;

pub use docs::{DocFetcher, ManualMatch};
pub use github::{GithubClient, HarvestStats};
pub use registry::RegistryClient;

use std::time::Duration;

pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const USER_AGENT: &str = concat!("rustkb/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()
        .expect("HTTP client with static configuration")
}
