//! GitHub-backed implementation of [`RemoteSource`].
//!
//! File contents come from `raw.githubusercontent.com`; directory listings
//! and repository metadata come from the GitHub REST API. There is no retry
//! loop: a failed request surfaces immediately and the caller decides
//! whether a fallback exists.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::models::RepoIdentity;

use super::{ApiError, ItemPayload, RemoteSource};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// GitHub rejects API requests without a User-Agent.
const USER_AGENT: &str = concat!("trophycache/", env!("CARGO_PKG_VERSION"));

/// Accept header for the GitHub REST API
const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

/// Client for one showcase repository.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    remote: RemoteConfig,
}

impl GithubClient {
    pub fn new(remote: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, remote })
    }

    /// Point at a different repository, sharing the connection pool.
    pub fn with_remote(&self, remote: RemoteConfig) -> Self {
        Self {
            client: self.client.clone(),
            remote,
        }
    }

    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &url, &body))
        }
    }

    async fn get_text(&self, url: &str, headers: header::HeaderMap) -> Result<String, ApiError> {
        let response = self.client.get(url).headers(headers).send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.text().await?)
    }

    async fn get_json(&self, url: &str, headers: header::HeaderMap) -> Result<Value, ApiError> {
        let text = self.get_text(url, headers).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} is not valid JSON: {}", url, e)))
    }

    fn no_cache_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
        headers
    }

    fn api_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GITHUB_JSON));
        headers
    }

    /// Look up the repository's canonical owner/repo casing.
    ///
    /// Pages addresses are case-insensitive but raw file URLs are not. Falls
    /// back to the current identity on any failure.
    pub async fn resolve_identity(&self) -> RepoIdentity {
        let identity = self.remote.identity.clone();
        if identity.is_placeholder() {
            return identity;
        }

        let repo: RepoResponse = match self
            .get_json(self.remote.repo_url(), Self::api_headers())
            .await
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| ApiError::InvalidResponse(e.to_string()))
            }) {
            Ok(repo) => repo,
            Err(e) => {
                debug!(error = %e, "Could not fetch repository info for casing correction");
                return identity;
            }
        };

        if repo.owner.login != identity.owner || repo.name != identity.repo {
            debug!(owner = %repo.owner.login, repo = %repo.name, "Corrected repository casing");
        }
        identity.with_canonical_names(repo.owner.login, repo.name)
    }

    /// Optional custom gamer card fragment published next to the data.
    pub async fn fetch_gamercard(&self) -> Option<String> {
        match self.get_text(&self.remote.gamercard_url(), header::HeaderMap::new()).await {
            Ok(html) => Some(html),
            Err(e) => {
                debug!(error = %e, "No custom gamercard found");
                None
            }
        }
    }
}

/// Keep numeric directory names, in listing order.
fn parse_listing(entries: Vec<ContentEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| entry.kind == "dir")
        .map(|entry| entry.name)
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

#[async_trait]
impl RemoteSource for GithubClient {
    async fn fetch_manifest(&self) -> Result<Value, ApiError> {
        let url = self.remote.manifest_url();
        debug!(url = %url, "Fetching manifest");
        self.get_json(&url, Self::no_cache_headers()).await
    }

    async fn fetch_item_payload(&self, id: &str) -> Result<ItemPayload, ApiError> {
        let primary = self.remote.achievements_url(id);
        match self.get_json(&primary, header::HeaderMap::new()).await {
            Ok(record) => Ok(ItemPayload {
                record,
                alternate: false,
            }),
            Err(e) if e.is_http_status() => {
                let alternate = self.remote.alternate_achievements_url(id);
                debug!(
                    id,
                    url = %alternate,
                    error = %e,
                    "achievements.json unavailable, trying alternate store"
                );
                let record = self.get_json(&alternate, header::HeaderMap::new()).await?;
                Ok(ItemPayload {
                    record,
                    alternate: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_item_definitions(&self, id: &str) -> Option<Value> {
        match self
            .get_json(&self.remote.game_info_url(id), header::HeaderMap::new())
            .await
        {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(id, error = %e, "No game-info.json");
                None
            }
        }
    }

    async fn list_available_ids(&self) -> Result<Vec<String>, ApiError> {
        let url = self.remote.listing_url();
        let listing = match self.get_json(&url, Self::api_headers()).await {
            Ok(listing) => listing,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let entries: Vec<ContentEntry> = serde_json::from_value(listing)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected listing format: {}", e)))?;
        Ok(parse_listing(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: &str) -> ContentEntry {
        ContentEntry {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn test_parse_listing_keeps_numeric_dirs_in_order() {
        let ids = parse_listing(vec![
            entry("620", "dir"),
            entry("README.md", "file"),
            entry("440", "dir"),
            entry("templates", "dir"),
            entry("123", "file"),
            entry("", "dir"),
        ]);
        assert_eq!(ids, vec!["620", "440"]);
    }

    #[test]
    fn test_listing_json_shape() {
        let entries: Vec<ContentEntry> = serde_json::from_str(
            r#"[{"name": "10", "path": "AppID/10", "type": "dir", "sha": "abc"}]"#,
        )
        .unwrap();
        assert_eq!(parse_listing(entries), vec!["10"]);
    }

    #[test]
    fn test_with_remote_switches_repository() {
        let client = GithubClient::new(RemoteConfig::new(RepoIdentity::new("a", "b"))).unwrap();
        let other = client.with_remote(RemoteConfig::new(RepoIdentity::new("c", "d")));
        assert_eq!(other.remote().identity.owner, "c");
        assert_eq!(client.remote().identity.owner, "a");
    }

    #[test]
    fn test_no_cache_headers() {
        let headers = GithubClient::no_cache_headers();
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    }
}
