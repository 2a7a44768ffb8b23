//! Application configuration management.
//!
//! `Config` is the user-editable settings file, stored at
//! `~/.config/trophycache/config.json`. `RemoteConfig` is the resolved set of
//! remote locations for one repository, built once at the start of a load
//! and passed down explicitly.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::RepoIdentity;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "trophycache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Raw file host for repository contents
const RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// GitHub REST API host
const API_BASE_URL: &str = "https://api.github.com";

/// Branch holding the user's achievement data
const DATA_BRANCH: &str = "user";

/// Directory holding one folder per game
pub const ITEMS_DIR: &str = "AppID";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// GitHub Pages address of the showcase, e.g. `https://octocat.github.io/trophies/`
    pub pages_url: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Work out which repository to read.
    ///
    /// An explicit owner/repo pair wins over the Pages address; with neither,
    /// the placeholder identity is returned.
    pub fn identity(&self) -> RepoIdentity {
        match (&self.owner, &self.repo, &self.pages_url) {
            (Some(owner), Some(repo), pages) => {
                let mut identity = RepoIdentity::new(owner.clone(), repo.clone());
                // Keep directory discovery available when the Pages address agrees
                identity.is_pages_site = pages
                    .as_deref()
                    .map(RepoIdentity::from_pages_url)
                    .is_some_and(|p| p.is_pages_site && p.owner.eq_ignore_ascii_case(owner));
                identity
            }
            (_, _, Some(url)) => RepoIdentity::from_pages_url(url),
            _ => RepoIdentity::placeholder(),
        }
    }

    pub fn cache_dir(&self, identity: &RepoIdentity) -> Result<PathBuf> {
        let base = match self.cache_dir {
            Some(ref dir) => dir.clone(),
            None => dirs::cache_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?
                .join(APP_NAME),
        };
        Ok(base
            .join(identity.owner.to_lowercase())
            .join(identity.repo.to_lowercase()))
    }
}

/// Remote locations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub identity: RepoIdentity,
    /// `https://raw.githubusercontent.com/{owner}/{repo}/user/`
    pub raw_base: String,
    /// `https://api.github.com/repos/{owner}/{repo}`
    pub api_base: String,
}

impl RemoteConfig {
    pub fn new(identity: RepoIdentity) -> Self {
        Self::with_hosts(identity, RAW_BASE_URL, API_BASE_URL)
    }

    /// Same layout against different hosts (mirrors, tests).
    pub fn with_hosts(identity: RepoIdentity, raw_host: &str, api_host: &str) -> Self {
        let raw_host = raw_host.trim_end_matches('/');
        let api_host = api_host.trim_end_matches('/');
        Self {
            raw_base: format!(
                "{}/{}/{}/{}/",
                raw_host, identity.owner, identity.repo, DATA_BRANCH
            ),
            api_base: format!("{}/repos/{}/{}", api_host, identity.owner, identity.repo),
            identity,
        }
    }

    pub fn manifest_url(&self) -> String {
        format!("{}game-data.json", self.raw_base)
    }

    pub fn gamercard_url(&self) -> String {
        format!("{}gamercard.html", self.raw_base)
    }

    pub fn achievements_url(&self, id: &str) -> String {
        format!("{}{}/{}/achievements.json", self.raw_base, ITEMS_DIR, id)
    }

    /// Alternate progress store some tools write instead of `achievements.json`
    pub fn alternate_achievements_url(&self, id: &str) -> String {
        format!("{}{}/{}/{}.db", self.raw_base, ITEMS_DIR, id, id)
    }

    pub fn game_info_url(&self, id: &str) -> String {
        format!("{}{}/{}/game-info.json", self.raw_base, ITEMS_DIR, id)
    }

    pub fn listing_url(&self) -> String {
        format!("{}/contents/{}", self.api_base, ITEMS_DIR)
    }

    pub fn repo_url(&self) -> &str {
        &self.api_base
    }
}
