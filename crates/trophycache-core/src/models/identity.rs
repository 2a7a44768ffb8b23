//! Repository identity derived from a GitHub Pages address.

use serde::{Deserialize, Serialize};

/// Owner shown when the address is not a GitHub Pages site.
pub const PLACEHOLDER_OWNER: &str = "User";

/// Avatar shown when the owner is unknown.
pub const DEFAULT_AVATAR_URL: &str =
    "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png";

const PAGES_DOMAIN: &str = ".github.io";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub repo: String,
    pub avatar_url: String,
    /// True when derived from a `*.github.io` address
    #[serde(default)]
    pub is_pages_site: bool,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        let owner = owner.into();
        let avatar_url = avatar_for(&owner);
        Self {
            owner,
            repo: repo.into(),
            avatar_url,
            is_pages_site: false,
        }
    }

    /// Identity used when nothing better is known.
    pub fn placeholder() -> Self {
        Self {
            owner: PLACEHOLDER_OWNER.to_string(),
            repo: String::new(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            is_pages_site: false,
        }
    }

    /// Parse `https://{owner}.github.io/{repo}/...`.
    ///
    /// A user site (`https://{owner}.github.io/`) maps to the
    /// `{owner}.github.io` repository. Anything else yields the placeholder.
    pub fn from_pages_url(url: &str) -> Self {
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        let (host, path) = without_scheme
            .split_once('/')
            .unwrap_or((without_scheme, ""));
        let host = host.split(':').next().unwrap_or(host);

        let Some(owner) = host
            .strip_suffix(PAGES_DOMAIN)
            .filter(|o| !o.is_empty() && !o.contains('.'))
        else {
            return Self::placeholder();
        };

        let repo = path
            .split(['/', '?', '#'])
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", owner, PAGES_DOMAIN));

        Self {
            owner: owner.to_string(),
            repo,
            avatar_url: avatar_for(owner),
            is_pages_site: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.owner == PLACEHOLDER_OWNER || self.repo.is_empty()
    }

    /// Replace owner/repo with the canonical casing reported by GitHub.
    pub fn with_canonical_names(mut self, owner: String, repo: String) -> Self {
        self.owner = owner;
        self.repo = repo;
        self
    }
}

fn avatar_for(owner: &str) -> String {
    format!("https://github.com/{}.png", owner.to_lowercase())
}
