//! Error taxonomy for the load pipeline.

use thiserror::Error;

use crate::api::ApiError;

/// What the remote repository is expected to look like, shown next to
/// terminal load errors.
const LAYOUT_GUIDANCE: &str = "Make sure the repository has:\n\
  1. Folders in `AppID/` named after each game's numeric AppID\n\
  2. An `achievements.json` or `<appid>.db` file inside each folder\n\
  3. A generated `game-data.json` (run the workflow that builds it)";

#[derive(Error, Debug)]
pub enum LoadError {
    /// Network or transport failure with no usable cached fallback.
    #[error("Failed to fetch game data: {0}")]
    Fetch(#[from] ApiError),

    /// Manifest or payload shape was not recognized.
    #[error("Unrecognized game data format: {0}")]
    Format(String),

    /// A single game could not be normalized. Never escapes the batch loop.
    #[error("Failed to process game {id}: {reason}")]
    ItemProcessing { id: String, reason: String },
}

impl LoadError {
    pub fn item(id: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::ItemProcessing {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Actionable text for the end user describing the expected remote layout.
    pub fn guidance(&self) -> &'static str {
        LAYOUT_GUIDANCE
    }
}
