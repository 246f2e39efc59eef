pub mod anilist;
pub mod text;

use async_trait::async_trait;
use kotatsu_schema::{MediaCategory, MediaResult};
use thiserror::Error;

pub use anilist::AniListClient;
pub use text::{clean_description, strip_markup, truncate_chars, DESCRIPTION_LIMIT};

/// A remote read (catalog query, channel fetch, permission lookup) that did
/// not produce an answer. Distinct from "no match" and from "not allowed".
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote reported an error: {0}")]
    Remote(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// External media catalog queried by name.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Returns the single best match, `Ok(None)` when nothing matched.
    async fn search(
        &self,
        name: &str,
        category: MediaCategory,
        allow_adult: bool,
    ) -> Result<Option<MediaResult>, LookupError>;
}
