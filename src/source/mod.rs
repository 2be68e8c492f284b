//! Source Acquisition
//!
//! Turning a link into a local WAV file is delegated to a
//! [`SourceProvider`]. Providers report metadata for the media or a typed
//! [`SourceError`] describing why it can't be used. Duration limits are
//! enforced here, before any audio reaches the effects chain.

pub mod cache;
pub mod local;
pub mod ytdlp;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::TtlCache;
pub use local::LocalFileProvider;
pub use ytdlp::YtDlpProvider;

/// Longest message kept from a provider failure
pub const MAX_ERROR_MESSAGE_CHARS: usize = 100;

/// Why a link could not be turned into audio
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Live streams are not supported")]
    UnsupportedLiveStream,

    #[error("Media is private or restricted")]
    PrivateOrRestricted,

    #[error("Media duration {duration_secs:.0}s exceeds the {max_secs}s limit")]
    DurationExceedsLimit { duration_secs: f64, max_secs: u64 },

    #[error("Media is age-restricted")]
    AgeRestricted,

    #[error("Fetch failed: {message}")]
    Fetch { message: String },
}

impl SourceError {
    /// Build a `Fetch` error, truncating long messages
    pub fn fetch(message: impl AsRef<str>) -> Self {
        SourceError::Fetch {
            message: message
                .as_ref()
                .trim()
                .chars()
                .take(MAX_ERROR_MESSAGE_CHARS)
                .collect(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SourceError::UnsupportedLiveStream => "UNSUPPORTED_LIVE_STREAM",
            SourceError::PrivateOrRestricted => "PRIVATE_OR_RESTRICTED",
            SourceError::DurationExceedsLimit { .. } => "DURATION_EXCEEDS_LIMIT",
            SourceError::AgeRestricted => "AGE_RESTRICTED",
            SourceError::Fetch { .. } => "FETCH_ERROR",
        }
    }

    /// Only generic fetch failures are worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Fetch { .. })
    }

    /// Human-readable reason shown to the user
    pub fn user_message(&self) -> String {
        match self {
            SourceError::UnsupportedLiveStream => "Live streams are not supported".to_string(),
            SourceError::PrivateOrRestricted => {
                "Video is not available (may be private or region-locked)".to_string()
            }
            SourceError::DurationExceedsLimit {
                duration_secs,
                max_secs,
            } => format!(
                "Video duration ({:.1} minutes) exceeds {}-minute limit",
                duration_secs / 60.0,
                max_secs / 60
            ),
            SourceError::AgeRestricted => "Age-restricted content cannot be downloaded".to_string(),
            SourceError::Fetch { message } => format!("Failed to fetch audio: {}", message),
        }
    }
}

/// Descriptive information about a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub title: String,
    pub artist: String,
    pub duration_secs: f64,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
}

/// A source downloaded to local storage
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedAudio {
    /// Local WAV file
    pub path: PathBuf,
    pub metadata: SourceMetadata,
}

/// Resolves links to local audio
pub trait SourceProvider {
    /// Check that `link` can be fetched and return its metadata
    fn validate(&self, link: &str) -> Result<SourceMetadata, SourceError>;

    /// Download `link` as WAV into `dest_dir`
    fn fetch(&self, link: &str, dest_dir: &Path) -> Result<FetchedAudio, SourceError>;
}

/// Reject sources longer than `max_secs`
pub fn check_duration(duration_secs: f64, max_secs: u64) -> Result<(), SourceError> {
    if duration_secs > max_secs as f64 {
        Err(SourceError::DurationExceedsLimit {
            duration_secs,
            max_secs,
        })
    } else {
        Ok(())
    }
}
