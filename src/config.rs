//! Runtime configuration
//!
//! Settings come from an optional JSON file and are then overridden by
//! `LOFI_*` environment variables. Every field has a default, so an empty
//! file (or no file) is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LofiError, Result};

/// Longest source clip accepted, in seconds (10 minutes)
pub const MAX_DURATION_SECS: u64 = 600;

/// Bitrate used for compressed previews
pub const PREVIEW_BITRATE_KBPS: u32 = 192;

/// Converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding downloads and rendered files
    pub workspace_dir: PathBuf,
    /// Sources longer than this are rejected before processing
    pub max_duration_secs: u64,
    /// Path or name of the yt-dlp executable
    pub ytdlp_path: String,
    /// Path or name of the ffmpeg executable
    pub ffmpeg_path: String,
    /// Bitrate for MP3 previews
    pub preview_bitrate_kbps: u32,
    pub validation_cache_entries: usize,
    pub validation_cache_ttl_secs: u64,
    pub download_cache_entries: usize,
    pub download_cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("uploaded_files"),
            max_duration_secs: MAX_DURATION_SECS,
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            preview_bitrate_kbps: PREVIEW_BITRATE_KBPS,
            validation_cache_entries: 5,
            validation_cache_ttl_secs: 300,
            download_cache_entries: 5,
            download_cache_ttl_secs: 300,
        }
    }
}

impl Settings {
    /// Load settings from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LofiError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `LOFI_*` overrides from a key lookup
    ///
    /// The lookup is injectable so tests don't have to touch the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LOFI_WORKSPACE_DIR") {
            self.workspace_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("LOFI_MAX_DURATION_SECS") {
            self.max_duration_secs = raw.trim().parse().map_err(|_| LofiError::Config {
                reason: format!("LOFI_MAX_DURATION_SECS is not a number: '{}'", raw),
            })?;
        }
        if let Some(path) = lookup("LOFI_YTDLP_PATH") {
            self.ytdlp_path = path;
        }
        if let Some(path) = lookup("LOFI_FFMPEG_PATH") {
            self.ffmpeg_path = path;
        }
        Ok(())
    }
}
