//! yt-dlp provider
//!
//! Drives an external `yt-dlp` executable: `--dump-json` for validation and
//! audio extraction to WAV for downloads. Both results are cached per link
//! in bounded TTL caches owned by the provider.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use uuid::Uuid;

use super::{check_duration, FetchedAudio, SourceError, SourceMetadata, SourceProvider, TtlCache};
use crate::config::Settings;

/// Subset of the yt-dlp info JSON the converter cares about
#[derive(Debug, Default, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub view_count: Option<u64>,
    pub is_live: Option<bool>,
    pub availability: Option<String>,
}

/// Availability values that mean the media can't be fetched anonymously
const RESTRICTED_AVAILABILITY: [&str; 4] =
    ["private", "needs_auth", "subscriber_only", "premium_only"];

/// Check info against the provider rules and extract metadata
pub fn classify_info(info: &VideoInfo, max_duration_secs: u64) -> Result<SourceMetadata, SourceError> {
    if info.is_live.unwrap_or(false) {
        return Err(SourceError::UnsupportedLiveStream);
    }
    if let Some(availability) = info.availability.as_deref() {
        if RESTRICTED_AVAILABILITY.contains(&availability) {
            return Err(SourceError::PrivateOrRestricted);
        }
    }

    let duration_secs = info.duration.unwrap_or(0.0);
    check_duration(duration_secs, max_duration_secs)?;

    Ok(SourceMetadata {
        title: info.title.clone().unwrap_or_else(|| "Unknown".to_string()),
        artist: info
            .artist
            .clone()
            .or_else(|| info.uploader.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        duration_secs,
        thumbnail_url: info.thumbnail.clone(),
        view_count: info.view_count.unwrap_or(0),
    })
}

/// Map yt-dlp's stderr onto a typed rejection
pub fn classify_failure(stderr: &str) -> SourceError {
    let message = stderr
        .lines()
        .rev()
        .find(|line| line.contains("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|line| !line.trim().is_empty()))
        .unwrap_or("yt-dlp failed without output");
    let message = message
        .split_once("ERROR:")
        .map(|(_, rest)| rest)
        .unwrap_or(message)
        .trim();

    let lower = message.to_ascii_lowercase();
    if message.contains("Video unavailable") || lower.contains("private video") {
        SourceError::PrivateOrRestricted
    } else if lower.contains("age-restrict")
        || lower.contains("age restrict")
        || lower.contains("confirm your age")
        || lower.contains("inappropriate for some users")
    {
        SourceError::AgeRestricted
    } else {
        SourceError::fetch(message)
    }
}

/// Source provider backed by the yt-dlp command-line tool
pub struct YtDlpProvider {
    binary: String,
    max_duration_secs: u64,
    validations: Mutex<TtlCache<String, Result<SourceMetadata, SourceError>>>,
    downloads: Mutex<TtlCache<String, FetchedAudio>>,
}

impl YtDlpProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary: settings.ytdlp_path.clone(),
            max_duration_secs: settings.max_duration_secs,
            validations: Mutex::new(TtlCache::new(
                settings.validation_cache_entries,
                Duration::from_secs(settings.validation_cache_ttl_secs),
            )),
            downloads: Mutex::new(TtlCache::new(
                settings.download_cache_entries,
                Duration::from_secs(settings.download_cache_ttl_secs),
            )),
        }
    }

    /// Run yt-dlp and return its stdout
    fn run(&self, args: &[&str]) -> Result<Vec<u8>, SourceError> {
        debug!("{} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SourceError::fetch(format!("failed to launch {}: {}", self.binary, e)))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(&String::from_utf8_lossy(&output.stderr)))
        }
    }

    fn lookup(&self, link: &str) -> Result<SourceMetadata, SourceError> {
        let stdout = self.run(&[
            "--dump-json",
            "--no-playlist",
            "--no-warnings",
            "-f",
            "bestaudio",
            link,
        ])?;
        let info: VideoInfo = serde_json::from_slice(&stdout)
            .map_err(|e| SourceError::fetch(format!("unreadable media info: {}", e)))?;
        classify_info(&info, self.max_duration_secs)
    }
}

impl SourceProvider for YtDlpProvider {
    fn validate(&self, link: &str) -> Result<SourceMetadata, SourceError> {
        let key = link.to_string();
        if let Some(cached) = self
            .validations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            debug!("validation cache hit: {}", link);
            return cached;
        }

        let result = self.lookup(link);
        if let Err(e) = &result {
            warn!("Validation failed for {}: {}", link, e);
        }
        self.validations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, result.clone());
        result
    }

    fn fetch(&self, link: &str, dest_dir: &Path) -> Result<FetchedAudio, SourceError> {
        let key = link.to_string();
        if let Some(cached) = self
            .downloads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            if cached.path.exists() {
                debug!("download cache hit: {}", link);
                return Ok(cached);
            }
        }

        let metadata = self.validate(link)?;

        let id = Uuid::new_v4();
        let template = dest_dir.join(format!("{}.%(ext)s", id));
        let template = template.to_string_lossy();
        self.run(&[
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "-x",
            "--audio-format",
            "wav",
            "--audio-quality",
            "192K",
            "-o",
            &template,
            link,
        ])?;

        let path = dest_dir.join(format!("{}.wav", id));
        if !path.exists() {
            return Err(SourceError::fetch(format!(
                "yt-dlp finished but {} is missing",
                path.display()
            )));
        }

        info!("Successfully downloaded: {}", metadata.title);
        let fetched = FetchedAudio { path, metadata };
        self.downloads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, fetched.clone());
        Ok(fetched)
    }
}
