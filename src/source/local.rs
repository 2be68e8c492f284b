//! Local file provider
//!
//! Treats a filesystem path (optionally written as a `file://` link) as a
//! source. Used for offline conversions and as the provider in tests.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use uuid::Uuid;

use super::{check_duration, FetchedAudio, SourceError, SourceMetadata, SourceProvider};

/// Serves WAV files already on disk
#[derive(Debug, Clone)]
pub struct LocalFileProvider {
    max_duration_secs: u64,
}

impl LocalFileProvider {
    pub fn new(max_duration_secs: u64) -> Self {
        Self { max_duration_secs }
    }

    fn resolve(link: &str) -> PathBuf {
        PathBuf::from(link.strip_prefix("file://").unwrap_or(link))
    }
}

impl SourceProvider for LocalFileProvider {
    fn validate(&self, link: &str) -> Result<SourceMetadata, SourceError> {
        let path = Self::resolve(link);
        let reader = hound::WavReader::open(&path)
            .map_err(|e| SourceError::fetch(format!("{}: {}", path.display(), e)))?;

        let spec = reader.spec();
        let duration_secs = reader.duration() as f64 / spec.sample_rate.max(1) as f64;
        check_duration(duration_secs, self.max_duration_secs)?;

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(SourceMetadata {
            title,
            artist: "Unknown".to_string(),
            duration_secs,
            thumbnail_url: None,
            view_count: 0,
        })
    }

    fn fetch(&self, link: &str, dest_dir: &Path) -> Result<FetchedAudio, SourceError> {
        let metadata = self.validate(link)?;
        let source = Self::resolve(link);
        let path = dest_dir.join(format!("{}.wav", Uuid::new_v4()));

        fs::copy(&source, &path)
            .map_err(|e| SourceError::fetch(format!("copy failed: {}", e)))?;
        info!("Fetched local source: {}", metadata.title);

        Ok(FetchedAudio { path, metadata })
    }
}
