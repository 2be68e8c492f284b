//! Converter host
//!
//! Glues a [`SourceProvider`] to the processing pipeline: fetch a link into
//! the workspace, render the lofi version and produce compressed previews of
//! both. Each request gets its own `uuid` so concurrent conversions never
//! share files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::dsp::{process, EffectParameters, ProcessingResult};
use crate::engine::to_compressed;
use crate::error::Result;
use crate::source::{SourceMetadata, SourceProvider};

/// Suffix appended to the stem of rendered files
pub const LOFI_SUFFIX: &str = "_lofi";

/// Everything produced by one link conversion
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub id: Uuid,
    pub metadata: SourceMetadata,
    pub source_wav: PathBuf,
    /// MP3 of the source, or `source_wav` if encoding failed
    pub source_preview: PathBuf,
    pub lofi_wav: PathBuf,
    /// MP3 of the lofi render, or `lofi_wav` if encoding failed
    pub lofi_preview: PathBuf,
    /// True when processing failed and `lofi_wav` is a copy of the source
    pub passthrough: bool,
    pub params: EffectParameters,
    pub created_at: DateTime<Utc>,
}

/// Where the lofi render of `input` is written: `<stem>_lofi.wav` beside it
pub fn lofi_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    input.with_file_name(format!("{}{}.wav", stem, LOFI_SUFFIX))
}

/// Files deleted when the guard goes out of scope
///
/// Call [`TempFiles::keep`] to hand the files over instead.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Disarm the guard, returning the tracked paths
    pub fn keep(mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            match fs::remove_file(path) {
                Ok(()) => info!("Deleted temporary file: {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Error deleting temporary file {}: {}", path.display(), e),
            }
        }
    }
}

/// Link-to-lofi converter over a workspace directory
pub struct LofiConverter<P> {
    settings: Settings,
    provider: P,
}

impl<P: SourceProvider> LofiConverter<P> {
    /// Create a converter, creating the workspace directory if needed
    pub fn new(settings: Settings, provider: P) -> Result<Self> {
        fs::create_dir_all(&settings.workspace_dir)?;
        Ok(Self { settings, provider })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn workspace(&self) -> &Path {
        &self.settings.workspace_dir
    }

    /// Check a link without downloading it
    pub fn validate(&self, link: &str) -> Result<SourceMetadata> {
        Ok(self.provider.validate(link)?)
    }

    /// Render `<stem>_lofi.wav` next to `input`
    pub fn process_file(&self, input: &Path, params: &EffectParameters) -> Result<ProcessingResult> {
        process(input, &lofi_output_path(input), params)
    }

    /// Fetch `link`, render it and encode previews of source and result
    ///
    /// # Errors
    /// * `Source` - the provider rejected the link
    /// * `FileNotFound` - the fetched file vanished before processing
    pub fn convert_link(&self, link: &str, params: &EffectParameters) -> Result<Conversion> {
        let id = Uuid::new_v4();
        info!("[{}] Converting {}", id, link);

        let fetched = self.provider.fetch(link, self.workspace())?;
        let mut temp = TempFiles::new();
        temp.track(&fetched.path);

        let source_preview = to_compressed(&fetched.path, &self.settings);
        if source_preview != fetched.path {
            temp.track(&source_preview);
        }

        let result = self.process_file(&fetched.path, params)?;
        let passthrough = result.is_passthrough();
        let lofi_wav = result.into_path();
        temp.track(&lofi_wav);

        let lofi_preview = to_compressed(&lofi_wav, &self.settings);
        temp.keep();

        info!(
            "[{}] Finished '{}'{}",
            id,
            fetched.metadata.title,
            if passthrough { " (unprocessed)" } else { "" }
        );

        Ok(Conversion {
            id,
            metadata: fetched.metadata,
            source_wav: fetched.path,
            source_preview,
            lofi_wav,
            lofi_preview,
            passthrough,
            params: *params,
            created_at: Utc::now(),
        })
    }

    /// Delete workspace files last modified at least `max_age` ago
    ///
    /// Returns the number of files removed.
    pub fn sweep_stale(&self, max_age: Duration) -> Result<usize> {
        let dir = self.workspace();
        if !dir.exists() {
            return Ok(0);
        }

        let stale: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .metadata()
                    .ok()
                    .and_then(|meta| meta.modified().ok())
                    .and_then(|modified| modified.elapsed().ok())
                    .map(|age| age >= max_age)
                    .unwrap_or(false)
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();

        let mut removed = 0;
        for path in stale {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted stale file: {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Error deleting stale file {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{decode_wav, encode_wav, generate_test_tone};
    use crate::error::LofiError;
    use crate::source::{FetchedAudio, LocalFileProvider, SourceError};
    use tempfile::tempdir;

    struct Rejecting(SourceError);

    impl SourceProvider for Rejecting {
        fn validate(&self, _link: &str) -> std::result::Result<SourceMetadata, SourceError> {
            Err(self.0.clone())
        }

        fn fetch(
            &self,
            _link: &str,
            _dest_dir: &Path,
        ) -> std::result::Result<FetchedAudio, SourceError> {
            Err(self.0.clone())
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            workspace_dir: dir.join("workspace"),
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_lofi_output_path() {
        assert_eq!(
            lofi_output_path(Path::new("/tmp/abc/song.wav")),
            PathBuf::from("/tmp/abc/song_lofi.wav")
        );
    }

    #[test]
    fn test_new_creates_workspace() {
        let dir = tempdir().unwrap();
        let converter = LofiConverter::new(settings_in(dir.path()), LocalFileProvider::new(600)).unwrap();
        assert!(converter.workspace().is_dir());
    }

    #[test]
    fn test_convert_local_link() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("tune.wav");
        encode_wav(&generate_test_tone(330.0, 1.0, 8000), &source).unwrap();

        let converter = LofiConverter::new(settings_in(dir.path()), LocalFileProvider::new(600)).unwrap();
        let params = EffectParameters::default();
        let conversion = converter
            .convert_link(source.to_str().unwrap(), &params)
            .unwrap();

        assert!(!conversion.passthrough);
        assert_eq!(conversion.metadata.title, "tune");
        assert!(conversion.source_wav.starts_with(converter.workspace()));
        // No ffmpeg: previews fall back to the WAV files
        assert_eq!(conversion.source_preview, conversion.source_wav);
        assert_eq!(conversion.lofi_preview, conversion.lofi_wav);

        let rendered = decode_wav(&conversion.lofi_wav).unwrap();
        assert!(rendered.num_frames() > 8000);
    }

    #[test]
    fn test_rejection_is_source_error() {
        let dir = tempdir().unwrap();
        let converter =
            LofiConverter::new(settings_in(dir.path()), Rejecting(SourceError::AgeRestricted)).unwrap();

        let err = converter
            .convert_link("https://example.com/v", &EffectParameters::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "AGE_RESTRICTED");
        assert!(matches!(converter.validate("x"), Err(LofiError::Source(_))));
    }

    #[test]
    fn test_temp_files_guard() {
        let dir = tempdir().unwrap();
        let doomed = dir.path().join("doomed.wav");
        let kept = dir.path().join("kept.wav");
        fs::write(&doomed, b"x").unwrap();
        fs::write(&kept, b"x").unwrap();

        {
            let mut temp = TempFiles::new();
            temp.track(&doomed);
            temp.track(dir.path().join("never-created.wav"));
            assert_eq!(temp.len(), 2);
        }
        let mut temp = TempFiles::new();
        temp.track(&kept);
        assert_eq!(temp.keep(), vec![kept.clone()]);

        assert!(!doomed.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_sweep_stale() {
        let dir = tempdir().unwrap();
        let converter = LofiConverter::new(settings_in(dir.path()), LocalFileProvider::new(600)).unwrap();
        fs::write(converter.workspace().join("a.wav"), b"a").unwrap();
        fs::write(converter.workspace().join("b.mp3"), b"b").unwrap();

        assert_eq!(converter.sweep_stale(Duration::from_secs(3600)).unwrap(), 0);
        assert_eq!(converter.sweep_stale(Duration::ZERO).unwrap(), 2);
        assert_eq!(fs::read_dir(converter.workspace()).unwrap().count(), 0);
    }
}
