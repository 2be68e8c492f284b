//! Compressed preview encoding
//!
//! WAV-to-MP3 conversion is delegated to an external `ffmpeg` process.
//! Conversion is best-effort: any failure hands back the WAV path so the
//! caller always has something playable.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{info, warn};

use crate::config::Settings;
use crate::error::{LofiError, Result};

/// Convert a WAV file to an MP3 sibling, falling back to the WAV path
pub fn to_compressed(wav: &Path, settings: &Settings) -> PathBuf {
    let target = wav.with_extension("mp3");
    match encode_mp3(
        wav,
        &target,
        &settings.ffmpeg_path,
        settings.preview_bitrate_kbps,
    ) {
        Ok(()) => {
            info!("Encoded preview: {}", target.display());
            target
        }
        Err(e) => {
            warn!("Error converting {} to MP3: {}", wav.display(), e);
            wav.to_path_buf()
        }
    }
}

/// Run ffmpeg to encode `input` as MP3 at `bitrate_kbps`
pub fn encode_mp3(input: &Path, output: &Path, ffmpeg: &str, bitrate_kbps: u32) -> Result<()> {
    if !input.exists() {
        return Err(LofiError::FileNotFound {
            path: input.display().to_string(),
            source: None,
        });
    }

    let result = Command::new(ffmpeg)
        .args(ffmpeg_args(input, output, bitrate_kbps))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| LofiError::ProcessingError {
            reason: format!("Failed to launch '{}': {}", ffmpeg, e),
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(LofiError::ProcessingError {
            reason: format!("ffmpeg exited with {}: {}", result.status, stderr.trim()),
        });
    }

    if !output.exists() {
        return Err(LofiError::ProcessingError {
            reason: format!("ffmpeg produced no file at {}", output.display()),
        });
    }

    Ok(())
}

fn ffmpeg_args(input: &Path, output: &Path, bitrate_kbps: u32) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-vn".to_string(),
        "-codec:a".to_string(),
        "libmp3lame".to_string(),
        "-b:a".to_string(),
        format!("{}k", bitrate_kbps),
        output.display().to_string(),
    ]
}
