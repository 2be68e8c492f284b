//! Error handling for the lofi converter
//!
//! Every error carries a stable code and, where it helps, recovery
//! suggestions that the CLI prints alongside the message.

use thiserror::Error;

use crate::source::SourceError;

/// Result type alias for lofi operations
pub type Result<T> = std::result::Result<T, LofiError>;

/// Main error type for lofi operations
#[derive(Error, Debug)]
pub enum LofiError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Processing Errors
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Processing error: {reason}")]
    ProcessingError { reason: String },

    #[error("DSP overflow: stage '{stage}' produced invalid audio (NaN/Inf)")]
    DspOverflow { stage: String },

    // Source Errors
    #[error(transparent)]
    Source(#[from] SourceError),

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LofiError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LofiError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LofiError::InvalidAudio { .. } => "INVALID_AUDIO",
            LofiError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            LofiError::EmptyAudio => "EMPTY_AUDIO",
            LofiError::InvalidParameter { .. } => "INVALID_PARAMETER",
            LofiError::ProcessingError { .. } => "PROCESSING_ERROR",
            LofiError::DspOverflow { .. } => "DSP_OVERFLOW",
            LofiError::Source(e) => e.error_code(),
            LofiError::Config { .. } => "CONFIG_ERROR",
            LofiError::Io(_) => "IO_ERROR",
            LofiError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can fix this error by changing their input
    pub fn is_recoverable(&self) -> bool {
        match self {
            LofiError::FileNotFound { .. } => true,
            LofiError::InvalidAudio { .. } => true,
            LofiError::UnsupportedFormat { .. } => true,
            LofiError::InvalidParameter { .. } => true,
            LofiError::DspOverflow { .. } => true,
            LofiError::Config { .. } => true,
            LofiError::Source(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LofiError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            LofiError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try downloading it again",
            ],
            LofiError::UnsupportedFormat { .. } => vec![
                "Convert to a mono or stereo PCM WAV file",
                "Supported sample formats: 8/16/24/32-bit integer, 32-bit float",
            ],
            LofiError::InvalidParameter { .. } => vec![
                "Room size and damping must be between 0 and 1",
                "Slow factor must be at least 0 and below 1 (0.0 - 0.3 sounds best)",
                "Use --preset to start from a known-good bundle",
            ],
            LofiError::DspOverflow { .. } => vec![
                "The effect settings may be too extreme",
                "Try a lower wet level or a preset",
            ],
            LofiError::Source(_) => vec![
                "Check the link opens in a browser",
                "Only public videos up to 10 minutes are supported",
            ],
            LofiError::Config { .. } => vec![
                "Check the JSON syntax of the config file",
                "Numeric LOFI_* environment variables must be plain numbers",
            ],
            _ => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            LofiError::FileNotFound { path, .. } => {
                format!("I couldn't find the file at '{}'.", path)
            }
            LofiError::InvalidAudio { reason, .. } => {
                format!("This file doesn't appear to be valid audio: {}", reason)
            }
            LofiError::Source(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}
