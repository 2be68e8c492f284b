//! Lofi - Slowed + Reverb Audio Converter
//!
//! Turns a track into its "slowed + reverb" version: slowed down, given a
//! short multi-tap echo, attenuated, low-passed and normalized.
//!
//! # Architecture
//!
//! - `engine`: PCM clip type, WAV I/O and MP3 previews
//! - `dsp`: the effect stages and the best-effort pipeline
//! - `source`: turning links into local WAV files
//! - `converter`: the link-to-lofi host over a workspace directory

pub mod cli;
pub mod config;
pub mod converter;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod source;

pub use error::{LofiError, Result};
