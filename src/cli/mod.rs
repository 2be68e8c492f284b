//! CLI Module
//!
//! Command-line interface for the lofi converter.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dsp::{EffectParameters, Preset};

/// Lofi Converter - slowed + reverb audio from files or links
#[derive(Parser, Debug)]
#[command(name = "lofi-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the lofi effect to a local WAV file
    #[command(name = "convert")]
    Convert {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (defaults to <stem>_lofi.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write an MP3 next to the output
        #[arg(long)]
        mp3: bool,

        #[command(flatten)]
        effect: EffectArgs,
    },

    /// Download a link and convert it
    #[command(name = "fetch")]
    Fetch {
        /// Media link
        link: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        effect: EffectArgs,
    },

    /// Check whether a link can be converted
    #[command(name = "validate")]
    Validate {
        /// Media link
        link: String,
    },

    /// List the built-in presets
    #[command(name = "presets")]
    Presets,
}

/// Preset selection plus per-parameter overrides
#[derive(Args, Debug, Default, Clone)]
pub struct EffectArgs {
    /// Base preset: dreamy, chill, ambient or default
    #[arg(short, long, default_value = "default")]
    pub preset: Preset,

    #[arg(long)]
    pub room_size: Option<f64>,

    #[arg(long)]
    pub damping: Option<f64>,

    #[arg(long)]
    pub wet_level: Option<f64>,

    #[arg(long)]
    pub dry_level: Option<f64>,

    /// Base tap delay in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u32>,

    /// Fraction to slow down by, in [0, 1)
    #[arg(long)]
    pub slow_factor: Option<f64>,
}

impl EffectArgs {
    /// Resolve the preset and apply overrides
    pub fn to_params(&self) -> EffectParameters {
        let base = self.preset.parameters();
        EffectParameters {
            room_size: self.room_size.unwrap_or(base.room_size),
            damping: self.damping.unwrap_or(base.damping),
            wet_level: self.wet_level.unwrap_or(base.wet_level),
            dry_level: self.dry_level.unwrap_or(base.dry_level),
            delay_ms: self.delay_ms.unwrap_or(base.delay_ms),
            slow_factor: self.slow_factor.unwrap_or(base.slow_factor),
        }
    }
}
