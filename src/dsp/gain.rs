//! Gain-Staging Stage
//!
//! Turns the dry level (a linear fraction) into a dB attenuation for the
//! whole clip.

use crate::dsp::stage::Stage;
use crate::engine::{db_to_linear, AudioClip};
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Dry levels below this are treated as this (-40 dB)
pub const MIN_DRY_LEVEL: f64 = 0.01;

// ============================================================================
// Helper Functions
// ============================================================================

/// Attenuation for a dry level, or `None` when the level leaves the clip alone
///
/// ```
/// use lofi::dsp::dry_gain_db;
///
/// assert_eq!(dry_gain_db(1.0), None);
/// assert!((dry_gain_db(0.0).unwrap() + 40.0).abs() < 1e-9);
/// ```
pub fn dry_gain_db(dry_level: f64) -> Option<f64> {
    if dry_level >= 1.0 {
        None
    } else {
        Some(20.0 * dry_level.max(MIN_DRY_LEVEL).log10())
    }
}

/// Apply a fixed gain in dB, saturating to the clip's format
pub fn apply_gain_db(clip: &AudioClip, gain_db: f64) -> Result<AudioClip> {
    let gain = db_to_linear(gain_db) as f32;
    let format = clip.format();
    let samples = clip
        .samples()
        .iter()
        .map(|&s| format.saturate(s * gain))
        .collect();
    clip.with_samples(samples)
}

/// Attenuate a clip by its dry level
///
/// `dry_level >= 1.0` returns an exact copy.
pub fn apply_dry_level(clip: &AudioClip, dry_level: f64) -> Result<AudioClip> {
    match dry_gain_db(dry_level) {
        Some(gain_db) => apply_gain_db(clip, gain_db),
        None => Ok(clip.clone()),
    }
}

// ============================================================================
// Stage
// ============================================================================

/// Stage wrapper for [`apply_dry_level`]
#[derive(Debug, Clone, Copy)]
pub struct DryLevel {
    pub dry_level: f64,
}

impl Stage for DryLevel {
    fn name(&self) -> &'static str {
        "dry_level"
    }

    fn apply(&self, clip: &AudioClip) -> Result<AudioClip> {
        apply_dry_level(clip, self.dry_level)
    }
}
