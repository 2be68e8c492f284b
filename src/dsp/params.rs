//! Effect parameters and preset bundles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LofiError, Result};

/// The six values that drive one lofi conversion
///
/// Immutable once built; each processing call owns its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParameters {
    /// Reverb room size (0.0 to 1.0); gates which taps are audible
    pub room_size: f64,
    /// Reverb damping (0.0 to 1.0); higher values silence later taps
    pub damping: f64,
    /// Wet level; zero or below disables the reverb stage
    pub wet_level: f64,
    /// Dry level; below 1.0 attenuates the whole clip
    pub dry_level: f64,
    /// Base tap spacing in milliseconds; zero disables the reverb stage
    pub delay_ms: u32,
    /// How much to slow down (0.0 to 0.3 is the useful range)
    pub slow_factor: f64,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            room_size: 0.75,
            damping: 0.5,
            wet_level: 0.08,
            dry_level: 0.2,
            delay_ms: 2,
            slow_factor: 0.08,
        }
    }
}

impl EffectParameters {
    /// Check that the parameters can drive the pipeline
    ///
    /// Out-of-range wet and dry levels are accepted: the reverb treats a
    /// non-positive wet level as "off" and the gain stage floors the dry
    /// level, so both have well-defined behavior.
    pub fn validate(&self) -> Result<()> {
        check_unit("room_size", self.room_size)?;
        check_unit("damping", self.damping)?;
        check_finite("wet_level", self.wet_level)?;
        check_finite("dry_level", self.dry_level)?;
        check_finite("slow_factor", self.slow_factor)?;
        if !(0.0..1.0).contains(&self.slow_factor) {
            return Err(LofiError::InvalidParameter {
                name: "slow_factor",
                reason: format!("{} is outside [0, 1)", self.slow_factor),
            });
        }
        Ok(())
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LofiError::InvalidParameter {
            name,
            reason: format!("{} is not a finite number", value),
        })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LofiError::InvalidParameter {
            name,
            reason: format!("{} is outside [0, 1]", value),
        })
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Named parameter bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Big room, long taps, noticeably slower
    Dreamy,
    /// Light touch
    Chill,
    /// Everything turned up
    Ambient,
    #[default]
    Default,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Dreamy, Preset::Chill, Preset::Ambient, Preset::Default];

    /// The literal parameter bundle for this preset
    pub fn parameters(&self) -> EffectParameters {
        match self {
            Preset::Dreamy => EffectParameters {
                room_size: 0.9,
                damping: 0.3,
                wet_level: 0.12,
                dry_level: 0.15,
                delay_ms: 5,
                slow_factor: 0.12,
            },
            Preset::Chill => EffectParameters {
                room_size: 0.6,
                damping: 0.6,
                wet_level: 0.06,
                dry_level: 0.25,
                delay_ms: 2,
                slow_factor: 0.06,
            },
            Preset::Ambient => EffectParameters {
                room_size: 1.0,
                damping: 0.2,
                wet_level: 0.15,
                dry_level: 0.1,
                delay_ms: 8,
                slow_factor: 0.15,
            },
            Preset::Default => EffectParameters::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Dreamy => "dreamy",
            Preset::Chill => "chill",
            Preset::Ambient => "ambient",
            Preset::Default => "default",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = LofiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dreamy" => Ok(Preset::Dreamy),
            "chill" => Ok(Preset::Chill),
            "ambient" => Ok(Preset::Ambient),
            "default" => Ok(Preset::Default),
            other => Err(LofiError::InvalidParameter {
                name: "preset",
                reason: format!(
                    "unknown preset '{}' (expected dreamy, chill, ambient or default)",
                    other
                ),
            }),
        }
    }
}
