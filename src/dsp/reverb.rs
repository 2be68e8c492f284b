//! Multi-Tap Delay/Reverb Stage
//!
//! A pseudo-reverb built from up to three delayed, attenuated copies of the
//! signal. Taps compound: each tap is cut from the signal as it stands after
//! the previous taps were mixed in, so later taps carry echoes of earlier
//! ones.
//!
//! Tap `i` (0-based):
//! - starts `delay_ms * (i + 1)` milliseconds late
//! - is attenuated by `20 * (i + 1)` dB
//! - is only mixed in when `room_size * (1 - damping)^(i + 1) > 0.01`
//!
//! `room_size` and `damping` decide which taps play; they never scale a
//! tap's level.

use log::debug;

use crate::dsp::stage::Stage;
use crate::engine::{db_to_linear, AudioClip, SampleFormat};
use crate::error::Result;

/// Maximum number of taps
pub const TAP_COUNT: usize = 3;

/// Taps whose decay is at or below this are inaudible and skipped
pub const MIN_TAP_DECAY: f64 = 0.01;

/// Attenuation added per tap index, in dB
pub const TAP_ATTENUATION_STEP_DB: f64 = 20.0;

/// Decay factor of tap `tap` (0-based)
pub fn tap_decay(room_size: f64, damping: f64, tap: usize) -> f64 {
    room_size * (1.0 - damping).powi(tap as i32 + 1)
}

/// Indices of the taps that pass the audibility gate, in mixing order
pub fn active_taps(room_size: f64, damping: f64) -> Vec<usize> {
    (0..TAP_COUNT)
        .filter(|&tap| tap_decay(room_size, damping, tap) > MIN_TAP_DECAY)
        .collect()
}

/// Gain applied to tap `tap`, in dB
pub fn tap_gain_db(tap: usize) -> f64 {
    -TAP_ATTENUATION_STEP_DB * (tap + 1) as f64
}

/// Mix the delayed taps onto `clip`
///
/// Returns an exact copy when `wet_level <= 0` or `delay_ms == 0`. The
/// output always has the same length as the input.
pub fn apply_reverb(
    clip: &AudioClip,
    room_size: f64,
    damping: f64,
    wet_level: f64,
    delay_ms: u32,
) -> Result<AudioClip> {
    if wet_level <= 0.0 || delay_ms == 0 {
        return Ok(clip.clone());
    }

    let channels = clip.channels() as usize;
    let mut accumulated = clip.samples().to_vec();

    for tap in active_taps(room_size, damping) {
        let tap_delay_ms = delay_ms as u64 * (tap as u64 + 1);
        let offset = clip.frames_for_ms(tap_delay_ms) * channels;
        let gain = db_to_linear(tap_gain_db(tap)) as f32;
        debug!(
            "reverb tap {}: {} ms delay, {:.1} dB",
            tap,
            tap_delay_ms,
            tap_gain_db(tap)
        );
        accumulated = overlay_delayed(&accumulated, offset, gain, clip.format());
    }

    clip.with_samples(accumulated)
}

/// Overlay `signal`, delayed by `offset` samples and scaled by `gain`, onto
/// itself
///
/// The delayed copy is truncated to the signal's length. Sums saturate to
/// the format's representable range.
fn overlay_delayed(signal: &[f32], offset: usize, gain: f32, format: SampleFormat) -> Vec<f32> {
    let mut mixed = signal.to_vec();
    if offset >= signal.len() {
        return mixed;
    }
    for (out, (&dry, &delayed)) in mixed[offset..]
        .iter_mut()
        .zip(signal[offset..].iter().zip(signal.iter()))
    {
        *out = format.saturate(dry + delayed * gain);
    }
    mixed
}

/// Stage wrapper for [`apply_reverb`]
#[derive(Debug, Clone, Copy)]
pub struct MultiTapReverb {
    pub room_size: f64,
    pub damping: f64,
    pub wet_level: f64,
    pub delay_ms: u32,
}

impl Stage for MultiTapReverb {
    fn name(&self) -> &'static str {
        "reverb"
    }

    fn apply(&self, clip: &AudioClip) -> Result<AudioClip> {
        apply_reverb(
            clip,
            self.room_size,
            self.damping,
            self.wet_level,
            self.delay_ms,
        )
    }
}
