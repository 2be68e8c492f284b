//! Tone-Shaping Stage
//!
//! Warms the clip up with a gentle low-pass, then brings the peak back up
//! to just under full scale. Filtering runs first so the normalizer sees
//! the filtered peak.

use std::f64::consts::PI;

use crate::dsp::stage::Stage;
use crate::engine::{db_to_linear, AudioClip};
use crate::error::Result;

/// Fixed low-pass cutoff for the lofi tone
pub const LOW_PASS_CUTOFF_HZ: f64 = 8000.0;

/// Headroom left below full scale by normalization
pub const NORMALIZE_HEADROOM_DB: f64 = 0.1;

/// One-pole RC low-pass filter
///
/// `y[n] = y[n-1] + alpha * (x[n] - y[n-1])` with
/// `alpha = dt / (RC + dt)`, `RC = 1 / (2 pi fc)`. The first frame passes
/// through untouched. Channels are filtered independently.
pub fn low_pass(clip: &AudioClip, cutoff_hz: f64) -> Result<AudioClip> {
    let channels = clip.channels() as usize;
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let dt = 1.0 / clip.sample_rate() as f64;
    let alpha = dt / (rc + dt);

    let mut filtered = Vec::with_capacity(clip.samples().len());
    let mut last = vec![0.0_f64; channels];

    for (frame_idx, frame) in clip.samples().chunks_exact(channels).enumerate() {
        for (ch, &x) in frame.iter().enumerate() {
            let x = x as f64;
            last[ch] = if frame_idx == 0 {
                x
            } else {
                last[ch] + alpha * (x - last[ch])
            };
            filtered.push(last[ch] as f32);
        }
    }

    clip.with_samples(filtered)
}

/// Scale the clip so its peak sits `headroom_db` below full scale
///
/// Silent clips come back unchanged. The result never exceeds the format
/// ceiling.
pub fn normalize(clip: &AudioClip, headroom_db: f64) -> Result<AudioClip> {
    let peak = clip.peak();
    if peak == 0.0 {
        return Ok(clip.clone());
    }

    let format = clip.format();
    let target = (db_to_linear(-headroom_db) as f32).min(format.ceiling());
    let gain = target / peak;

    let samples = clip
        .samples()
        .iter()
        .map(|&s| format.saturate(s * gain))
        .collect();
    clip.with_samples(samples)
}

/// Low-pass at [`LOW_PASS_CUTOFF_HZ`], then normalize
pub fn shape_tone(clip: &AudioClip) -> Result<AudioClip> {
    let filtered = low_pass(clip, LOW_PASS_CUTOFF_HZ)?;
    normalize(&filtered, NORMALIZE_HEADROOM_DB)
}

/// Stage wrapper for [`shape_tone`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneShaper;

impl Stage for ToneShaper {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn apply(&self, clip: &AudioClip) -> Result<AudioClip> {
        shape_tone(clip)
    }
}
