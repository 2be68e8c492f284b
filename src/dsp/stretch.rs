//! Time-Stretch Stage
//!
//! Slows a clip down by pretending it was recorded at a lower sample rate
//! and resampling it back to the original rate. Playback gets longer by
//! roughly `1 / (1 - slow_factor)` and pitch drops by the same ratio. This
//! is the "slowed" half of slowed + reverb, not a pitch-preserving stretch.

use crate::dsp::stage::Stage;
use crate::engine::AudioClip;
use crate::error::{LofiError, Result};

/// Longest output allowed, as a multiple of the input length
pub const MAX_STRETCH_RATIO: f64 = 4.0;

/// Slow a clip down by `slow_factor`
///
/// `slow_factor == 0` returns an exact copy.
///
/// # Errors
/// * `InvalidParameter` - `slow_factor` outside [0, 1)
/// * `ProcessingError` - the reinterpreted rate rounds down to 0 Hz, or the
///   output would be more than [`MAX_STRETCH_RATIO`] times the input length
pub fn stretch(clip: &AudioClip, slow_factor: f64) -> Result<AudioClip> {
    if slow_factor == 0.0 {
        return Ok(clip.clone());
    }
    if !(0.0..1.0).contains(&slow_factor) {
        return Err(LofiError::InvalidParameter {
            name: "slow_factor",
            reason: format!("{} is outside [0, 1)", slow_factor),
        });
    }

    let rate = clip.sample_rate();
    let reinterpreted = reinterpreted_rate(rate, slow_factor);
    if reinterpreted == 0 {
        return Err(LofiError::ProcessingError {
            reason: format!(
                "slow factor {} leaves no usable sample rate at {} Hz",
                slow_factor, rate
            ),
        });
    }

    let ratio = rate as f64 / reinterpreted as f64;
    if ratio > MAX_STRETCH_RATIO {
        return Err(LofiError::ProcessingError {
            reason: format!(
                "slow factor {} would stretch the clip {:.1}x (limit {}x)",
                slow_factor, ratio, MAX_STRETCH_RATIO
            ),
        });
    }

    let samples = resample_linear(
        clip.samples(),
        clip.channels() as usize,
        reinterpreted,
        rate,
    );
    clip.with_samples(samples)
}

/// The rate the raw samples are reinterpreted at before resampling
pub fn reinterpreted_rate(sample_rate: u32, slow_factor: f64) -> u32 {
    (sample_rate as f64 * (1.0 - slow_factor)).floor() as u32
}

/// Linear interpolation resampling of interleaved frames
///
/// Frames are mapped from `source_rate` to `target_rate`; channels are
/// interpolated independently.
fn resample_linear(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let source_frames = samples.len() / channels;
    if source_frames == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_frames * channels);

    for i in 0..target_frames {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        for ch in 0..channels {
            let sample = if src_idx + 1 < source_frames {
                let a = samples[src_idx * channels + ch];
                let b = samples[(src_idx + 1) * channels + ch];
                a * (1.0 - frac) + b * frac
            } else if src_idx < source_frames {
                samples[src_idx * channels + ch]
            } else {
                0.0
            };
            output.push(sample);
        }
    }

    output
}

/// Stage wrapper for [`stretch`]
#[derive(Debug, Clone, Copy)]
pub struct TimeStretch {
    pub slow_factor: f64,
}

impl Stage for TimeStretch {
    fn name(&self) -> &'static str {
        "time_stretch"
    }

    fn apply(&self, clip: &AudioClip) -> Result<AudioClip> {
        stretch(clip, self.slow_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_stereo_test_tone, generate_test_tone, SampleFormat};

    fn zero_crossings(samples: impl Iterator<Item = f32>) -> usize {
        let mut count = 0;
        let mut prev: Option<f32> = None;
        for s in samples {
            if let Some(p) = prev {
                if (p < 0.0) != (s < 0.0) {
                    count += 1;
                }
            }
            prev = Some(s);
        }
        count
    }

    #[test]
    fn test_zero_factor_is_identity() {
        let clip = generate_test_tone(440.0, 0.5, 44100);
        let out = stretch(&clip, 0.0).unwrap();
        assert_eq!(out, clip);
    }

    #[test]
    fn test_reinterpreted_rate() {
        assert_eq!(reinterpreted_rate(44100, 0.08), 40572);
        assert_eq!(reinterpreted_rate(48000, 0.25), 36000);
        assert_eq!(reinterpreted_rate(1, 0.5), 0);
    }

    #[test]
    fn test_lengthens_and_keeps_rate_label() {
        let clip = generate_test_tone(440.0, 1.0, 44100);
        let out = stretch(&clip, 0.08).unwrap();

        assert_eq!(out.sample_rate(), 44100);
        assert_eq!(out.format(), clip.format());

        let expected = clip.num_frames() as f64 * 44100.0 / 40572.0;
        assert!(
            (out.num_frames() as f64 - expected).abs() <= 1.0,
            "expected ~{} frames, got {}",
            expected,
            out.num_frames()
        );
        assert!(out.duration_secs() > clip.duration_secs());
    }

    #[test]
    fn test_pitch_drops_with_speed() {
        // Same number of cycles spread over more frames means a lower pitch
        let clip = generate_test_tone(1000.0, 1.0, 44100);
        let out = stretch(&clip, 0.2).unwrap();

        let before = zero_crossings(clip.channel(0));
        let after = zero_crossings(out.channel(0));
        assert!(
            (before as i64 - after as i64).abs() <= 2,
            "cycle count changed: {} vs {}",
            before,
            after
        );
        assert!(out.num_frames() > clip.num_frames());
    }

    #[test]
    fn test_stereo_channels_stay_separate() {
        let clip = generate_stereo_test_tone(200.0, 3000.0, 0.25, 44100);
        let out = stretch(&clip, 0.1).unwrap();

        assert_eq!(out.channels(), 2);
        let left = zero_crossings(out.channel(0));
        let right = zero_crossings(out.channel(1));
        assert!(right > left * 10);
    }

    #[test]
    fn test_rejects_out_of_range_factor() {
        let clip = generate_test_tone(440.0, 0.1, 44100);
        assert!(stretch(&clip, 1.0).is_err());
        assert!(stretch(&clip, -0.1).is_err());
    }

    #[test]
    fn test_extreme_factor_is_refused_before_allocating() {
        let clip = generate_test_tone(440.0, 0.1, 44100);

        assert!(stretch(&clip, 0.75).is_ok());
        match stretch(&clip, 0.9999) {
            Err(LofiError::ProcessingError { reason }) => assert!(reason.contains("limit")),
            other => panic!("expected ProcessingError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_clip() {
        let clip = AudioClip::from_interleaved(Vec::new(), 44100, 1, SampleFormat::I16).unwrap();
        let out = stretch(&clip, 0.1).unwrap();
        assert!(out.is_empty());
    }
}
