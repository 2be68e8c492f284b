//! Audio Clip
//!
//! The in-memory PCM representation every pipeline stage consumes and
//! produces. Samples are interleaved `f32` values normalized to [-1.0, 1.0]
//! regardless of the on-disk sample format; the format is carried along so
//! that encoding writes the same format back out.

use hound::WavSpec;

use crate::error::{LofiError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -infinity for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Sample Format
// ============================================================================

/// On-disk sample format of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleFormat {
    I8,
    #[default]
    I16,
    I24,
    I32,
    F32,
}

impl SampleFormat {
    /// Map a WAV spec onto a sample format
    pub fn from_wav_spec(spec: &WavSpec) -> Result<Self> {
        match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 8) => Ok(SampleFormat::I8),
            (hound::SampleFormat::Int, 16) => Ok(SampleFormat::I16),
            (hound::SampleFormat::Int, 24) => Ok(SampleFormat::I24),
            (hound::SampleFormat::Int, 32) => Ok(SampleFormat::I32),
            (hound::SampleFormat::Float, 32) => Ok(SampleFormat::F32),
            (kind, bits) => Err(LofiError::UnsupportedFormat {
                format: format!("{}-bit {:?} audio", bits, kind),
            }),
        }
    }

    /// Bits per sample on disk
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::I8 => 8,
            SampleFormat::I16 => 16,
            SampleFormat::I24 => 24,
            SampleFormat::I32 | SampleFormat::F32 => 32,
        }
    }

    /// Whether samples are stored as IEEE floats
    pub fn is_float(&self) -> bool {
        matches!(self, SampleFormat::F32)
    }

    /// Full-scale value of the integer representation (2^(bits-1))
    pub fn full_scale(&self) -> f64 {
        match self {
            SampleFormat::F32 => 1.0,
            _ => (1_u64 << (self.bits_per_sample() - 1)) as f64,
        }
    }

    /// Largest representable normalized sample
    ///
    /// Integer formats are asymmetric: the positive ceiling is one step
    /// below 1.0 while the floor is exactly -1.0.
    pub fn ceiling(&self) -> f32 {
        match self {
            SampleFormat::F32 => 1.0,
            _ => ((self.full_scale() - 1.0) / self.full_scale()) as f32,
        }
    }

    /// Smallest representable normalized sample
    pub fn floor(&self) -> f32 {
        -1.0
    }

    /// Clamp a sample into the representable range
    #[inline]
    pub fn saturate(&self, sample: f32) -> f32 {
        sample.clamp(self.floor(), self.ceiling())
    }
}

// ============================================================================
// Audio Clip
// ============================================================================

/// Decoded audio held in memory for one conversion request
///
/// Samples are interleaved: `[L0, R0, L1, R1, ...]` for stereo.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
}

impl AudioClip {
    /// Create a silent clip with the given number of frames
    pub fn silent(
        num_frames: usize,
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
    ) -> Result<Self> {
        Self::from_interleaved(
            vec![0.0; num_frames * channels as usize],
            sample_rate,
            channels,
            format,
        )
    }

    /// Create a clip from interleaved samples
    ///
    /// # Errors
    /// * `InvalidAudio` - zero sample rate, zero channels, or a sample count
    ///   that is not a multiple of the channel count
    pub fn from_interleaved(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(LofiError::InvalidAudio {
                reason: "sample rate must be positive".to_string(),
                source: None,
            });
        }
        if channels == 0 {
            return Err(LofiError::InvalidAudio {
                reason: "channel count must be positive".to_string(),
                source: None,
            });
        }
        if samples.len() % channels as usize != 0 {
            return Err(LofiError::InvalidAudio {
                reason: format!(
                    "sample count {} is not divisible by channel count {}",
                    samples.len(),
                    channels
                ),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
            format,
        })
    }

    /// Build a new clip with the same rate, channels and format
    pub(crate) fn with_samples(&self, samples: Vec<f32>) -> Result<Self> {
        Self::from_interleaved(samples, self.sample_rate, self.channels, self.format)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the clip and return its interleaved samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Number of frames covering `ms` milliseconds at this clip's rate
    pub fn frames_for_ms(&self, ms: u64) -> usize {
        (ms * self.sample_rate as u64 / 1000) as usize
    }

    /// Iterate over the samples of one channel
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = f32> + '_ {
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels as usize)
            .copied()
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> f64 {
        linear_to_db(self.peak() as f64)
    }

    /// RMS level in dBFS across all channels
    pub fn rms_db(&self) -> f64 {
        if self.samples.is_empty() {
            return f64::NEG_INFINITY;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64).powi(2)).sum();
        linear_to_db((sum_sq / self.samples.len() as f64).sqrt())
    }

    /// Check that every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }
}

// ============================================================================
// Tests
// ============================================================================
