//! WAV file I/O
//!
//! Decodes WAV files into [`AudioClip`]s and encodes clips back out in the
//! same sample format they were read with. Only mono and stereo PCM is
//! accepted; anything else is rejected at decode time so the pipeline can
//! fall back before touching the samples.

use std::io::{Read, Seek, Write};
use std::path::Path;

use hound::{WavReader, WavSpec, WavWriter};
use num_traits::AsPrimitive;

use crate::engine::buffer::{AudioClip, SampleFormat};
use crate::error::{LofiError, Result};

/// Maximum channel count accepted on decode
pub const MAX_CHANNELS: u16 = 2;

/// Decode a WAV file into an [`AudioClip`]
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a readable WAV file
/// * `UnsupportedFormat` - More than two channels or an unusual bit depth
/// * `EmptyAudio` - The file holds no frames
pub fn decode_wav(path: &Path) -> Result<AudioClip> {
    if !path.exists() {
        return Err(LofiError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let mut reader = WavReader::open(path).map_err(|e| LofiError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > MAX_CHANNELS {
        return Err(LofiError::UnsupportedFormat {
            format: format!(
                "{}-channel audio (only mono/stereo supported)",
                spec.channels
            ),
        });
    }
    let format = SampleFormat::from_wav_spec(&spec)?;

    let samples = match format {
        SampleFormat::F32 => read_samples::<f32, _>(&mut reader, 1.0)?,
        SampleFormat::I8 => read_samples::<i8, _>(&mut reader, format.full_scale() as f32)?,
        SampleFormat::I16 => read_samples::<i16, _>(&mut reader, format.full_scale() as f32)?,
        // hound hands out 24-bit samples as i32
        SampleFormat::I24 | SampleFormat::I32 => {
            read_samples::<i32, _>(&mut reader, format.full_scale() as f32)?
        }
    };

    if samples.is_empty() {
        return Err(LofiError::EmptyAudio);
    }

    // A truncated data chunk can leave a dangling partial frame
    let whole = samples.len() - samples.len() % spec.channels as usize;
    let mut samples = samples;
    samples.truncate(whole);

    AudioClip::from_interleaved(samples, spec.sample_rate, spec.channels, format)
}

/// Encode an [`AudioClip`] to a WAV file using the clip's own format
pub fn encode_wav(clip: &AudioClip, path: &Path) -> Result<()> {
    let format = clip.format();
    let spec = WavSpec {
        channels: clip.channels(),
        sample_rate: clip.sample_rate(),
        bits_per_sample: format.bits_per_sample(),
        sample_format: if format.is_float() {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_write_error)?;

    match format {
        SampleFormat::F32 => {
            for &sample in clip.samples() {
                writer.write_sample(sample).map_err(wav_write_error)?;
            }
        }
        SampleFormat::I8 => write_int::<i8, _>(&mut writer, clip.samples(), format)?,
        SampleFormat::I16 => write_int::<i16, _>(&mut writer, clip.samples(), format)?,
        SampleFormat::I24 | SampleFormat::I32 => {
            write_int::<i32, _>(&mut writer, clip.samples(), format)?
        }
    }

    writer.finalize().map_err(wav_write_error)?;
    Ok(())
}

/// Generate a mono 16-bit test tone (sine wave at half scale)
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioClip {
    let num_frames = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    let samples = (0..num_frames)
        .map(|i| 0.5 * (angular_freq * i as f32).sin())
        .collect();

    AudioClip::from_interleaved(samples, sample_rate.max(1), 1, SampleFormat::I16)
        .unwrap_or_else(|_| unreachable!("mono clips always have whole frames"))
}

/// Generate a stereo 16-bit test tone with different frequencies per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> AudioClip {
    let num_frames = (duration_secs * sample_rate as f32) as usize;
    let angular_l = 2.0 * std::f32::consts::PI * freq_left / sample_rate as f32;
    let angular_r = 2.0 * std::f32::consts::PI * freq_right / sample_rate as f32;

    let mut samples = Vec::with_capacity(num_frames * 2);
    for i in 0..num_frames {
        samples.push(0.5 * (angular_l * i as f32).sin());
        samples.push(0.5 * (angular_r * i as f32).sin());
    }

    AudioClip::from_interleaved(samples, sample_rate.max(1), 2, SampleFormat::I16)
        .unwrap_or_else(|_| unreachable!("interleaved pairs always have whole frames"))
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read every sample as `S` and normalize by `full_scale`
fn read_samples<S, R>(reader: &mut WavReader<R>, full_scale: f32) -> Result<Vec<f32>>
where
    S: hound::Sample + AsPrimitive<f32>,
    R: Read,
{
    reader
        .samples::<S>()
        .map(|s| s.map(|v| v.as_() / full_scale))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| LofiError::InvalidAudio {
            reason: format!("Failed to read samples: {}", e),
            source: Some(Box::new(e)),
        })
}

/// Quantize normalized samples to an integer type and write them
fn write_int<S, W>(writer: &mut WavWriter<W>, samples: &[f32], format: SampleFormat) -> Result<()>
where
    S: hound::Sample + Copy + 'static,
    f64: AsPrimitive<S>,
    W: Write + Seek,
{
    let full_scale = format.full_scale();
    for &sample in samples {
        let scaled = (sample as f64 * full_scale)
            .round()
            .clamp(-full_scale, full_scale - 1.0);
        writer
            .write_sample::<S>(scaled.as_())
            .map_err(wav_write_error)?;
    }
    Ok(())
}

fn wav_write_error(e: hound::Error) -> LofiError {
    match e {
        hound::Error::IoError(io) => LofiError::Io(io),
        other => LofiError::ProcessingError {
            reason: format!("Failed to write WAV file: {}", other),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_test_tone() {
        let clip = generate_test_tone(440.0, 1.0, 44100);

        assert_eq!(clip.num_frames(), 44100);
        assert_eq!(clip.channels(), 1);
        assert!((clip.peak() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_generate_stereo_test_tone() {
        let clip = generate_stereo_test_tone(440.0, 880.0, 0.5, 44100);

        assert_eq!(clip.num_frames(), 22050);
        assert_eq!(clip.channels(), 2);

        let left: Vec<f32> = clip.channel(0).collect();
        let right: Vec<f32> = clip.channel(1).collect();
        assert!((left[100] - right[100]).abs() > 0.01);
    }

    #[test]
    fn test_round_trip_16bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone16.wav");

        let original = generate_test_tone(1000.0, 0.2, 44100);
        encode_wav(&original, &path).unwrap();
        let decoded = decode_wav(&path).unwrap();

        assert_eq!(decoded.format(), SampleFormat::I16);
        assert_eq!(decoded.sample_rate(), 44100);
        assert_eq!(decoded.num_frames(), original.num_frames());
        for (a, b) in original.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() < 1e-4, "Sample mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_round_trip_preserves_float_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone_f32.wav");

        let tone = generate_stereo_test_tone(440.0, 660.0, 0.1, 48000);
        let original = AudioClip::from_interleaved(
            tone.samples().to_vec(),
            48000,
            2,
            SampleFormat::F32,
        )
        .unwrap();

        encode_wav(&original, &path).unwrap();
        let decoded = decode_wav(&path).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_24bit_and_8bit() {
        let dir = tempdir().unwrap();
        let tone = generate_test_tone(220.0, 0.1, 22050);

        for (name, format, tolerance) in [
            ("tone24.wav", SampleFormat::I24, 1e-6),
            ("tone8.wav", SampleFormat::I8, 1e-2),
        ] {
            let path = dir.path().join(name);
            let clip =
                AudioClip::from_interleaved(tone.samples().to_vec(), 22050, 1, format).unwrap();
            encode_wav(&clip, &path).unwrap();
            let decoded = decode_wav(&path).unwrap();

            assert_eq!(decoded.format(), format);
            for (a, b) in clip.samples().iter().zip(decoded.samples()) {
                assert!((a - b).abs() < tolerance, "{}: {} vs {}", name, a, b);
            }
        }
    }

    #[test]
    fn test_encode_saturates_full_scale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hot.wav");

        let clip =
            AudioClip::from_interleaved(vec![1.0, -1.0, 2.0], 8000, 1, SampleFormat::I16).unwrap();
        encode_wav(&clip, &path).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let raw: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(raw, vec![i16::MAX, i16::MIN, i16::MAX]);
    }

    #[test]
    fn test_decode_nonexistent_file() {
        let result = decode_wav(Path::new("/nonexistent/path/audio.wav"));

        match result.unwrap_err() {
            LofiError::FileNotFound { path, .. } => assert!(path.contains("nonexistent")),
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();

        assert!(matches!(
            decode_wav(&path),
            Err(LofiError::InvalidAudio { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_multichannel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quad.wav");
        let spec = WavSpec {
            channels: 4,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..16 {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        assert!(matches!(
            decode_wav(&path),
            Err(LofiError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_decode_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let clip = AudioClip::from_interleaved(Vec::new(), 44100, 1, SampleFormat::I16).unwrap();
        encode_wav(&clip, &path).unwrap();

        assert!(matches!(decode_wav(&path), Err(LofiError::EmptyAudio)));
    }
}
