//! Pipeline Orchestrator
//!
//! Runs the lofi stages in their fixed order:
//! 1. Time-Stretch (slow down)
//! 2. Multi-Tap Delay/Reverb
//! 3. Gain-Staging (dry level)
//! 4. Tone-Shaping (low-pass + normalize)
//!
//! Processing is best-effort. Any failure while validating, decoding,
//! running a stage or encoding is logged and the input file is copied to
//! the output location unchanged, so callers always get a file back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::dsp::gain::DryLevel;
use crate::dsp::params::EffectParameters;
use crate::dsp::reverb::MultiTapReverb;
use crate::dsp::stage::Stage;
use crate::dsp::stretch::TimeStretch;
use crate::dsp::tone::ToneShaper;
use crate::engine::{decode_wav, encode_wav, AudioClip};
use crate::error::{LofiError, Result};

/// Outcome of one processing call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    /// The output holds the processed audio
    Processed { path: PathBuf },
    /// Processing failed; the output is a verbatim copy of the input
    Passthrough { path: PathBuf, reason: String },
}

impl ProcessingResult {
    /// Path of the delivered file
    pub fn path(&self) -> &Path {
        match self {
            ProcessingResult::Processed { path } | ProcessingResult::Passthrough { path, .. } => {
                path
            }
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ProcessingResult::Processed { path } | ProcessingResult::Passthrough { path, .. } => {
                path
            }
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, ProcessingResult::Passthrough { .. })
    }
}

/// An ordered chain of stages
pub struct LofiPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl LofiPipeline {
    /// Build the standard lofi chain for `params`
    ///
    /// # Errors
    /// * `InvalidParameter` - if `params` fails validation
    pub fn new(params: &EffectParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_stages(vec![
            Box::new(TimeStretch {
                slow_factor: params.slow_factor,
            }),
            Box::new(MultiTapReverb {
                room_size: params.room_size,
                damping: params.damping,
                wet_level: params.wet_level,
                delay_ms: params.delay_ms,
            }),
            Box::new(DryLevel {
                dry_level: params.dry_level,
            }),
            Box::new(ToneShaper),
        ]))
    }

    /// Build a pipeline from an explicit stage list
    pub fn from_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over an in-memory clip
    ///
    /// # Errors
    /// Propagates the first stage error, or `DspOverflow` if a stage
    /// produced NaN/Inf samples.
    pub fn run(&self, clip: &AudioClip) -> Result<AudioClip> {
        let mut current = clip.clone();
        for stage in &self.stages {
            let next = stage.apply(&current)?;
            if !next.is_finite() {
                return Err(LofiError::DspOverflow {
                    stage: stage.name().to_string(),
                });
            }
            debug!(
                "stage {}: {} -> {} frames",
                stage.name(),
                current.num_frames(),
                next.num_frames()
            );
            current = next;
        }
        Ok(current)
    }

    /// Decode `input`, run the chain and encode the result to `output`
    ///
    /// The result is written to a temporary sibling and renamed over
    /// `output`, so `output` (which may be `input`) is never left half
    /// written. Unlike [`LofiPipeline::process`], errors are returned as-is.
    pub fn render(&self, input: &Path, output: &Path) -> Result<()> {
        let clip = decode_wav(input)?;
        let processed = self.run(&clip)?;

        let staging = staging_path(output);
        if let Err(e) = encode_wav(&processed, &staging).and_then(|()| {
            fs::rename(&staging, output).map_err(LofiError::from)
        }) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        info!(
            "Processed {} ({:.1}s) -> {} ({:.1}s)",
            input.display(),
            clip.duration_secs(),
            output.display(),
            processed.duration_secs()
        );
        Ok(())
    }

    /// Render `input` to `output`, copying the input through on failure
    ///
    /// # Errors
    /// Only when the fallback copy itself fails, e.g. the input is missing.
    pub fn process(&self, input: &Path, output: &Path) -> Result<ProcessingResult> {
        match self.render(input, output) {
            Ok(()) => Ok(ProcessingResult::Processed {
                path: output.to_path_buf(),
            }),
            Err(e) => passthrough(input, output, e),
        }
    }
}

/// Apply the lofi effect to `input`, writing the result to `output`
///
/// Never reports a processing failure: invalid parameters, undecodable
/// input and stage or encode errors all degrade to a byte-for-byte copy of
/// `input` at `output`.
///
/// # Errors
/// Only when that fallback copy fails.
pub fn process(
    input: &Path,
    output: &Path,
    params: &EffectParameters,
) -> Result<ProcessingResult> {
    match LofiPipeline::new(params) {
        Ok(pipeline) => pipeline.process(input, output),
        Err(e) => passthrough(input, output, e),
    }
}

/// Copy `input` to `output` after a processing failure
fn passthrough(input: &Path, output: &Path, cause: LofiError) -> Result<ProcessingResult> {
    warn!(
        "Error processing audio [{}]: {}; copying {} through unchanged",
        cause.error_code(),
        cause,
        input.display()
    );

    if !same_file(input, output) {
        fs::copy(input, output).map_err(|e| {
            if input.exists() {
                LofiError::Io(io::Error::new(
                    e.kind(),
                    format!("could not write {}: {}", output.display(), e),
                ))
            } else {
                LofiError::FileNotFound {
                    path: input.display().to_string(),
                    source: Some(e),
                }
            }
        })?;
    }

    Ok(ProcessingResult::Passthrough {
        path: output.to_path_buf(),
        reason: cause.to_string(),
    })
}

/// Hidden, per-call unique sibling of `output`
fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.wav".to_string());
    output.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use tempfile::tempdir;

    struct Explode;

    impl Stage for Explode {
        fn name(&self) -> &'static str {
            "explode"
        }

        fn apply(&self, _clip: &AudioClip) -> Result<AudioClip> {
            Err(LofiError::ProcessingError {
                reason: "forced failure".to_string(),
            })
        }
    }

    struct Poison;

    impl Stage for Poison {
        fn name(&self) -> &'static str {
            "poison"
        }

        fn apply(&self, clip: &AudioClip) -> Result<AudioClip> {
            let mut samples = clip.samples().to_vec();
            samples[0] = f32::INFINITY;
            AudioClip::from_interleaved(samples, clip.sample_rate(), clip.channels(), clip.format())
        }
    }

    #[test]
    fn test_stage_order() {
        let pipeline = LofiPipeline::new(&EffectParameters::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["time_stretch", "reverb", "dry_level", "tone"]
        );
    }

    #[test]
    fn test_invalid_params_rejected_by_builder() {
        let params = EffectParameters {
            room_size: 2.0,
            ..Default::default()
        };
        assert!(LofiPipeline::new(&params).is_err());
    }

    #[test]
    fn test_run_flags_non_finite_output() {
        let pipeline = LofiPipeline::from_stages(vec![Box::new(Poison)]);
        let clip = generate_test_tone(440.0, 0.1, 8000);

        match pipeline.run(&clip) {
            Err(LofiError::DspOverflow { stage }) => assert_eq!(stage, "poison"),
            other => panic!("expected DspOverflow, got {:?}", other),
        }
    }

    #[test]
    fn test_run_does_not_touch_input() {
        let pipeline = LofiPipeline::new(&EffectParameters::default()).unwrap();
        let clip = generate_test_tone(440.0, 0.1, 8000);
        let before = clip.clone();
        let _ = pipeline.run(&clip).unwrap();
        assert_eq!(clip, before);
    }

    #[test]
    fn test_failing_stage_degrades_to_copy() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        encode_wav(&generate_test_tone(440.0, 0.2, 8000), &input).unwrap();

        let pipeline = LofiPipeline::from_stages(vec![Box::new(ToneShaper), Box::new(Explode)]);
        let result = pipeline.process(&input, &output).unwrap();

        assert!(result.is_passthrough());
        assert_eq!(result.path(), output.as_path());
        assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());
    }

    #[test]
    fn test_passthrough_onto_itself_keeps_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        fs::write(&input, b"not audio at all").unwrap();

        let result = process(&input, &input, &EffectParameters::default()).unwrap();

        assert!(result.is_passthrough());
        assert_eq!(fs::read(&input).unwrap(), b"not audio at all");
    }

    #[test]
    fn test_render_onto_itself_replaces_atomically() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        encode_wav(&generate_test_tone(440.0, 0.2, 8000), &input).unwrap();

        let result = process(&input, &input, &EffectParameters::default()).unwrap();

        assert!(!result.is_passthrough());
        assert!(decode_wav(&input).unwrap().num_frames() > 1600);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_render_onto_itself_leaves_input_intact() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        encode_wav(&generate_test_tone(440.0, 0.2, 8000), &input).unwrap();
        let before = fs::read(&input).unwrap();

        let pipeline = LofiPipeline::from_stages(vec![Box::new(Poison)]);
        let result = pipeline.process(&input, &input).unwrap();

        assert!(result.is_passthrough());
        assert_eq!(fs::read(&input).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_output_reports_output_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("missing-dir").join("out.wav");
        encode_wav(&generate_test_tone(440.0, 0.2, 8000), &input).unwrap();

        let err = process(&input, &output, &EffectParameters::default()).unwrap_err();

        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("missing-dir"));
    }

    #[test]
    fn test_missing_input_is_the_only_error() {
        let dir = tempdir().unwrap();
        let result = process(
            &dir.path().join("missing.wav"),
            &dir.path().join("out.wav"),
            &EffectParameters::default(),
        );
        assert!(matches!(result, Err(LofiError::FileNotFound { .. })));
    }
}
