//! Lofi Effects Chain
//!
//! The stages that turn a clip into its slowed + reverb version, plus the
//! orchestrator that runs them. Every stage implements the `Stage` trait
//! and is also exposed as a plain function for direct use.
//!
//! Chain order: Time-Stretch -> Reverb -> Dry Level -> Tone

mod gain;
mod params;
mod pipeline;
mod reverb;
mod stage;
mod stretch;
mod tone;

pub use gain::{apply_dry_level, apply_gain_db, dry_gain_db, DryLevel, MIN_DRY_LEVEL};
pub use params::{EffectParameters, Preset};
pub use pipeline::{process, LofiPipeline, ProcessingResult};
pub use reverb::{
    active_taps, apply_reverb, tap_decay, tap_gain_db, MultiTapReverb, MIN_TAP_DECAY, TAP_COUNT,
};
pub use stage::Stage;
pub use stretch::{reinterpreted_rate, stretch, TimeStretch, MAX_STRETCH_RATIO};
pub use tone::{
    low_pass, normalize, shape_tone, ToneShaper, LOW_PASS_CUTOFF_HZ, NORMALIZE_HEADROOM_DB,
};
