//! Stage trait definition
//!
//! Every step of the lofi chain is a `Stage`. Stages never mutate their
//! input: each one reads a clip and returns a freshly built replacement.

use crate::engine::AudioClip;
use crate::error::Result;

/// One step of the processing chain
pub trait Stage: Send + Sync {
    /// Stable identifier used in logs and overflow errors
    fn name(&self) -> &'static str;

    /// Produce the transformed clip
    fn apply(&self, clip: &AudioClip) -> Result<AudioClip>;
}
