//! The model engine the loaders delegate to.
//!
//! Loading LoRA weights and merging them into a model is the host's job. The
//! loaders only need the four operations below, plus the path registry the
//! engine already owns.

use lora_triggers_core::{LoraPaths, Result};
use std::path::Path;

/// Host model engine: path registry, weight loading and merging.
pub trait LoraEngine: LoraPaths {
    /// Diffusion model handle.
    type Model;
    /// Text encoder handle.
    type Clip;
    /// Opaque loaded LoRA weights.
    type Weights;

    /// Load a LoRA file's weights.
    fn load_raw(&self, path: &Path) -> Result<Self::Weights>;

    /// Apply loaded weights, returning the patched model and clip.
    ///
    /// With `clip == None` only the model is patched and the returned clip is
    /// ignored.
    fn merge_into_model(
        &self,
        model: Self::Model,
        clip: Option<Self::Clip>,
        weights: &Self::Weights,
        strength_model: f32,
        strength_clip: f32,
    ) -> Result<(Self::Model, Option<Self::Clip>)>;
}
