//! Shared plumbing for the loader nodes.

use crate::engine::LoraEngine;
use crate::mode::EditMode;
use lora_triggers_core::resolver::Tier;
use lora_triggers_core::text::is_blank;
use lora_triggers_core::{sidecar, Result, TriggerError, TriggerResolver};
use std::path::Path;
use tracing::{info, warn};

/// Trigger text emitted when a save fails.
pub const SAVE_FAILED_TEXT: &str = "Error Saving";

/// How a node arrived at its trigger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStatus {
    /// Resolved through the fallback chain; `None` when nothing was found.
    Read(Option<Tier>),
    Saved,
    SaveFailed,
}

impl TriggerStatus {
    pub fn describe(&self) -> String {
        match self {
            TriggerStatus::Read(Some(tier)) => format!("Read from {}", tier),
            TriggerStatus::Read(None) => "No trigger source found".to_string(),
            TriggerStatus::Saved => "Update Saved (WebUI Compatible)".to_string(),
            TriggerStatus::SaveFailed => "Save Failed".to_string(),
        }
    }
}

/// Trigger text for one LoRA plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub text: String,
    pub status: TriggerStatus,
}

/// Runs the loader nodes against a host engine.
pub struct LoraLoader<E> {
    engine: E,
    resolver: TriggerResolver,
}

impl<E: LoraEngine> LoraLoader<E> {
    pub fn new(engine: E, resolver: TriggerResolver) -> Self {
        Self { engine, resolver }
    }

    /// Loader that never contacts the remote registry.
    pub fn offline(engine: E) -> Self {
        Self::new(engine, TriggerResolver::offline())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn resolver(&self) -> &TriggerResolver {
        &self.resolver
    }

    /// Save the edit box, or resolve when not saving.
    ///
    /// Save mode with a blank edit box behaves as Read.
    pub(crate) async fn read_or_save(
        &self,
        lora_name: &str,
        mode: EditMode,
        edit_text: &str,
    ) -> TriggerOutcome {
        if mode == EditMode::Save && !is_blank(edit_text) {
            let edit = edit_text.trim();
            return if self.save(lora_name, edit) {
                TriggerOutcome {
                    text: edit.to_string(),
                    status: TriggerStatus::Saved,
                }
            } else {
                TriggerOutcome {
                    text: SAVE_FAILED_TEXT.to_string(),
                    status: TriggerStatus::SaveFailed,
                }
            };
        }

        let resolution = self.resolver.resolve(&self.engine, lora_name).await;
        TriggerOutcome {
            text: resolution.text,
            status: TriggerStatus::Read(resolution.source),
        }
    }

    /// Write trigger text to a LoRA's sidecar.
    pub(crate) fn save(&self, lora_name: &str, text: &str) -> bool {
        let Some(path) = self.engine.resolve_file_path(lora_name) else {
            warn!("Cannot save trigger words: {:?} does not resolve", lora_name);
            return false;
        };
        let saved = sidecar::write(&path, text);
        if saved {
            info!("Saved trigger words for {}", lora_name);
        }
        saved
    }

    /// Load a LoRA and merge it into the model (and clip, when given).
    pub(crate) fn apply(
        &self,
        model: E::Model,
        clip: Option<E::Clip>,
        path: &Path,
        strength_model: f32,
        strength_clip: f32,
    ) -> Result<(E::Model, Option<E::Clip>)> {
        let weights = self.engine.load_raw(path)?;
        self.engine
            .merge_into_model(model, clip, &weights, strength_model, strength_clip)
    }

    /// Merge into both model and clip; the engine must hand the clip back.
    pub(crate) fn apply_with_clip(
        &self,
        model: E::Model,
        clip: E::Clip,
        path: &Path,
        strength_model: f32,
        strength_clip: f32,
    ) -> Result<(E::Model, E::Clip)> {
        let (model, clip) = self.apply(model, Some(clip), path, strength_model, strength_clip)?;
        let clip = clip.ok_or_else(|| {
            TriggerError::engine(format!("engine returned no clip for {}", path.display()))
        })?;
        Ok((model, clip))
    }
}
