//! Single LoRA loader patching both model and clip.

use crate::engine::LoraEngine;
use crate::loader::{LoraLoader, TriggerStatus};
use crate::log::{InfoLog, NONE_PLACEHOLDER};
use crate::mode::{clamp_strength, EditMode, LOADER_STRENGTH_LIMIT};
use crate::registry::NodeKind;
use lora_triggers_core::text::{compose, is_blank};
use lora_triggers_core::Result;

/// Widget values of the standard loader.
#[derive(Debug, Clone)]
pub struct StandardParams {
    pub lora_name: String,
    pub strength_model: f32,
    pub strength_clip: f32,
    pub mode: EditMode,
    pub edit_text: String,
    /// Text from an upstream node, placed before this LoRA's triggers.
    pub upstream: Option<String>,
}

impl StandardParams {
    pub fn new(lora_name: impl Into<String>) -> Self {
        Self {
            lora_name: lora_name.into(),
            strength_model: 1.0,
            strength_clip: 1.0,
            mode: EditMode::Read,
            edit_text: String::new(),
            upstream: None,
        }
    }
}

/// Outputs of the standard loader.
#[derive(Debug)]
pub struct StandardOutput<M, C> {
    pub model: M,
    pub clip: C,
    pub trigger_text: String,
    pub info_log: String,
    pub status: TriggerStatus,
}

impl<E: LoraEngine> LoraLoader<E> {
    /// Apply one LoRA to model and clip and emit its trigger words.
    ///
    /// A name that does not resolve leaves model and clip untouched.
    pub async fn load_standard(
        &self,
        model: E::Model,
        clip: E::Clip,
        params: &StandardParams,
    ) -> Result<StandardOutput<E::Model, E::Clip>> {
        let outcome = self
            .read_or_save(&params.lora_name, params.mode, &params.edit_text)
            .await;
        let upstream = params.upstream.as_deref();
        let trigger_text = compose(upstream, &outcome.text);

        let mut log = InfoLog::titled(NodeKind::Standard.short_name());
        log.field("File", &params.lora_name)
            .field("Status", outcome.status.describe());
        if upstream.is_some_and(|u| !is_blank(u)) {
            log.line("[Upstream text added]");
        }

        let (model, clip) = match self.engine().resolve_file_path(&params.lora_name) {
            Some(path) => self.apply_with_clip(
                model,
                clip,
                &path,
                clamp_strength(params.strength_model, LOADER_STRENGTH_LIMIT),
                clamp_strength(params.strength_clip, LOADER_STRENGTH_LIMIT),
            )?,
            None => {
                log.line("LoRA file not found, model unchanged");
                (model, clip)
            }
        };

        log.separator().triggers(&outcome.text, NONE_PLACEHOLDER);

        Ok(StandardOutput {
            model,
            clip,
            trigger_text,
            info_log: log.finish(),
            status: outcome.status,
        })
    }
}
