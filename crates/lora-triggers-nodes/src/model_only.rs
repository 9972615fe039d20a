//! Single LoRA loader patching only the model.

use crate::engine::LoraEngine;
use crate::loader::{LoraLoader, TriggerStatus};
use crate::log::{InfoLog, NONE_PLACEHOLDER};
use crate::mode::{clamp_strength, EditMode, LOADER_STRENGTH_LIMIT};
use crate::registry::NodeKind;
use lora_triggers_core::text::{compose, is_blank};
use lora_triggers_core::Result;

#[derive(Debug, Clone)]
pub struct ModelOnlyParams {
    pub lora_name: String,
    pub strength_model: f32,
    pub mode: EditMode,
    pub edit_text: String,
    pub upstream: Option<String>,
}

impl ModelOnlyParams {
    pub fn new(lora_name: impl Into<String>) -> Self {
        Self {
            lora_name: lora_name.into(),
            strength_model: 1.0,
            mode: EditMode::Read,
            edit_text: String::new(),
            upstream: None,
        }
    }
}

#[derive(Debug)]
pub struct ModelOnlyOutput<M> {
    pub model: M,
    pub trigger_text: String,
    pub info_log: String,
    pub status: TriggerStatus,
}

impl<E: LoraEngine> LoraLoader<E> {
    /// Apply one LoRA to the model only (clip strength 0).
    pub async fn load_model_only(
        &self,
        model: E::Model,
        params: &ModelOnlyParams,
    ) -> Result<ModelOnlyOutput<E::Model>> {
        let outcome = self
            .read_or_save(&params.lora_name, params.mode, &params.edit_text)
            .await;
        let upstream = params.upstream.as_deref();
        let trigger_text = compose(upstream, &outcome.text);

        let mut log = InfoLog::titled(NodeKind::ModelOnly.short_name());
        log.field("File", &params.lora_name)
            .field("Status", outcome.status.describe());
        if upstream.is_some_and(|u| !is_blank(u)) {
            log.line("[Upstream text added]");
        }

        let model = match self.engine().resolve_file_path(&params.lora_name) {
            Some(path) => {
                let strength = clamp_strength(params.strength_model, LOADER_STRENGTH_LIMIT);
                self.apply(model, None, &path, strength, 0.0)?.0
            }
            None => {
                log.line("LoRA file not found, model unchanged");
                model
            }
        };

        log.separator().triggers(&outcome.text, NONE_PLACEHOLDER);

        Ok(ModelOnlyOutput {
            model,
            trigger_text,
            info_log: log.finish(),
            status: outcome.status,
        })
    }
}
