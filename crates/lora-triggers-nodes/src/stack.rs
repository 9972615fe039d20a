//! Three-slot LoRA stack.
//!
//! Slots are applied in order 1, 2, 3 on the running model/clip. A slot set to
//! `"None"` contributes neither weights nor text. Save mode writes the edit box
//! to the one slot named by [`SaveTarget`]; that slot then carries the edit
//! text (or the save-failure placeholder) instead of a fresh read.

use crate::engine::LoraEngine;
use crate::loader::{LoraLoader, SAVE_FAILED_TEXT};
use crate::log::{InfoLog, NO_TRIGGERS};
use crate::mode::{
    clamp_strength, is_none_choice, EditMode, SaveTarget, NONE_CHOICE, STACK_STRENGTH_LIMIT,
};
use crate::registry::NodeKind;
use lora_triggers_core::text::{is_blank, join_triggers};
use lora_triggers_core::{LoraPaths, Result};
use tracing::debug;

pub const STACK_SLOTS: usize = 3;

/// One stack slot: a LoRA choice and its strength (model and clip alike).
#[derive(Debug, Clone)]
pub struct StackSlot {
    pub lora_name: String,
    pub strength: f32,
}

impl StackSlot {
    pub fn new(lora_name: impl Into<String>, strength: f32) -> Self {
        Self {
            lora_name: lora_name.into(),
            strength,
        }
    }

    pub fn none() -> Self {
        Self::new(NONE_CHOICE, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct StackParams {
    pub slots: [StackSlot; STACK_SLOTS],
    pub mode: EditMode,
    pub save_target: SaveTarget,
    pub edit_text: String,
    pub upstream: Option<String>,
}

impl StackParams {
    pub fn new(slots: [StackSlot; STACK_SLOTS]) -> Self {
        Self {
            slots,
            mode: EditMode::Read,
            save_target: SaveTarget::None,
            edit_text: String::new(),
            upstream: None,
        }
    }
}

/// Result of a save request against the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSave {
    /// Not in save mode, no target, blank edit box, or target slot is "None".
    Skipped,
    Saved(SaveTarget),
    Failed(SaveTarget),
}

impl StackSave {
    /// Text the saved slot contributes in place of a read, if this save
    /// targeted slot `index`.
    fn text_for_slot(&self, index: usize, edit_text: &str) -> Option<String> {
        match self {
            StackSave::Saved(target) if target.slot_index() == Some(index) => {
                Some(edit_text.trim().to_string())
            }
            StackSave::Failed(target) if target.slot_index() == Some(index) => {
                Some(SAVE_FAILED_TEXT.to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct StackOutput<M, C> {
    pub model: M,
    pub clip: C,
    pub trigger_text: String,
    pub info_log: String,
    pub save: StackSave,
}

/// Choices for a stack slot: `"None"` followed by every available LoRA.
pub fn stack_choices(paths: &dyn LoraPaths) -> Vec<String> {
    std::iter::once(NONE_CHOICE.to_string())
        .chain(paths.list_available())
        .collect()
}

impl<E: LoraEngine> LoraLoader<E> {
    /// Apply up to three LoRAs and join their trigger words.
    pub async fn load_stack(
        &self,
        model: E::Model,
        clip: E::Clip,
        params: &StackParams,
    ) -> Result<StackOutput<E::Model, E::Clip>> {
        let save = self.save_stack_target(params);

        let mut log = InfoLog::boxed(NodeKind::Stack.short_name());
        match save {
            StackSave::Saved(target) => {
                log.line(format!("Saved to {} (WebUI Format)", target));
            }
            StackSave::Failed(_) => {
                log.line("Failed to save");
            }
            StackSave::Skipped => {}
        }

        let mut texts = Vec::with_capacity(STACK_SLOTS + 1);
        if let Some(upstream) = params.upstream.as_deref().filter(|u| !is_blank(u)) {
            texts.push(upstream.to_string());
            log.line("[Upstream text added]").separator();
        }

        let (mut model, mut clip) = (model, clip);
        for (index, slot) in params.slots.iter().enumerate() {
            let label = index + 1;
            if is_none_choice(&slot.lora_name) {
                log.line(format!("[{}] None", label)).separator();
                continue;
            }

            let text = match save.text_for_slot(index, &params.edit_text) {
                Some(text) => text,
                None => {
                    self.resolver()
                        .resolve_text(self.engine(), &slot.lora_name)
                        .await
                }
            };
            log.line(format!("[{}] {}", label, slot.lora_name));
            log.line(format!(
                "► {}",
                if is_blank(&text) { NO_TRIGGERS } else { text.as_str() }
            ))
            .separator();

            let Some(path) = self.engine().resolve_file_path(&slot.lora_name) else {
                debug!("Stack slot {} ({}) does not resolve", label, slot.lora_name);
                continue;
            };
            let strength = clamp_strength(slot.strength, STACK_STRENGTH_LIMIT);
            (model, clip) = self.apply_with_clip(model, clip, &path, strength, strength)?;
            texts.push(text);
        }

        Ok(StackOutput {
            model,
            clip,
            trigger_text: join_triggers(&texts),
            info_log: log.finish(),
            save,
        })
    }

    fn save_stack_target(&self, params: &StackParams) -> StackSave {
        if params.mode != EditMode::Save || is_blank(&params.edit_text) {
            return StackSave::Skipped;
        }
        let Some(index) = params.save_target.slot_index() else {
            return StackSave::Skipped;
        };
        let name = &params.slots[index].lora_name;
        if is_none_choice(name) {
            return StackSave::Skipped;
        }

        if self.save(name, params.edit_text.trim()) {
            StackSave::Saved(params.save_target)
        } else {
            StackSave::Failed(params.save_target)
        }
    }
}
