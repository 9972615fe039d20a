//! LoRA loader workflows with trigger-word injection.
//!
//! Three nodes are provided on top of a host [`LoraEngine`]:
//!
//! - [`LoraLoader::load_standard`]: one LoRA into model and clip
//! - [`LoraLoader::load_model_only`]: one LoRA into the model only
//! - [`LoraLoader::load_stack`]: up to three LoRAs applied in order
//!
//! Each node emits the LoRA's trigger words (prefixed by any upstream text)
//! and an info log. In Save mode the edit box is written to the LoRA's
//! sidecar instead of being looked up.
//!
//! # Example
//!
//! ```rust,ignore
//! use lora_triggers_nodes::{LoraLoader, StandardParams};
//!
//! let loader = LoraLoader::new(engine, TriggerResolver::with_registry()?);
//! let out = loader.load_standard(model, clip, &StandardParams::new("style.safetensors")).await?;
//! println!("{}", out.trigger_text);
//! ```

pub mod engine;
pub mod loader;
pub mod log;
pub mod logging;
pub mod mode;
pub mod model_only;
pub mod registry;
pub mod stack;
pub mod standard;

pub use engine::LoraEngine;
pub use loader::{LoraLoader, TriggerOutcome, TriggerStatus, SAVE_FAILED_TEXT};
pub use mode::{EditMode, ParseChoiceError, SaveTarget, NONE_CHOICE};
pub use model_only::{ModelOnlyOutput, ModelOnlyParams};
pub use registry::NodeKind;
pub use stack::{stack_choices, StackOutput, StackParams, StackSave, StackSlot};
pub use standard::{StandardOutput, StandardParams};
