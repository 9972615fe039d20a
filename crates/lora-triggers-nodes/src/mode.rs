//! Widget values shared by the loader nodes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Slot value meaning "no LoRA selected".
pub const NONE_CHOICE: &str = "None";

/// Strength limit of the single-LoRA loaders.
pub const LOADER_STRENGTH_LIMIT: f32 = 20.0;
/// Strength limit of the stack slots.
pub const STACK_STRENGTH_LIMIT: f32 = 10.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind} value: {value:?}")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
}

/// Whether the node only reads trigger words or saves the edit box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Read,
    Save,
}

impl EditMode {
    pub const ALL: [EditMode; 2] = [EditMode::Read, EditMode::Save];

    /// Label shown in the host UI.
    pub fn label(&self) -> &'static str {
        match self {
            EditMode::Read => "Read (只读)",
            EditMode::Save => "Save (保存修改)",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EditMode {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EditMode::ALL
            .into_iter()
            .find(|mode| s == mode.label())
            .or_else(|| match s.to_lowercase().as_str() {
                "read" => Some(EditMode::Read),
                "save" => Some(EditMode::Save),
                _ => None,
            })
            .ok_or_else(|| ParseChoiceError {
                kind: "mode",
                value: s.to_string(),
            })
    }
}

/// Which stack slot a save applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveTarget {
    #[default]
    None,
    Slot1,
    Slot2,
    Slot3,
}

impl SaveTarget {
    pub const ALL: [SaveTarget; 4] = [
        SaveTarget::None,
        SaveTarget::Slot1,
        SaveTarget::Slot2,
        SaveTarget::Slot3,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SaveTarget::None => "None (不保存)",
            SaveTarget::Slot1 => "Lora 1",
            SaveTarget::Slot2 => "Lora 2",
            SaveTarget::Slot3 => "Lora 3",
        }
    }

    /// Zero-based slot index, `None` for no target.
    pub fn slot_index(&self) -> Option<usize> {
        match self {
            SaveTarget::None => None,
            SaveTarget::Slot1 => Some(0),
            SaveTarget::Slot2 => Some(1),
            SaveTarget::Slot3 => Some(2),
        }
    }
}

impl fmt::Display for SaveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SaveTarget {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SaveTarget::ALL
            .into_iter()
            .find(|target| s == target.label())
            .or_else(|| (s == NONE_CHOICE).then_some(SaveTarget::None))
            .ok_or_else(|| ParseChoiceError {
                kind: "save target",
                value: s.to_string(),
            })
    }
}

/// Clamp a strength to the widget's symmetric range.
pub fn clamp_strength(value: f32, limit: f32) -> f32 {
    value.clamp(-limit, limit)
}

/// Whether a slot selection means "no LoRA".
pub fn is_none_choice(name: &str) -> bool {
    name.is_empty() || name == NONE_CHOICE
}
