//! Node registry: the identifiers a host uses to list and label the nodes.

use std::fmt;

/// Menu category shared by every node.
pub const CATEGORY: &str = "DvD Nodes";

/// The three loader nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Standard,
    ModelOnly,
    Stack,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::Standard, NodeKind::ModelOnly, NodeKind::Stack];

    /// Stable class name the host registers the node under.
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeKind::Standard => "DvD_LoraLoader_Standard",
            NodeKind::ModelOnly => "DvD_LoraLoader_ModelOnly",
            NodeKind::Stack => "DvD_LoraLoader_Stack",
        }
    }

    /// Name shown in the host's node menu.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Standard => "DvD LoRA Loader (Trigger Words)",
            NodeKind::ModelOnly => "DvD LoRA Loader (Model Only)",
            NodeKind::Stack => "DvD LoRA Stack (Multi-Merge)",
        }
    }

    /// Title used in the node's info log header.
    pub fn short_name(&self) -> &'static str {
        match self {
            NodeKind::Standard => "DvD LoRA Loader",
            NodeKind::ModelOnly => "DvD LoRA Loader (Model Only)",
            NodeKind::Stack => "DvD LoRA Stack",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_name() == name)
    }

    /// Output socket names, in order.
    pub fn output_names(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Standard | NodeKind::Stack => &["MODEL", "CLIP", "trigger_text", "info_log"],
            NodeKind::ModelOnly => &["MODEL", "trigger_text", "info_log"],
        }
    }

    pub fn category(&self) -> &'static str {
        CATEGORY
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
