//! Human-readable info log returned by each node.
//!
//! The log is diagnostic text for the host's preview widget. Nothing parses
//! it, so the layout can change freely.

pub const NO_TRIGGERS: &str = "(No triggers)";
pub const NONE_PLACEHOLDER: &str = "(None)";

const RULE: &str = "────────────────────────────────────";

/// Line-oriented log builder.
#[derive(Debug, Clone, Default)]
pub struct InfoLog {
    lines: Vec<String>,
    boxed: bool,
}

impl InfoLog {
    /// Plain log opened with a `=== title ===` banner.
    pub fn titled(title: &str) -> Self {
        Self {
            lines: vec![format!("=== {} ===", title)],
            boxed: false,
        }
    }

    /// Log drawn inside a box, used by the stack node.
    pub fn boxed(title: &str) -> Self {
        Self {
            lines: vec![format!("╔══════════ {} ══════════╗", title)],
            boxed: true,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if self.boxed {
            self.lines.push(format!("║ {}", text));
        } else {
            self.lines.push(text.to_string());
        }
        self
    }

    /// `label: value` line.
    pub fn field(&mut self, label: &str, value: impl AsRef<str>) -> &mut Self {
        self.line(format!("{}: {}", label, value.as_ref()))
    }

    pub fn separator(&mut self) -> &mut Self {
        if self.boxed {
            self.lines.push(format!("╟{}╢", RULE));
        } else {
            self.lines.push("--- Triggers ---".to_string());
        }
        self
    }

    /// Trigger text, or `placeholder` when blank.
    pub fn triggers(&mut self, text: &str, placeholder: &str) -> &mut Self {
        if text.trim().is_empty() {
            self.line(placeholder)
        } else {
            self.line(text)
        }
    }

    pub fn finish(mut self) -> String {
        if self.boxed {
            if self.lines.last().is_some_and(|l| l.starts_with('╟')) {
                self.lines.pop();
            }
            self.lines.push(format!("╚{}╝", "═".repeat(RULE.chars().count())));
        } else {
            self.lines.push("=".repeat(23));
        }
        self.lines.join("\n")
    }
}
