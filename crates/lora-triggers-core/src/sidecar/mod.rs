//! Sidecar files stored next to a LoRA.
//!
//! A sidecar shares the model's base name and is either:
//! - `<name>.json`: an object compatible with the Automatic1111 web UI
//!   (`activation text`, `description`, `sd version`, `preferred weight`, `notes`)
//! - `<name>.txt`: the raw trigger phrase
//!
//! Reads accept the field names used by other tools too (`activation_text`,
//! `trigger_words`, `trigger words`). Writes only ever touch the trigger field
//! of an existing object so the web UI's other fields survive.

mod atomic;

pub use atomic::{atomic_write_json, to_sidecar_json};

use crate::config::SidecarConfig;
use crate::error::{Result, TriggerError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Web UI field, written by default.
pub const ACTIVATION_TEXT: &str = "activation text";
/// Underscore spelling used by some extensions; updated in place when present.
pub const ACTIVATION_TEXT_LEGACY: &str = "activation_text";

/// Trigger-bearing keys in read priority order. The bool marks keys whose
/// value may be a list of phrases.
const READ_KEYS: [(&str, bool); 4] = [
    (ACTIVATION_TEXT, false),
    (ACTIVATION_TEXT_LEGACY, false),
    ("trigger_words", true),
    ("trigger words", true),
];

/// Candidate sidecar locations for one model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarPaths {
    pub json: PathBuf,
    pub txt: PathBuf,
}

impl SidecarPaths {
    /// The sidecar a read would use: `.json` if present, else `.txt`.
    pub fn existing(&self) -> Option<&Path> {
        if self.json.exists() {
            Some(&self.json)
        } else if self.txt.exists() {
            Some(&self.txt)
        } else {
            None
        }
    }
}

/// Sidecar paths for a model file. No I/O is performed.
pub fn locate(model_path: impl AsRef<Path>) -> SidecarPaths {
    let model_path = model_path.as_ref();
    SidecarPaths {
        json: model_path.with_extension(SidecarConfig::JSON_EXTENSION),
        txt: model_path.with_extension(SidecarConfig::TEXT_EXTENSION),
    }
}

/// Check whether any sidecar exists for a model file.
pub fn exists(model_path: impl AsRef<Path>) -> bool {
    locate(model_path).existing().is_some()
}

/// Read the trigger text from a model's sidecar.
///
/// Returns `Ok(None)` when the model has no sidecar and `Err` only when an
/// existing sidecar cannot be read. Malformed JSON is not an error: the raw
/// content is returned instead.
pub fn read(model_path: impl AsRef<Path>) -> Result<Option<String>> {
    let paths = locate(model_path);
    let Some(target) = paths.existing() else {
        return Ok(None);
    };

    let content =
        std::fs::read_to_string(target).map_err(|e| TriggerError::io_with_path(e, target))?;
    Ok(Some(parse_trigger_text(content.trim())))
}

/// Extract trigger text from sidecar content.
///
/// Non-JSON content and JSON objects without a trigger key are returned
/// verbatim.
pub fn parse_trigger_text(content: &str) -> String {
    if !content.starts_with('{') {
        return content.to_string();
    }

    let record = match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(record)) => record,
        Ok(_) => return content.to_string(),
        Err(e) => {
            debug!("Sidecar is not valid JSON, using raw content: {}", e);
            return content.to_string();
        }
    };

    for (key, list_capable) in READ_KEYS {
        let Some(value) = record.get(key) else {
            continue;
        };
        return match value {
            Value::Array(items) if list_capable => {
                join_phrases(items).unwrap_or_else(|| content.to_string())
            }
            other => value_to_text(other),
        };
    }

    content.to_string()
}

fn join_phrases(items: &[Value]) -> Option<String> {
    let phrases = items
        .iter()
        .map(|item| item.as_str())
        .collect::<Option<Vec<_>>>()?;
    Some(phrases.join(", "))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// How a write folds new trigger text into what is already on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarUpdate {
    /// No usable JSON object on disk: write the canonical web UI record.
    Fresh,
    /// Existing object using `activation_text`: update that key only.
    Legacy(Map<String, Value>),
    /// Existing object with `activation text`, or with neither key.
    Modern(Map<String, Value>),
}

impl SidecarUpdate {
    /// Decide the update branch from the parsed existing sidecar, if any.
    pub fn classify(existing: Option<Value>) -> Self {
        match existing {
            Some(Value::Object(record)) => {
                if !record.contains_key(ACTIVATION_TEXT)
                    && record.contains_key(ACTIVATION_TEXT_LEGACY)
                {
                    SidecarUpdate::Legacy(record)
                } else {
                    SidecarUpdate::Modern(record)
                }
            }
            _ => SidecarUpdate::Fresh,
        }
    }

    /// Produce the record to write. `text` is stored as given.
    pub fn apply(self, text: &str) -> Map<String, Value> {
        match self {
            SidecarUpdate::Fresh => canonical_record(text),
            SidecarUpdate::Legacy(mut record) => {
                record.insert(ACTIVATION_TEXT_LEGACY.to_string(), Value::from(text));
                record
            }
            SidecarUpdate::Modern(mut record) => {
                record.insert(ACTIVATION_TEXT.to_string(), Value::from(text));
                record
            }
        }
    }
}

/// The record the web UI creates for a new LoRA.
pub fn canonical_record(text: &str) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("description".to_string(), Value::from(""));
    record.insert("sd version".to_string(), Value::from(""));
    record.insert(ACTIVATION_TEXT.to_string(), Value::from(text));
    record.insert(
        "preferred weight".to_string(),
        Value::from(SidecarConfig::PREFERRED_WEIGHT),
    );
    record.insert("notes".to_string(), Value::from(""));
    record
}

fn load_existing(json_path: &Path) -> Option<Value> {
    if !json_path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(json_path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Cannot read existing sidecar {}: {}", json_path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(
                "Existing sidecar {} is not JSON, replacing it: {}",
                json_path.display(),
                e
            );
            None
        }
    }
}

/// Write trigger text to the model's `.json` sidecar, merging into an
/// existing object.
pub fn try_write(model_path: impl AsRef<Path>, text: &str) -> Result<()> {
    let paths = locate(model_path);
    let update = SidecarUpdate::classify(load_existing(&paths.json));
    let record = update.apply(text.trim());
    atomic_write_json(&paths.json, &record)
}

/// Write trigger text, reporting success as a flag. Failures are logged.
pub fn write(model_path: impl AsRef<Path>, text: &str) -> bool {
    let model_path = model_path.as_ref();
    match try_write(model_path, text) {
        Ok(()) => {
            debug!("Saved trigger text for {}", model_path.display());
            true
        }
        Err(e) => {
            warn!(
                "Failed to save trigger text for {}: {}",
                model_path.display(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn model_in(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("style.safetensors");
        std::fs::write(&path, b"weights").unwrap();
        path
    }

    #[test]
    fn test_locate_replaces_extension() {
        let paths = locate("/loras/anime/style.v2.safetensors");
        assert_eq!(paths.json, PathBuf::from("/loras/anime/style.v2.json"));
        assert_eq!(paths.txt, PathBuf::from("/loras/anime/style.v2.txt"));
    }

    #[test]
    fn test_read_without_sidecar() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        assert_eq!(read(&model).unwrap(), None);
        assert!(!exists(&model));
    }

    #[test]
    fn test_read_activation_text() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(
            dir.path().join("style.json"),
            r#"{"description": "d", "activation text": "X"}"#,
        )
        .unwrap();

        assert_eq!(read(&model).unwrap().as_deref(), Some("X"));
    }

    #[test]
    fn test_json_wins_over_txt() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(dir.path().join("style.json"), r#"{"activation text": "json"}"#).unwrap();
        std::fs::write(dir.path().join("style.txt"), "txt").unwrap();

        assert_eq!(read(&model).unwrap().as_deref(), Some("json"));
    }

    #[test]
    fn test_txt_is_verbatim_and_trimmed() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(dir.path().join("style.txt"), "  masterpiece, 1girl \n").unwrap();

        assert_eq!(read(&model).unwrap().as_deref(), Some("masterpiece, 1girl"));
    }

    #[test]
    fn test_parse_key_priority() {
        let content = r#"{"trigger_words": ["b"], "activation_text": "a2", "activation text": "a1"}"#;
        assert_eq!(parse_trigger_text(content), "a1");

        let content = r#"{"trigger_words": ["b"], "activation_text": "a2"}"#;
        assert_eq!(parse_trigger_text(content), "a2");

        let content = r#"{"trigger words": "later", "trigger_words": ["a", "b"]}"#;
        assert_eq!(parse_trigger_text(content), "a, b");
    }

    #[test]
    fn test_parse_trigger_words_variants() {
        assert_eq!(parse_trigger_text(r#"{"trigger_words": "one"}"#), "one");
        assert_eq!(parse_trigger_text(r#"{"trigger words": ["x", "y z"]}"#), "x, y z");
        assert_eq!(parse_trigger_text(r#"{"trigger_words": []}"#), "");
    }

    #[test]
    fn test_parse_non_string_list_falls_back_to_content() {
        let content = r#"{"trigger_words": ["a", 2]}"#;
        assert_eq!(parse_trigger_text(content), content);
    }

    #[test]
    fn test_parse_unknown_object_returns_content() {
        let content = r#"{"description": "no triggers here"}"#;
        assert_eq!(parse_trigger_text(content), content);
    }

    #[test]
    fn test_parse_malformed_json_returns_content() {
        let content = r#"{"activation text": "unterminated"#;
        assert_eq!(parse_trigger_text(content), content);
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(parse_trigger_text("neon lights"), "neon lights");
    }

    #[test]
    fn test_write_fresh_record() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);

        assert!(write(&model, "  foo, bar  "));

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("style.json")).unwrap())
                .unwrap();
        assert_eq!(
            written,
            json!({
                "description": "",
                "sd version": "",
                "activation text": "foo, bar",
                "preferred weight": 1.0,
                "notes": ""
            })
        );
        let keys: Vec<_> = written.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            ["description", "sd version", "activation text", "preferred weight", "notes"]
        );
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);

        assert!(write(&model, "foo, bar"));
        assert_eq!(read(&model).unwrap().as_deref(), Some("foo, bar"));
    }

    #[test]
    fn test_write_preserves_other_fields() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(
            dir.path().join("style.json"),
            r#"{"notes": "hello", "sd version": "SDXL", "preferred weight": 0.7, "custom": [1, 2]}"#,
        )
        .unwrap();

        assert!(write(&model, "new words"));

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("style.json")).unwrap())
                .unwrap();
        assert_eq!(written["notes"], "hello");
        assert_eq!(written["sd version"], "SDXL");
        assert_eq!(written["preferred weight"], 0.7);
        assert_eq!(written["custom"], json!([1, 2]));
        assert_eq!(written[ACTIVATION_TEXT], "new words");
    }

    #[test]
    fn test_write_updates_legacy_key() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(dir.path().join("style.json"), r#"{"activation_text": "old"}"#).unwrap();

        assert!(write(&model, "new"));

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("style.json")).unwrap())
                .unwrap();
        assert_eq!(written, json!({"activation_text": "new"}));
    }

    #[test]
    fn test_write_replaces_unparseable_sidecar() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        std::fs::write(dir.path().join("style.json"), "{ not json").unwrap();

        assert!(write(&model, "fresh"));
        assert_eq!(read(&model).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_write_same_text_twice_is_stable() {
        let dir = TempDir::new().unwrap();
        let model = model_in(&dir);
        let json_path = dir.path().join("style.json");

        assert!(write(&model, "a, b"));
        let first = std::fs::read_to_string(&json_path).unwrap();
        assert!(write(&model, "a, b"));
        let second = std::fs::read_to_string(&json_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("missing-dir").join("style.safetensors");

        assert!(!write(&model, "anything"));
        assert!(try_write(&model, "anything").is_err());
    }

    #[test]
    fn test_classify_branches() {
        assert_eq!(SidecarUpdate::classify(None), SidecarUpdate::Fresh);
        assert_eq!(
            SidecarUpdate::classify(Some(json!(["not", "an", "object"]))),
            SidecarUpdate::Fresh
        );
        assert!(matches!(
            SidecarUpdate::classify(Some(json!({"activation_text": "x"}))),
            SidecarUpdate::Legacy(_)
        ));
        assert!(matches!(
            SidecarUpdate::classify(Some(json!({"activation_text": "x", "activation text": "y"}))),
            SidecarUpdate::Modern(_)
        ));
        assert!(matches!(
            SidecarUpdate::classify(Some(json!({"notes": "n"}))),
            SidecarUpdate::Modern(_)
        ));
    }
}
