//! Trigger phrases embedded in a safetensors header.
//!
//! Safetensors format:
//! - 0-7: header size (u64, little-endian)
//! - 8+: JSON header; the optional `__metadata__` entry is a string-to-string map
//!
//! Training tools record trigger phrases there under `modelspec.trigger_phrase`
//! or `trigger_words` (the latter usually a JSON-encoded list).

use crate::config::{HashingConfig, SidecarConfig};
use crate::error::{Result, TriggerError};
use crate::text::join_triggers;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::debug;

const METADATA_KEY: &str = "__metadata__";
const TRIGGER_PHRASE_KEY: &str = "modelspec.trigger_phrase";
const TRIGGER_WORDS_KEY: &str = "trigger_words";

/// Whether a file is in the native container that carries embedded metadata.
pub fn is_native_format(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(SidecarConfig::NATIVE_EXTENSION))
        .unwrap_or(false)
}

/// Read the `__metadata__` dictionary from a safetensors header.
///
/// Returns `Ok(None)` when the header has no metadata entry. Non-string values
/// are skipped.
pub fn read_embedded_metadata(path: impl AsRef<Path>) -> Result<Option<Map<String, Value>>> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| TriggerError::io_with_path(e, path))?;

    let mut size_buf = [0u8; HashingConfig::HEADER_PREFIX_LEN as usize];
    file.read_exact(&mut size_buf)
        .map_err(|e| TriggerError::io_with_path(e, path))?;
    let header_size = u64::from_le_bytes(size_buf);

    if header_size > HashingConfig::MAX_HEADER_SIZE {
        return Err(TriggerError::InvalidHeader {
            path: path.to_path_buf(),
            message: format!("header size {} too large", header_size),
        });
    }

    let mut header_buf = vec![0u8; header_size as usize];
    file.read_exact(&mut header_buf)
        .map_err(|e| TriggerError::io_with_path(e, path))?;

    let header: Value = serde_json::from_slice(&header_buf)?;
    let metadata = match header.get(METADATA_KEY) {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| v.is_string())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => return Ok(None),
    };

    Ok(Some(metadata))
}

/// Pick the trigger text out of an embedded metadata dictionary.
///
/// `modelspec.trigger_phrase` wins over `trigger_words`; blank values count as
/// absent.
pub fn trigger_words_from_metadata(metadata: &Map<String, Value>) -> Option<String> {
    if let Some(phrase) = non_blank(metadata, TRIGGER_PHRASE_KEY) {
        return Some(phrase.trim().to_string());
    }

    let raw = non_blank(metadata, TRIGGER_WORDS_KEY)?;
    let text = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => join_triggers(items.iter().map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        _ => raw.trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn non_blank<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Trigger text embedded in a model file, if any.
///
/// Any error (wrong format, unreadable file, malformed header) is `None`.
pub fn extract_trigger_words(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    if !is_native_format(path) {
        return None;
    }

    match read_embedded_metadata(path) {
        Ok(Some(metadata)) => trigger_words_from_metadata(&metadata),
        Ok(None) => None,
        Err(e) => {
            debug!("No embedded metadata in {}: {}", path.display(), e);
            None
        }
    }
}
