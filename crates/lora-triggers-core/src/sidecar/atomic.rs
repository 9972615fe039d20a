//! Atomic JSON persistence for sidecar files.
//!
//! Implements atomic writes using:
//! 1. Serialize with the web UI's 4-space indentation
//! 2. Write to a temp file in the target directory
//! 3. fsync to ensure data reaches disk
//! 4. Atomic rename to target path
//!
//! The target directory is never created: a sidecar lives next to its model.

use crate::config::SidecarConfig;
use crate::error::{Result, TriggerError};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Serialize `data` the way the sidecar format expects.
///
/// 4-space indentation, UTF-8, non-ASCII characters kept literal.
pub fn to_sidecar_json<T: Serialize>(data: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(SidecarConfig::INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer).map_err(|e| TriggerError::Json {
        message: format!("Failed to serialize sidecar: {}", e),
        source: Some(e),
    })?;

    String::from_utf8(buf).map_err(|e| TriggerError::Other(format!("Sidecar is not UTF-8: {}", e)))
}

/// Write data to a JSON file atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let serialized = to_sidecar_json(data)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".sidecar-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| TriggerError::Io {
            message: format!("Failed to create temp file in {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;

    temp.write_all(serialized.as_bytes())
        .map_err(|e| TriggerError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;

    temp.as_file().sync_all().map_err(|e| TriggerError::Io {
        message: format!("Failed to sync temp file {}", temp.path().display()),
        path: Some(temp.path().to_path_buf()),
        source: Some(e),
    })?;

    // Dropping the failed NamedTempFile removes it.
    temp.persist(path).map_err(|e| TriggerError::Io {
        message: format!("Failed to rename temp file to {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}
