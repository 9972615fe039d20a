//! Logical LoRA names to files on disk.
//!
//! The host pipeline owns the folder registry; [`LoraPaths`] is the seam it
//! implements. [`DirectoryPaths`] is a plain implementation over one or more
//! LoRA root directories.

use crate::config::SidecarConfig;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolves logical LoRA names (relative paths like `anime/style.safetensors`).
pub trait LoraPaths {
    /// Absolute path of a logical name, or `None` if it does not resolve.
    fn resolve_file_path(&self, name: &str) -> Option<PathBuf>;

    /// All selectable logical names, in display order.
    fn list_available(&self) -> Vec<String>;
}

/// Path registry backed by LoRA root directories, searched in order.
#[derive(Debug, Clone, Default)]
pub struct DirectoryPaths {
    roots: Vec<PathBuf>,
}

impl DirectoryPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Add another root; earlier roots win when names collide.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Whether a file has one of the recognised model extensions.
pub fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SidecarConfig::MODEL_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

// Logical names must stay inside their root.
fn is_contained(name: &Path) -> bool {
    name.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl LoraPaths for DirectoryPaths {
    fn resolve_file_path(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        if name.is_empty() || !is_contained(relative) {
            debug!("Rejecting LoRA name outside roots: {:?}", name);
            return None;
        }

        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }

    fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for root in &self.roots {
            for entry in WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_model_file(e.path()))
            {
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names.sort_by_key(|n| n.to_lowercase());
        names
    }
}
