//! The trigger-word fallback chain.
//!
//! Tiers run in a fixed order and the first `Found` wins:
//! 1. Sidecar next to the model (`.json`, then `.txt`)
//! 2. Metadata embedded in the safetensors header
//! 3. Registry lookup by AutoV3 body hash (safetensors only)
//! 4. Registry lookup by AutoV2 full-file hash
//!
//! Anything found by tiers 2-4 is written back as a sidecar so the next
//! resolution stops at tier 1. Running out of tiers yields empty text.

use crate::embedded;
use crate::error::{Result, TriggerError};
use crate::hashing::{self, HashDigest, HashVariant};
use crate::paths::LoraPaths;
use crate::registry::{DynTriggerLookup, RegistryClient};
use crate::sidecar;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Sidecar,
    Embedded,
    BodyHash,
    FullHash,
}

impl Tier {
    /// Tiers in evaluation order.
    pub const ALL: [Tier; 4] = [Tier::Sidecar, Tier::Embedded, Tier::BodyHash, Tier::FullHash];

    /// Whether text found by this tier is written back as a sidecar.
    pub fn persists(&self) -> bool {
        !matches!(self, Tier::Sidecar)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Sidecar => "sidecar",
            Tier::Embedded => "embedded metadata",
            Tier::BodyHash => "registry (AutoV3)",
            Tier::FullHash => "registry (AutoV2)",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Found(String),
    /// The tier does not apply to this file (no sidecar, wrong format, offline).
    NotApplicable,
    /// The tier applied but produced nothing (I/O error, registry miss).
    Failed,
}

/// Outcome of a full resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    /// Tier that produced the text; `None` when every tier missed.
    pub source: Option<Tier>,
    /// Whether a sidecar was written for a newly discovered text.
    pub persisted: bool,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.source.is_some()
    }
}

/// Runs the fallback chain for model files.
///
/// Holds no per-model state; one resolver can serve every invocation.
#[derive(Clone, Default)]
pub struct TriggerResolver {
    lookup: Option<DynTriggerLookup>,
}

impl TriggerResolver {
    /// Resolver using the given remote lookup for the hash tiers.
    pub fn new(lookup: DynTriggerLookup) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    /// Resolver backed by the public registry.
    pub fn with_registry() -> Result<Self> {
        Ok(Self::new(Arc::new(RegistryClient::new()?)))
    }

    /// Resolver without remote lookups; the hash tiers never apply.
    pub fn offline() -> Self {
        Self { lookup: None }
    }

    pub fn is_offline(&self) -> bool {
        self.lookup.is_none()
    }

    /// Resolve a logical name through the host's path registry.
    ///
    /// An unresolvable name yields an empty resolution without touching the
    /// filesystem or the network.
    pub async fn resolve(&self, paths: &dyn LoraPaths, name: &str) -> Resolution {
        match paths.resolve_file_path(name) {
            Some(path) => self.resolve_path(&path).await,
            None => {
                debug!("LoRA {:?} does not resolve to a file", name);
                Resolution::default()
            }
        }
    }

    /// Convenience wrapper returning only the text.
    pub async fn resolve_text(&self, paths: &dyn LoraPaths, name: &str) -> String {
        self.resolve(paths, name).await.text
    }

    /// Run the fallback chain for a model file.
    pub async fn resolve_path(&self, model_path: &Path) -> Resolution {
        for tier in Tier::ALL {
            match self.run_tier(tier, model_path).await {
                TierOutcome::Found(text) => {
                    let text = text.trim().to_string();
                    let persisted = tier.persists() && persist(model_path, &text);
                    debug!(
                        "Trigger words for {} from {}",
                        model_path.display(),
                        tier
                    );
                    return Resolution {
                        text,
                        source: Some(tier),
                        persisted,
                    };
                }
                TierOutcome::NotApplicable => {}
                TierOutcome::Failed => {
                    debug!("Tier {} missed for {}", tier, model_path.display());
                }
            }
        }

        debug!("No trigger words found for {}", model_path.display());
        Resolution::default()
    }

    /// Run a single tier. Exposed for diagnostics.
    pub async fn run_tier(&self, tier: Tier, model_path: &Path) -> TierOutcome {
        match tier {
            Tier::Sidecar => match sidecar::read(model_path) {
                Ok(Some(text)) => TierOutcome::Found(text),
                Ok(None) => TierOutcome::NotApplicable,
                Err(e) => {
                    warn!("Unreadable sidecar for {}: {}", model_path.display(), e);
                    TierOutcome::Failed
                }
            },
            Tier::Embedded => {
                if !embedded::is_native_format(model_path) {
                    return TierOutcome::NotApplicable;
                }
                match embedded::extract_trigger_words(model_path) {
                    Some(text) => TierOutcome::Found(text),
                    None => TierOutcome::NotApplicable,
                }
            }
            Tier::BodyHash => {
                if !embedded::is_native_format(model_path) {
                    return TierOutcome::NotApplicable;
                }
                self.remote(model_path, HashVariant::AutoV3).await
            }
            Tier::FullHash => self.remote(model_path, HashVariant::AutoV2).await,
        }
    }

    async fn remote(&self, model_path: &Path, variant: HashVariant) -> TierOutcome {
        let Some(lookup) = &self.lookup else {
            return TierOutcome::NotApplicable;
        };

        let digest = match hash_blocking(model_path.to_path_buf(), variant).await {
            Ok(digest) => digest,
            Err(e) => {
                debug!(
                    "No {} hash for {}: {}",
                    variant,
                    model_path.display(),
                    e
                );
                return TierOutcome::Failed;
            }
        };

        match lookup.fetch(&digest).await {
            Some(words) if !words.trim().is_empty() => TierOutcome::Found(words),
            _ => TierOutcome::Failed,
        }
    }
}

async fn hash_blocking(path: PathBuf, variant: HashVariant) -> Result<HashDigest> {
    tokio::task::spawn_blocking(move || hashing::compute_hash(&path, variant))
        .await
        .map_err(|e| TriggerError::Other(format!("Hash computation task failed: {}", e)))?
}

fn persist(model_path: &Path, text: &str) -> bool {
    let saved = sidecar::write(model_path, text);
    if saved {
        info!("Saved discovered trigger words for {}", model_path.display());
    }
    saved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::DirectoryPaths;
    use crate::registry::TriggerLookup;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Lookup that answers per variant and records every digest it sees.
    #[derive(Default)]
    struct RecordingLookup {
        body: Option<String>,
        full: Option<String>,
        calls: Mutex<Vec<HashDigest>>,
    }

    impl RecordingLookup {
        fn variants(&self) -> Vec<HashVariant> {
            self.calls.lock().unwrap().iter().map(|d| d.variant).collect()
        }
    }

    #[async_trait]
    impl TriggerLookup for RecordingLookup {
        async fn fetch(&self, digest: &HashDigest) -> Option<String> {
            self.calls.lock().unwrap().push(digest.clone());
            match digest.variant {
                HashVariant::AutoV3 => self.body.clone(),
                HashVariant::AutoV2 => self.full.clone(),
            }
        }
    }

    fn write_safetensors(dir: &Path, name: &str, metadata: serde_json::Value) -> PathBuf {
        let header = serde_json::to_vec(&json!({ "__metadata__": metadata })).unwrap();
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(b"tensor bytes");
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn resolver_with(lookup: &Arc<RecordingLookup>) -> TriggerResolver {
        TriggerResolver::new(lookup.clone())
    }

    #[tokio::test]
    async fn test_sidecar_short_circuits() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(
            dir.path(),
            "a.safetensors",
            json!({"modelspec.trigger_phrase": "embedded"}),
        );
        std::fs::write(dir.path().join("a.json"), r#"{"activation text": "X"}"#).unwrap();
        let lookup = Arc::new(RecordingLookup {
            body: Some("remote".into()),
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution.text, "X");
        assert_eq!(resolution.source, Some(Tier::Sidecar));
        assert!(!resolution.persisted);
        assert!(lookup.variants().is_empty());
    }

    #[tokio::test]
    async fn test_empty_sidecar_still_short_circuits() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        std::fs::write(dir.path().join("a.txt"), "   ").unwrap();
        let lookup = Arc::new(RecordingLookup {
            body: Some("remote".into()),
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution.text, "");
        assert_eq!(resolution.source, Some(Tier::Sidecar));
        assert!(lookup.variants().is_empty());
    }

    #[tokio::test]
    async fn test_embedded_metadata_is_persisted() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(
            dir.path(),
            "a.safetensors",
            json!({"trigger_words": "[\"neon\", \"glow\"]"}),
        );
        let lookup = Arc::new(RecordingLookup::default());
        let resolver = resolver_with(&lookup);

        let first = resolver.resolve_path(&model).await;
        assert_eq!(first.text, "neon, glow");
        assert_eq!(first.source, Some(Tier::Embedded));
        assert!(first.persisted);
        assert!(lookup.variants().is_empty());

        let second = resolver.resolve_path(&model).await;
        assert_eq!(second.text, "neon, glow");
        assert_eq!(second.source, Some(Tier::Sidecar));
    }

    #[tokio::test]
    async fn test_body_hash_hit() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        let lookup = Arc::new(RecordingLookup {
            body: Some("remote words".into()),
            full: Some("never".into()),
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution.text, "remote words");
        assert_eq!(resolution.source, Some(Tier::BodyHash));
        assert_eq!(lookup.variants(), vec![HashVariant::AutoV3]);
        assert_eq!(
            sidecar::read(&model).unwrap().as_deref(),
            Some("remote words")
        );
    }

    #[tokio::test]
    async fn test_full_hash_attempted_once_after_body_miss() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        let lookup = Arc::new(RecordingLookup {
            body: None,
            full: Some("full match".into()),
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution.text, "full match");
        assert_eq!(resolution.source, Some(Tier::FullHash));
        assert_eq!(
            lookup.variants(),
            vec![HashVariant::AutoV3, HashVariant::AutoV2]
        );
        let digests = lookup.calls.lock().unwrap().clone();
        assert_eq!(digests[1], hashing::compute_full_hash(&model).unwrap());
    }

    #[tokio::test]
    async fn test_all_tiers_exhausted() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        let lookup = Arc::new(RecordingLookup::default());

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution, Resolution::default());
        assert_eq!(lookup.variants().len(), 2);
        assert!(!sidecar::exists(&model));
    }

    #[tokio::test]
    async fn test_non_native_format_skips_body_hash() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("old.ckpt");
        std::fs::write(&model, b"pickle bytes").unwrap();
        let lookup = Arc::new(RecordingLookup {
            body: Some("wrong".into()),
            full: Some("ckpt words".into()),
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;

        assert_eq!(resolution.text, "ckpt words");
        assert_eq!(lookup.variants(), vec![HashVariant::AutoV2]);
    }

    #[tokio::test]
    async fn test_blank_remote_words_are_a_miss() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        let lookup = Arc::new(RecordingLookup {
            body: Some("  ".into()),
            full: None,
            ..Default::default()
        });

        let resolution = resolver_with(&lookup).resolve_path(&model).await;
        assert!(!resolution.is_found());
    }

    #[tokio::test]
    async fn test_empty_embedded_list_falls_through_to_registry() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({"trigger_words": "[]"}));
        let lookup = Arc::new(RecordingLookup {
            body: Some("real words".into()),
            ..Default::default()
        });
        let resolver = resolver_with(&lookup);

        let first = resolver.resolve_path(&model).await;
        assert_eq!(first.text, "real words");
        assert_eq!(first.source, Some(Tier::BodyHash));
        assert_eq!(lookup.variants(), vec![HashVariant::AutoV3]);

        let saved = sidecar::read(&model).unwrap();
        assert_eq!(saved.as_deref(), Some("real words"));
    }

    #[tokio::test]
    async fn test_found_text_matches_later_reads() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));
        let lookup = Arc::new(RecordingLookup {
            body: Some("  pixel art \n".into()),
            ..Default::default()
        });
        let resolver = resolver_with(&lookup);

        let first = resolver.resolve_path(&model).await;
        let second = resolver.resolve_path(&model).await;

        assert_eq!(first.text, "pixel art");
        assert_eq!(second.text, first.text);
        assert_eq!(second.source, Some(Tier::Sidecar));
    }

    #[tokio::test]
    async fn test_offline_resolver_skips_remote_tiers() {
        let dir = TempDir::new().unwrap();
        let model = write_safetensors(dir.path(), "a.safetensors", json!({}));

        let resolver = TriggerResolver::offline();
        assert!(resolver.is_offline());
        assert_eq!(resolver.run_tier(Tier::BodyHash, &model).await, TierOutcome::NotApplicable);
        assert_eq!(resolver.resolve_path(&model).await.text, "");
    }

    #[tokio::test]
    async fn test_unresolvable_name_skips_everything() {
        let dir = TempDir::new().unwrap();
        let paths = DirectoryPaths::new(dir.path());
        let lookup = Arc::new(RecordingLookup {
            full: Some("never".into()),
            ..Default::default()
        });

        let text = resolver_with(&lookup)
            .resolve_text(&paths, "missing.safetensors")
            .await;

        assert_eq!(text, "");
        assert!(lookup.variants().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_by_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let model = write_safetensors(&dir.path().join("sub"), "b.safetensors", json!({}));
        std::fs::write(model.with_extension("json"), r#"{"trigger_words": ["a", "b"]}"#).unwrap();
        let paths = DirectoryPaths::new(dir.path());

        let resolution = TriggerResolver::offline()
            .resolve(&paths, "sub/b.safetensors")
            .await;

        assert_eq!(resolution.text, "a, b");
    }
}
