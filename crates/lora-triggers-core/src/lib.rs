//! LoRA Triggers Core - trigger-word resolution and sidecar persistence.
//!
//! Given a LoRA file, this crate finds the phrase that activates it by trying,
//! in order, a sidecar file, the safetensors header metadata, and a Civitai
//! lookup by content hash. Discoveries are written back as a sidecar that the
//! Automatic1111 web UI can also read.
//!
//! Weight loading and merging live outside this crate; see the
//! `lora-triggers-nodes` crate for the loader workflows.
//!
//! # Example
//!
//! ```rust,ignore
//! use lora_triggers_core::{DirectoryPaths, TriggerResolver};
//!
//! #[tokio::main]
//! async fn main() -> lora_triggers_core::Result<()> {
//!     let paths = DirectoryPaths::new("/models/loras");
//!     let resolver = TriggerResolver::with_registry()?;
//!
//!     let resolution = resolver.resolve(&paths, "anime/style.safetensors").await;
//!     println!("{} (from {:?})", resolution.text, resolution.source);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedded;
pub mod error;
pub mod hashing;
pub mod paths;
pub mod registry;
pub mod resolver;
pub mod sidecar;
pub mod text;

// Re-export commonly used types
pub use config::{HashingConfig, NetworkConfig, RegistryConfig, SidecarConfig};
pub use error::{Result, TriggerError};
pub use hashing::{compute_body_hash, compute_full_hash, HashDigest, HashVariant};
pub use paths::{DirectoryPaths, LoraPaths};
pub use registry::{DynTriggerLookup, RegistryClient, TriggerLookup};
pub use resolver::{Resolution, Tier, TierOutcome, TriggerResolver};
pub use sidecar::{SidecarPaths, SidecarUpdate};
pub use text::{compose, join_triggers};
