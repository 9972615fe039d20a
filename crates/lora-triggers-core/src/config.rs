//! Centralized configuration for the trigger-word engine.
//!
//! Constants for the remote registry, hashing and the sidecar file format, plus
//! the runtime [`RegistryConfig`] whose defaults are drawn from them.

use std::time::Duration;

/// Remote registry configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REGISTRY_API_BASE: &'static str = "https://civitai.com";
    pub const BY_HASH_PATH: &'static str = "/api/v1/model-versions/by-hash/";
    pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
    // The registry rejects some non-browser agents.
    pub const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT: &'static str = "application/json";
}

/// Hash computation configuration.
pub struct HashingConfig;

impl HashingConfig {
    pub const CHUNK_SIZE: usize = 64 * 1024;
    /// Length of the little-endian header-size prefix of a safetensors file.
    pub const HEADER_PREFIX_LEN: u64 = 8;
    pub const MAX_HEADER_SIZE: u64 = 100_000_000;
}

/// Sidecar file format configuration.
pub struct SidecarConfig;

impl SidecarConfig {
    pub const JSON_EXTENSION: &'static str = "json";
    pub const TEXT_EXTENSION: &'static str = "txt";
    pub const INDENT: &'static [u8] = b"    ";
    pub const PREFERRED_WEIGHT: f64 = 1.0;
    /// Extension of the native container that carries embedded metadata.
    pub const NATIVE_EXTENSION: &'static str = "safetensors";
    /// Model file extensions listed by the directory path registry.
    pub const MODEL_EXTENSIONS: &'static [&'static str] =
        &["safetensors", "ckpt", "pt", "pth", "bin", "sft"];
}

/// Runtime configuration for [`crate::registry::RegistryClient`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Scheme and host of the registry, without a trailing path.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl RegistryConfig {
    /// Point the client at a different registry host (mirrors, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: NetworkConfig::REGISTRY_API_BASE.to_string(),
            timeout: NetworkConfig::LOOKUP_TIMEOUT,
            user_agent: NetworkConfig::USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.base_url, "https://civitai.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_registry_overrides() {
        let config = RegistryConfig::default()
            .with_base_url("http://127.0.0.1:9000")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_chunk_size_is_bounded() {
        assert_eq!(HashingConfig::CHUNK_SIZE, 65_536);
        assert!(HashingConfig::MAX_HEADER_SIZE > 0);
    }
}
