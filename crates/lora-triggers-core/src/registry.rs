//! Hash-indexed remote registry lookup.
//!
//! Asks Civitai which model version a digest belongs to and returns that
//! version's `trainedWords`. Every failure mode (404, other statuses, network
//! errors, timeouts, malformed bodies) is reported as "not found" so the
//! resolver can move on to the next tier.

use crate::config::{NetworkConfig, RegistryConfig};
use crate::error::{Result, TriggerError};
use crate::hashing::HashDigest;
use crate::text::join_triggers;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of trigger words keyed by content hash.
#[async_trait]
pub trait TriggerLookup: Send + Sync {
    /// Trigger text for a digest, or `None` when the source has no match.
    async fn fetch(&self, digest: &HashDigest) -> Option<String>;
}

/// Shared handle used by the resolver.
pub type DynTriggerLookup = Arc<dyn TriggerLookup>;

/// The subset of a model-version response we care about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelVersionResponse {
    #[serde(default)]
    trained_words: Option<Vec<String>>,
}

/// Extract joined `trainedWords` from a by-hash response body.
///
/// An absent list, a list of blank entries, or a body that is not the
/// expected JSON object is `None`. Entries are trimmed before joining.
pub fn trained_words_from_body(body: &str) -> Option<String> {
    let response: ModelVersionResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            warn!("Malformed registry response: {}", e);
            return None;
        }
    };

    let words = join_triggers(response.trained_words.unwrap_or_default());
    (!words.is_empty()).then_some(words)
}

/// HTTP client for the Civitai by-hash endpoint.
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Create a client for the public registry.
    pub fn new() -> Result<Self> {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a client with a custom configuration.
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(NetworkConfig::ACCEPT),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| TriggerError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: Some(e.to_string()),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Full lookup URL for a digest.
    pub fn lookup_url(&self, digest: &HashDigest) -> Result<url::Url> {
        let base = url::Url::parse(&self.config.base_url).map_err(|e| TriggerError::Config {
            message: format!("Invalid registry URL {}: {}", self.config.base_url, e),
        })?;
        let path = format!("{}{}", NetworkConfig::BY_HASH_PATH, digest.hex);
        base.join(&path).map_err(|e| TriggerError::Config {
            message: format!("Invalid lookup path {}: {}", path, e),
        })
    }

    /// Perform the lookup, surfacing failures as errors.
    ///
    /// `Ok(None)` covers the normal misses: 404 and an empty `trainedWords`.
    pub async fn try_fetch(&self, digest: &HashDigest) -> Result<Option<String>> {
        let url = self.lookup_url(digest)?;
        debug!("Looking up {} at {}", digest, url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                TriggerError::Timeout(self.config.timeout)
            } else {
                TriggerError::Network {
                    message: format!("GET {} failed: {}", url, e),
                    cause: Some(e.to_string()),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Registry has no model for {}", digest);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TriggerError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TriggerError::Timeout(self.config.timeout)
            } else {
                TriggerError::Network {
                    message: format!("Reading body from {} failed: {}", url, e),
                    cause: Some(e.to_string()),
                }
            }
        })?;
        Ok(trained_words_from_body(&body))
    }
}

#[async_trait]
impl TriggerLookup for RegistryClient {
    async fn fetch(&self, digest: &HashDigest) -> Option<String> {
        match self.try_fetch(digest).await {
            Ok(Some(words)) => {
                info!("Registry matched {}", digest);
                Some(words)
            }
            Ok(None) => None,
            Err(e) if e.is_transient() => {
                warn!("Registry lookup for {} failed (transient): {}", digest, e);
                None
            }
            Err(e) => {
                warn!("Registry lookup for {} failed: {}", digest, e);
                None
            }
        }
    }
}
