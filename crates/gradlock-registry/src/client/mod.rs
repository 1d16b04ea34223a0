//! HTTP client for the fetch-and-hash fallback.
//!
//! When no local trust source can attest a file, the merger fetches it over
//! its candidate URLs and the observed sha256 becomes authoritative. URLs
//! are tried in declared-repository order, each attempt bounded by a
//! timeout so one unreachable mirror cannot stall the run; any failure
//! falls through to the next candidate.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use crate::RegistryResult;
use gradlock_core::error::LockError;

/// Default per-URL attempt timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client over a repository's candidate URLs.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with connection pooling and the default timeout.
    pub fn new() -> RegistryResult<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("gradlock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LockError::network("failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    /// Fetch the first reachable candidate URL, hashing the body while it
    /// streams. Returns the winning URL and the hex sha256 of the content,
    /// or `None` when every candidate fails.
    pub async fn fetch_and_hash(&self, urls: &[String]) -> Option<(String, String)> {
        for candidate in urls {
            if Url::parse(candidate).is_err() {
                warn!("skipping malformed candidate url {candidate}");
                continue;
            }
            match self.hash_one(candidate).await {
                Ok(hash) => {
                    debug!("fetched and hashed {candidate}");
                    return Some((candidate.clone(), hash));
                }
                Err(e) => {
                    debug!("{candidate}: {e}; trying next candidate");
                }
            }
        }
        None
    }

    /// Fetch the first reachable candidate URL whole (used for module
    /// descriptors, which are parsed *and* hashed, so the exact bytes
    /// matter). Returns the winning URL and the body, or `None` when every
    /// candidate fails.
    pub async fn fetch_bytes(&self, urls: &[String]) -> Option<(String, Vec<u8>)> {
        for candidate in urls {
            if Url::parse(candidate).is_err() {
                warn!("skipping malformed candidate url {candidate}");
                continue;
            }
            match self.bytes_one(candidate).await {
                Ok(body) => return Some((candidate.clone(), body)),
                Err(e) => {
                    debug!("{candidate}: {e}; trying next candidate");
                }
            }
        }
        None
    }

    async fn hash_one(&self, url: &str) -> RegistryResult<String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LockError::network(format!("request to {url} failed"), e))?;

        if !response.status().is_success() {
            return Err(LockError::Network {
                message: format!("{url} returned status {}", response.status()),
                source: None,
            });
        }

        // Stream chunks straight into the hasher; artifacts can be large
        // and the content itself is not needed.
        let mut hasher = Sha256::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LockError::network(format!("reading body from {url} failed"), e))?
        {
            hasher.update(&chunk);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    async fn bytes_one(&self, url: &str) -> RegistryResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LockError::network(format!("request to {url} failed"), e))?;

        if !response.status().is_success() {
            return Err(LockError::Network {
                message: format!("{url} returned status {}", response.status()),
                source: None,
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| LockError::network(format!("reading body from {url} failed"), e))
    }
}
