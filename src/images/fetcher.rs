//! Network fetching of image payloads

use crate::error::{SpoolError, SpoolResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches raw image bytes for a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the payload; non-2xx responses are errors
    async fn fetch(&self, url: &str) -> SpoolResult<Vec<u8>>;
}

/// HTTP fetcher backed by a shared `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher; `None` leaves requests without a timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder().timeout_global(timeout).build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> SpoolResult<Vec<u8>> {
        let agent = self.agent.clone();
        let target = url.to_string();

        // ureq is blocking, keep it off the async workers
        let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
            let mut response = agent.get(&target).call().map_err(describe)?;
            response
                .body_mut()
                .read_to_vec()
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| SpoolError::Task(e.to_string()))?;

        match result {
            Ok(bytes) => {
                debug!("Fetched {} bytes from {}", bytes.len(), url);
                Ok(bytes)
            }
            Err(reason) => Err(SpoolError::image_fetch(url, reason)),
        }
    }
}

/// Short failure text, `HTTP <status>` for status errors
fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::StatusCode(code) => format!("HTTP {}", code),
        other => other.to_string(),
    }
}

/// Failure text recorded in diagnostics for a fetch error
pub fn failure_reason(err: &SpoolError) -> String {
    match err {
        SpoolError::ImageFetch { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
