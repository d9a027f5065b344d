// One-shot resource directory fetch (GET /api/servers) and the state it feeds

use std::time::Duration;

use tracing::instrument;
use url::Url;

use crate::endpoints;
use crate::error::TransportError;
use crate::models::ResourceDescriptor;

pub struct DirectoryClient {
    http: reqwest::Client,
    url: Url,
    timeout_ms: u64,
}

impl DirectoryClient {
    pub fn new(base: &Url, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            http,
            url: endpoints::directory_url(base)?,
            timeout_ms,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Single attempt, no retry. Order of the returned descriptors is the server's.
    #[instrument(skip(self), fields(operation = "fetch_directory", url = %self.url))]
    pub async fn fetch_directory(&self) -> Result<Vec<ResourceDescriptor>, TransportError> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_reqwest(e))?;
        let servers: Vec<ResourceDescriptor> =
            serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        tracing::debug!(servers = servers.len(), "directory fetched");
        Ok(servers)
    }

    /// Runs a fetch against `view`: loading while in flight, then data or error, never both.
    pub async fn refresh(&self, view: &mut DirectoryView) {
        view.begin_fetch();
        let result = self.fetch_directory().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "An error occurred while fetching servers");
        }
        view.finish(result);
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Last directory result as shown by the non-streaming view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryView {
    pub servers: Vec<ResourceDescriptor>,
    pub is_loading: bool,
    pub has_fetched: bool,
    pub error: Option<String>,
}

impl DirectoryView {
    pub fn begin_fetch(&mut self) {
        self.is_loading = true;
        self.has_fetched = true;
        self.error = None;
    }

    /// A failure clears previous servers so stale data never sits next to an error.
    pub fn finish(&mut self, result: Result<Vec<ResourceDescriptor>, TransportError>) {
        match result {
            Ok(servers) => {
                self.servers = servers;
                self.error = None;
            }
            Err(e) => {
                self.servers.clear();
                self.error = Some(e.to_string());
            }
        }
        self.is_loading = false;
    }
}
