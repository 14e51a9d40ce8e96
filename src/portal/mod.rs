mod types;

pub use types::{ArtifactFormat, InvoiceRecord};

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::PortalSettings;
use crate::error::{DteError, Result};

/// Fetches the binary rendering of a document. Split out as a trait so
/// the export pipeline can be driven against a mock in tests.
#[async_trait]
pub trait ArtifactFetcher {
    async fn fetch(&self, raw_id: i64, format: ArtifactFormat) -> Result<Vec<u8>>;
}

/// HTTP client for the DTE portal REST API.
pub struct PortalClient {
    base_url: String,
    api_token: Option<String>,
    page_size: u32,
    http: reqwest::Client,
}

impl PortalClient {
    pub fn new(settings: &PortalSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DteError::PortalRequest {
                url: settings.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
            page_size: settings.page_size,
            http,
        })
    }

    /// Fetch the complete document listing for one account, walking the
    /// paginated endpoint until a short page.
    pub async fn list_documents(&self, account_id: &str) -> Result<Vec<InvoiceRecord>> {
        let url = format!("{}/v1/accounts/{}/documents", self.base_url, account_id);
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = self
                .http
                .get(&url)
                .query(&[("page", page), ("page_size", self.page_size)]);
            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| DteError::PortalRequest {
                    url: url.clone(),
                    source: e,
                })?;

            if !response.status().is_success() {
                return Err(DteError::PortalStatus {
                    url,
                    status: response.status().as_u16(),
                });
            }

            let batch: Vec<InvoiceRecord> =
                response.json().await.map_err(|e| DteError::PortalRequest {
                    url: url.clone(),
                    source: e,
                })?;

            debug!(account = account_id, page, count = batch.len(), "fetched document page");

            let last = (batch.len() as u32) < self.page_size;
            all.extend(batch);
            if last {
                return Ok(all);
            }
            page += 1;
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ArtifactFetcher for PortalClient {
    async fn fetch(&self, raw_id: i64, format: ArtifactFormat) -> Result<Vec<u8>> {
        let url = format!("{}/v1/documents/{}/file", self.base_url, raw_id);
        let request = self
            .http
            .get(&url)
            .query(&[("format", format.extension())]);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| DteError::PortalRequest {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(DteError::PortalStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| DteError::PortalRequest {
            url: url.clone(),
            source: e,
        })?;
        debug!(raw_id, %format, size = bytes.len(), "fetched artifact");
        Ok(bytes.to_vec())
    }
}
