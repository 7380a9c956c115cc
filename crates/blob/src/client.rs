//! HTTP client for the blob listing API
//!
//! Listing calls are authenticated with a bearer token. Object downloads go
//! straight to the URL the listing returned and carry no credentials.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use bc_core::config::SourceConfig;
use bc_core::{BlobSource, Error, ListPage, ObjectDescriptor, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for a whole request, body included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest response body excerpt included in an error message
const ERROR_BODY_LIMIT: usize = 256;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobEntry {
    pathname: String,
    url: String,
    download_url: Option<String>,
    size: Option<u64>,
}

impl From<BlobEntry> for ObjectDescriptor {
    fn from(entry: BlobEntry) -> Self {
        let locator = entry.download_url.unwrap_or(entry.url);
        let descriptor = ObjectDescriptor::new(entry.pathname, locator);
        match entry.size {
            Some(size) => descriptor.with_size(size),
            None => descriptor,
        }
    }
}

/// Blob listing API client
pub struct BlobClient {
    http: Client,
    api_url: Url,
    token: String,
}

impl BlobClient {
    /// Create a client from the source configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(config: &SourceConfig, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)?;
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .user_agent(concat!("blobcopy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url,
            token: config.token.clone(),
        })
    }

    fn list_url(&self, cursor: Option<&str>, limit: usize, prefix: &str) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            query.append_pair("prefix", prefix);
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        url
    }
}

#[async_trait]
impl BlobSource for BlobClient {
    async fn list(&self, cursor: Option<String>, limit: usize, prefix: &str) -> Result<ListPage> {
        let url = self.list_url(cursor.as_deref(), limit, prefix);
        tracing::debug!(%url, "listing blobs");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Listing(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Listing(status_message(status, &body)));
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::Listing(format!("invalid listing response: {e}")))?;

        let next_cursor = match (body.has_more, body.cursor) {
            (true, Some(cursor)) => Some(cursor),
            (true, None) => {
                return Err(Error::Listing(
                    "listing reported more pages without a cursor".into(),
                ));
            }
            (false, _) => None,
        };

        Ok(ListPage {
            items: body.blobs.into_iter().map(ObjectDescriptor::from).collect(),
            next_cursor,
        })
    }

    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(locator)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{locator}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{locator}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("{locator}: {e}")))?;

        Ok(bytes.to_vec())
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    format!("HTTP {status}: {excerpt}")
}
