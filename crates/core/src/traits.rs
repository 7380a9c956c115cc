//! Storage trait definitions
//!
//! `BlobSource` is the remote listing API objects are copied from and
//! `ObjectStore` is the S3-compatible bucket they are copied into. Both are
//! kept free of any SDK types so the transfer loop can be tested in isolation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One object enumerated by the source listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object path, used verbatim as the destination key
    pub key: String,

    /// URL the object's bytes are fetched from
    pub source_locator: String,

    /// Size reported by the listing, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, source_locator: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source_locator: source_locator.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// One page of a source listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPage {
    /// Listed objects
    pub items: Vec<ObjectDescriptor>,

    /// Cursor for the following page; `None` once the listing is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Remote blob store objects are read from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// List up to `limit` objects under `prefix`, starting at `cursor`
    ///
    /// Errors are fatal to the run and should be reported as `Error::Listing`.
    async fn list(&self, cursor: Option<String>, limit: usize, prefix: &str) -> Result<ListPage>;

    /// Fetch the full content behind a source locator
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>>;
}

/// Destination bucket objects are written to
///
/// Implementations classify their failures: a missing key is `Ok(false)` from
/// `exists`, a missing bucket is `Error::MissingBucket`, rejected credentials
/// are `Error::AccessDenied`, and everything else is `Error::Transient`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Verify the destination bucket is reachable with the configured credentials
    async fn check_bucket(&self) -> Result<()>;

    /// Check whether an object exists under `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Write raw bytes under `key`
    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = ObjectDescriptor::new("production/a.png", "https://cdn/a.png").with_size(42);
        assert_eq!(desc.key, "production/a.png");
        assert_eq!(desc.source_locator, "https://cdn/a.png");
        assert_eq!(desc.size, Some(42));
    }

    #[test]
    fn test_list_page_default_is_terminal() {
        let page = ListPage::default();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
