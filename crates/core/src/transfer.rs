//! Single-object transfer
//!
//! Copies one listed object into the destination unless a key with the same
//! name is already there. Per-item failures become a `Failed` result; only
//! errors that would hit every later transfer are returned as `Err`.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::traits::{BlobSource, ObjectDescriptor, ObjectStore};

/// What happened to one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferOutcome {
    Transferred,
    Skipped,
    Failed,
}

/// Result of transferring one object
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub key: String,
    pub outcome: TransferOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Bytes written to the destination
    pub bytes: u64,
}

impl TransferResult {
    pub fn transferred(key: impl Into<String>, bytes: u64) -> Self {
        Self {
            key: key.into(),
            outcome: TransferOutcome::Transferred,
            error: None,
            bytes,
        }
    }

    pub fn skipped(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            outcome: TransferOutcome::Skipped,
            error: None,
            bytes: 0,
        }
    }

    pub fn failed(key: impl Into<String>, error: &Error) -> Self {
        Self {
            key: key.into(),
            outcome: TransferOutcome::Failed,
            error: Some(error.to_string()),
            bytes: 0,
        }
    }
}

/// Copy one object from `source` to `dest`
///
/// With `dry_run` set, the existence check still runs but nothing is fetched
/// or written; objects that would be copied are reported as transferred with
/// zero bytes.
pub async fn transfer(
    source: &dyn BlobSource,
    dest: &dyn ObjectStore,
    descriptor: &ObjectDescriptor,
    dry_run: bool,
) -> Result<TransferResult> {
    let key = descriptor.key.as_str();

    match dest.exists(key).await {
        Ok(true) => return Ok(TransferResult::skipped(key)),
        Ok(false) => {}
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::warn!(key, "existence check failed: {e}");
            return Ok(TransferResult::failed(key, &e));
        }
    }

    if dry_run {
        return Ok(TransferResult::transferred(key, 0));
    }

    let data = match source.fetch(&descriptor.source_locator).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(key, "fetch failed: {e}");
            return Ok(TransferResult::failed(key, &e));
        }
    };
    let size = data.len() as u64;

    match dest.put_object(key, data).await {
        Ok(()) => {
            tracing::debug!(key, size, "transferred");
            Ok(TransferResult::transferred(key, size))
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(key, "write failed: {e}");
            Ok(TransferResult::failed(key, &e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockBlobSource, MockObjectStore};

    fn descriptor() -> ObjectDescriptor {
        ObjectDescriptor::new("production/img/cat.png", "https://blob.example/cat.png")
    }

    #[tokio::test]
    async fn test_existing_object_is_skipped_without_fetch() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists()
            .withf(|key| key == "production/img/cat.png")
            .times(1)
            .returning(|_| Ok(true));
        dest.expect_put_object().never();

        let mut source = MockBlobSource::new();
        source.expect_fetch().never();

        let result = transfer(&source, &dest, &descriptor(), false).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Skipped);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_missing_object_is_fetched_and_written() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists().returning(|_| Ok(false));
        dest.expect_put_object()
            .withf(|key, data| key == "production/img/cat.png" && data.as_slice() == b"meow")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut source = MockBlobSource::new();
        source
            .expect_fetch()
            .withf(|locator| locator == "https://blob.example/cat.png")
            .times(1)
            .returning(|_| Ok(b"meow".to_vec()));

        let result = transfer(&source, &dest, &descriptor(), false).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Transferred);
        assert_eq!(result.bytes, 4);
        assert_eq!(result.key, "production/img/cat.png");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_per_item() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists().returning(|_| Ok(false));
        dest.expect_put_object().never();

        let mut source = MockBlobSource::new();
        source
            .expect_fetch()
            .returning(|_| Err(Error::Fetch("HTTP 404 Not Found".into())));

        let result = transfer(&source, &dest, &descriptor(), false).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Failed);
        assert!(result.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_transient_write_failure_is_per_item() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists().returning(|_| Ok(false));
        dest.expect_put_object()
            .returning(|_, _| Err(Error::Transient("503 SlowDown".into())));

        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(|_| Ok(vec![1, 2, 3]));

        let result = transfer(&source, &dest, &descriptor(), false).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Failed);
        assert_eq!(result.bytes, 0);
    }

    #[tokio::test]
    async fn test_missing_bucket_on_write_is_fatal() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists().returning(|_| Ok(false));
        dest.expect_put_object()
            .returning(|_, _| Err(Error::MissingBucket("archive".into())));

        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(|_| Ok(vec![0u8; 16]));

        let err = transfer(&source, &dest, &descriptor(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingBucket(_)));
    }

    #[tokio::test]
    async fn test_access_denied_on_lookup_is_fatal() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists()
            .returning(|_| Err(Error::AccessDenied("InvalidAccessKeyId".into())));
        dest.expect_put_object().never();

        let mut source = MockBlobSource::new();
        source.expect_fetch().never();

        let err = transfer(&source, &dest, &descriptor(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_transient_lookup_failure_is_per_item() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists()
            .returning(|_| Err(Error::Transient("connection reset".into())));
        dest.expect_put_object().never();

        let mut source = MockBlobSource::new();
        source.expect_fetch().never();

        let result = transfer(&source, &dest, &descriptor(), false).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Failed);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_fetch_or_write() {
        let mut dest = MockObjectStore::new();
        dest.expect_exists().times(1).returning(|_| Ok(false));
        dest.expect_put_object().never();

        let mut source = MockBlobSource::new();
        source.expect_fetch().never();

        let result = transfer(&source, &dest, &descriptor(), true).await.unwrap();
        assert_eq!(result.outcome, TransferOutcome::Transferred);
        assert_eq!(result.bytes, 0);
    }
}
