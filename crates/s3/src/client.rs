//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bc-core for a
//! single destination bucket.

use async_trait::async_trait;

use bc_core::config::DestinationConfig;
use bc_core::{ObjectStore, Result};

use crate::classify::{S3ErrorKind, bucket_error, describe, write_error};

/// S3 client bound to one destination bucket
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from the destination configuration
    pub async fn new(config: &DestinationConfig) -> Result<Self> {
        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None, // session token
            None, // expiry
            "blobcopy-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    /// Destination bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn check_bucket(&self) -> Result<()> {
        match self.inner.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => Err(bucket_error(S3ErrorKind::of(&e), &self.bucket, describe(&e))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let result = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match S3ErrorKind::of(&e) {
                S3ErrorKind::NotFound => Ok(false),
                S3ErrorKind::MissingBucket => Err(bc_core::Error::MissingBucket(self.bucket.clone())),
                S3ErrorKind::AccessDenied => Err(bc_core::Error::AccessDenied(format!(
                    "{}/{key}: {}",
                    self.bucket,
                    describe(&e)
                ))),
                S3ErrorKind::Transient => Err(bc_core::Error::Transient(format!(
                    "lookup of {key} failed: {}",
                    describe(&e)
                ))),
            },
        }
    }

    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| write_error(S3ErrorKind::of(&e), &self.bucket, key, describe(&e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> DestinationConfig {
        DestinationConfig {
            region: "us-east-1".into(),
            bucket: "archive".into(),
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            endpoint: Some("http://localhost:9000".into()),
            force_path_style: true,
        }
    }

    #[tokio::test]
    async fn test_client_bound_to_bucket() {
        let client = S3Client::new(&destination()).await.unwrap();
        assert_eq!(client.bucket(), "archive");
    }
}
