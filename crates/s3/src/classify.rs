//! Failure classification for S3 responses
//!
//! Every SDK error is reduced to one of four kinds using the HTTP status and
//! the S3 error code, never the rendered message.

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use bc_core::Error;

/// Closed set of destination failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S3ErrorKind {
    /// The key (or, for bucket-level calls, the bucket) does not exist
    NotFound,
    /// Credentials were rejected or lack permission
    AccessDenied,
    /// The bucket itself does not exist
    MissingBucket,
    /// Anything else: throttling, server errors, timeouts, dispatch failures
    Transient,
}

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
];

impl S3ErrorKind {
    /// Classify from the raw HTTP status and S3 error code
    ///
    /// The error code wins when present; HEAD responses carry no body, so the
    /// status is the only signal there.
    pub fn from_parts(status: Option<u16>, code: Option<&str>) -> Self {
        match code {
            Some("NoSuchBucket") => return Self::MissingBucket,
            Some("NoSuchKey" | "NotFound") => return Self::NotFound,
            Some(code) if ACCESS_DENIED_CODES.contains(&code) => return Self::AccessDenied,
            _ => {}
        }

        match status {
            Some(404) => Self::NotFound,
            Some(401 | 403) => Self::AccessDenied,
            _ => Self::Transient,
        }
    }

    /// Classify an SDK error
    pub fn of<E>(err: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata,
    {
        let status = err.raw_response().map(|r| r.status().as_u16());
        let code = err.as_service_error().and_then(|e| e.code());
        Self::from_parts(status, code)
    }
}

/// Describe an SDK error including its source chain
pub(crate) fn describe<E>(err: &SdkError<E>) -> String
where
    E: std::error::Error + 'static,
{
    DisplayErrorContext(err).to_string()
}

/// Convert a failed write into a core error
///
/// A 404 on a write can only mean the bucket is gone.
pub(crate) fn write_error(kind: S3ErrorKind, bucket: &str, key: &str, detail: String) -> Error {
    match kind {
        S3ErrorKind::MissingBucket | S3ErrorKind::NotFound => Error::MissingBucket(bucket.to_string()),
        S3ErrorKind::AccessDenied => Error::AccessDenied(format!("{bucket}/{key}: {detail}")),
        S3ErrorKind::Transient => Error::Transient(format!("{key}: {detail}")),
    }
}

/// Convert a failed bucket-level call into a core error
pub(crate) fn bucket_error(kind: S3ErrorKind, bucket: &str, detail: String) -> Error {
    match kind {
        S3ErrorKind::MissingBucket | S3ErrorKind::NotFound => Error::MissingBucket(bucket.to_string()),
        S3ErrorKind::AccessDenied => Error::AccessDenied(format!("{bucket}: {detail}")),
        S3ErrorKind::Transient => Error::Transient(format!("{bucket}: {detail}")),
    }
}
