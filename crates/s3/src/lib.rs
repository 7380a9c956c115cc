//! bc-s3: S3 destination adapter for blobcopy
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod classify;
pub mod client;

pub use classify::S3ErrorKind;
pub use client::S3Client;
