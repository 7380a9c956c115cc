//! bc-blob: Blob listing API adapter for blobcopy
//!
//! Implements the BlobSource trait from bc-core over the HTTP listing API
//! using reqwest.

pub mod client;

pub use client::BlobClient;
