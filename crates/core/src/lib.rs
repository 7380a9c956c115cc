//! bc-core: Core library for the blobcopy transfer tool
//!
//! This crate provides the core functionality for blobcopy, including:
//! - Configuration loading and resolution
//! - BlobSource and ObjectStore traits for the two ends of a copy
//! - The single-object transfer worker
//! - The batch orchestrator that drives a whole run
//!
//! This crate is designed to be independent of any specific SDK or HTTP
//! client, allowing the transfer loop to be tested against in-memory fakes.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod traits;
pub mod transfer;

pub use config::{ConfigManager, ConfigOverrides, FileConfig, RunConfig};
pub use error::{Error, Result};
pub use orchestrator::{NoopObserver, Orchestrator, RunAborted, RunObserver, RunTotals};
pub use traits::{BlobSource, ListPage, ObjectDescriptor, ObjectStore};
pub use transfer::{TransferOutcome, TransferResult, transfer};
