//! Batch orchestrator
//!
//! Walks the source listing page by page, splits every page into batches of
//! at most `batch_size` objects and transfers each batch concurrently. A batch
//! always resolves completely before the next one starts, so no more than
//! `batch_size` transfers are ever in flight.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::Error;
use crate::traits::{BlobSource, ObjectDescriptor, ObjectStore};
use crate::transfer::{TransferOutcome, TransferResult, transfer};

/// Running counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub transferred: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes: u64,
}

impl RunTotals {
    /// Number of objects resolved so far, whatever their outcome
    pub fn processed(&self) -> u64 {
        self.transferred + self.skipped + self.failed
    }

    fn record(&mut self, result: &TransferResult) {
        match result.outcome {
            TransferOutcome::Transferred => self.transferred += 1,
            TransferOutcome::Skipped => self.skipped += 1,
            TransferOutcome::Failed => self.failed += 1,
        }
        self.bytes += result.bytes;
    }
}

/// A run that stopped on a fatal error
///
/// `totals` only covers objects resolved before the abort.
#[derive(Debug, thiserror::Error)]
#[error("run aborted after {} objects: {error}", .totals.processed())]
pub struct RunAborted {
    pub totals: RunTotals,
    #[source]
    pub error: Error,
}

/// Receives progress as the run advances
pub trait RunObserver: Send + Sync {
    /// Called once per resolved object, in completion order
    fn on_item(&self, _result: &TransferResult) {}

    /// Called after each batch with the cumulative totals
    fn on_batch(&self, _totals: &RunTotals) {}
}

/// Observer that ignores everything
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Drives listing and batched transfers for one run
pub struct Orchestrator {
    source: Arc<dyn BlobSource>,
    dest: Arc<dyn ObjectStore>,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn BlobSource>, dest: Arc<dyn ObjectStore>) -> Self {
        Self { source, dest }
    }

    /// Copy every object under the configured prefix
    pub async fn run(
        &self,
        config: &RunConfig,
        observer: &dyn RunObserver,
    ) -> Result<RunTotals, RunAborted> {
        let mut totals = RunTotals::default();

        if let Err(error) = self.dest.check_bucket().await {
            return Err(RunAborted { totals, error });
        }

        let prefix = config.key_prefix.as_str();
        let mut cursor: Option<String> = None;
        let mut pages = 0u64;

        loop {
            let page = match self
                .source
                .list(cursor.clone(), config.page_size.get(), prefix)
                .await
            {
                Ok(page) => page,
                Err(error) => {
                    return Err(RunAborted {
                        totals,
                        error: into_listing_error(error),
                    });
                }
            };
            pages += 1;

            let listed = page.items.len();
            let items: Vec<ObjectDescriptor> = page
                .items
                .into_iter()
                .filter(|item| {
                    let inside = item.key.starts_with(prefix);
                    if !inside {
                        tracing::warn!(key = %item.key, prefix, "dropping object outside prefix");
                    }
                    inside
                })
                .collect();
            tracing::debug!(page = pages, listed, kept = items.len(), "listed page");

            for batch in items.chunks(config.batch_size.get()) {
                let results = self.dispatch(batch, config.dry_run).await;

                let mut fatal = None;
                for (result, error) in results {
                    totals.record(&result);
                    observer.on_item(&result);
                    if let Some(error) = error {
                        fatal.get_or_insert(error);
                    }
                }
                observer.on_batch(&totals);

                if let Some(error) = fatal {
                    tracing::error!(processed = totals.processed(), "aborting run: {error}");
                    return Err(RunAborted { totals, error });
                }
            }

            match page.next_cursor {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    return Err(RunAborted {
                        totals,
                        error: Error::Listing(format!("cursor did not advance: {next}")),
                    });
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            pages,
            transferred = totals.transferred,
            skipped = totals.skipped,
            failed = totals.failed,
            "run complete"
        );
        Ok(totals)
    }

    /// Transfer one batch concurrently and collect results in completion order
    ///
    /// A fatal error is turned into a failed result for its object and handed
    /// back alongside it so the caller can stop after the batch.
    async fn dispatch(
        &self,
        batch: &[ObjectDescriptor],
        dry_run: bool,
    ) -> Vec<(TransferResult, Option<Error>)> {
        let source = self.source.as_ref();
        let dest = self.dest.as_ref();

        batch
            .iter()
            .map(|descriptor| async move {
                match transfer(source, dest, descriptor, dry_run).await {
                    Ok(result) => (result, None),
                    Err(error) => (TransferResult::failed(&descriptor.key, &error), Some(error)),
                }
            })
            .collect::<FuturesUnordered<_>>()
            .collect()
            .await
    }
}

fn into_listing_error(error: Error) -> Error {
    match error {
        Error::Listing(_) => error,
        other => Error::Listing(other.to_string()),
    }
}
