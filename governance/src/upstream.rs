//! Bounded access to the chain and the ledger.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sigrelay_store::{StoreError, SubmissionLedger};

use crate::ChainError;

/// Run a chain read with a deadline.
pub async fn bounded<T, F>(timeout: Duration, read: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout),
    }
}

/// Run a ledger call on the blocking pool with a deadline.
///
/// A timeout or a panicked task is reported as [`StoreError::Backend`]. The
/// blocking call itself cannot be cancelled and finishes in the background.
pub async fn ledger_call<T, F>(
    ledger: &Arc<dyn SubmissionLedger>,
    timeout: Duration,
    call: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&dyn SubmissionLedger) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let ledger = Arc::clone(ledger);
    let task = tokio::task::spawn_blocking(move || call(ledger.as_ref()));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(StoreError::Backend(format!("ledger task failed: {e}"))),
        Err(_) => Err(StoreError::Backend("ledger call timed out".into())),
    }
}
