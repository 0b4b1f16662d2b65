//! Nullable relay service and notifier: record calls instead of sending them.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sigrelay_relay::{NotifyError, Notifier, RelayDispatcher, RelayError};
use sigrelay_types::{EncodedCall, B256};

/// A relay that records every call and answers with a scripted result.
pub struct NullRelay {
    calls: Mutex<Vec<EncodedCall>>,
    outcome: Mutex<Result<B256, RelayError>>,
}

impl NullRelay {
    /// Succeeds with `tx_hash` for every call.
    pub fn succeeding(tx_hash: B256) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Mutex::new(Ok(tx_hash)),
        }
    }

    /// Fails with `error` for every call.
    pub fn failing(error: RelayError) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Mutex::new(Err(error)),
        }
    }

    pub fn set_outcome(&self, outcome: Result<B256, RelayError>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Calls received so far (for assertions).
    pub fn calls(&self) -> Vec<EncodedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayDispatcher for NullRelay {
    async fn relay(&self, call: &EncodedCall) -> Result<B256, RelayError> {
        self.calls.lock().unwrap().push(call.clone());
        self.outcome.lock().unwrap().clone()
    }
}

/// A notifier that records messages, optionally slow or failing after
/// recording.
#[derive(Default)]
pub struct NullNotifier {
    messages: Mutex<Vec<String>>,
    failing: Mutex<bool>,
    latency: Mutex<Option<Duration>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Delay every notification by `latency` before recording it.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.messages.lock().unwrap().push(message.to_string());
        if *self.failing.lock().unwrap() {
            return Err(NotifyError::Status(500));
        }
        Ok(())
    }
}
