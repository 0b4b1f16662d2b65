//! Relay dispatcher boundary.

use std::time::Duration;

use serde::Deserialize;
use sigrelay_types::{EncodedCall, B256};

use crate::RelayError;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Submits an encoded contract call on-chain and returns the transaction hash.
#[async_trait::async_trait]
pub trait RelayDispatcher: Send + Sync {
    async fn relay(&self, call: &EncodedCall) -> Result<B256, RelayError>;
}

/// Client for an external relay service.
///
/// `POST {endpoint}` with `{"to": "0x..", "data": "0x.."}`, expecting
/// `{"txHash": "0x.."}` or `{"error": ".."}` back. No retries.
pub struct HttpRelayDispatcher {
    http_client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default)]
    tx_hash: Option<B256>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpRelayDispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RelayDispatcher for HttpRelayDispatcher {
    async fn relay(&self, call: &EncodedCall) -> Result<B256, RelayError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(call)
            .send()
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        let body: RelayResponse = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        match (body.tx_hash, body.error) {
            (Some(hash), _) => {
                tracing::debug!(to = %call.to, tx_hash = %hash, "call relayed");
                Ok(hash)
            }
            (None, Some(reason)) => Err(RelayError::Rejected(reason)),
            (None, None) => Err(RelayError::InvalidResponse(
                "response carries neither txHash nor error".to_string(),
            )),
        }
    }
}
