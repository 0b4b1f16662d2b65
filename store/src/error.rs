use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    /// The address already has an unexecuted delegation.
    #[error("a delegation from this address is awaiting relay")]
    PendingDelegation,

    /// The address delegated within the rolling window.
    #[error("delegation rate limit hit, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// A vote for this (address, proposal) already exists.
    #[error("duplicate submission")]
    DuplicateSubmission,

    /// The record handed to an insert does not fit that insert.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether this is an invariant violation rather than a storage fault.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PendingDelegation | Self::RateLimited { .. } | Self::DuplicateSubmission
        )
    }
}
