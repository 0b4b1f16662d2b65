use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay service unreachable: {0}")]
    Unreachable(String),

    #[error("relay service returned HTTP {0}")]
    Status(u16),

    #[error("relay service rejected the call: {0}")]
    Rejected(String),

    #[error("invalid relay response: {0}")]
    InvalidResponse(String),

    #[error("relay client setup failed: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(String),

    #[error("notification hook returned HTTP {0}")]
    Status(u16),

    #[error("notification client setup failed: {0}")]
    Client(String),
}
