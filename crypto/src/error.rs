use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("recovery byte v={0} is not one of 0, 1, 27, 28")]
    InvalidV(u8),

    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("public key could not be recovered from signature")]
    Unrecoverable,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
