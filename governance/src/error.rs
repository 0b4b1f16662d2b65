use alloy_primitives::{Address, U256};
use sigrelay_store::StoreError;
use sigrelay_types::GovernorKind;
use thiserror::Error;

/// Failure reading contract state over JSON-RPC.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The call executed and reverted, e.g. an unknown proposal id.
    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("cannot decode call result: {0}")]
    Decode(String),

    #[error("chain read timed out")]
    Timeout,
}

/// Why an address may not delegate, vote or propose right now.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EligibilityError {
    #[error("token balance too low: {balance} < {minimum}")]
    BalanceTooLow { balance: U256, minimum: U256 },

    #[error("already delegated to {0}")]
    AlreadyDelegatedTo(Address),

    #[error("only one delegation allowed per window, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("a delegation from this address is still pending")]
    PendingDelegation,

    #[error("proposal is not accepting votes: {0}")]
    ProposalNotActive(String),

    #[error("insufficient voting power: {weight} < {minimum}")]
    InsufficientVotingPower { weight: U256, minimum: U256 },

    #[error("address has already voted on this proposal")]
    AlreadyVoted,

    #[error("a vote for this proposal was already submitted")]
    DuplicateSubmission,

    #[error("proposer already has a live proposal ({0})")]
    ActiveProposalExists(U256),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl From<ChainError> for EligibilityError {
    fn from(e: ChainError) -> Self {
        Self::UpstreamUnavailable(e.to_string())
    }
}

impl From<StoreError> for EligibilityError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PendingDelegation => Self::PendingDelegation,
            StoreError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            StoreError::DuplicateSubmission => Self::DuplicateSubmission,
            other => Self::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// A record or intent that the configured governor cannot express.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GovernorError {
    #[error("{0} governor ballots cannot abstain")]
    AbstainUnsupported(GovernorKind),

    #[error("record {0} is not a vote")]
    NotAVote(u64),

    #[error("record {0} is not a delegation")]
    NotADelegation(u64),
}
