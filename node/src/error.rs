use sigrelay_crypto::SignatureError;
use sigrelay_governance::{ChainError, EligibilityError, GovernorError};
use sigrelay_relay::{NotifyError, RelayError};
use sigrelay_store::StoreError;
use sigrelay_types::{Address, ParseError, U256};
use sigrelay_utils::format_duration;
use thiserror::Error;

/// Startup and wiring failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("chain client error: {0}")]
    Chain(#[from] ChainError),

    #[error("relay client error: {0}")]
    Relay(#[from] RelayError),

    #[error("notifier error: {0}")]
    Notify(#[from] NotifyError),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a submitted or probed intent was refused.
///
/// Closed set; every variant maps to exactly one HTTP status.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("token balance too low ({balance} < {minimum})")]
    BalanceTooLow { balance: U256, minimum: U256 },

    #[error("insufficient voting power ({weight} < {minimum})")]
    InsufficientVotingPower { weight: U256, minimum: U256 },

    #[error("already delegated to {0}")]
    AlreadyDelegatedTo(Address),

    #[error("a delegation from this address is already pending")]
    PendingDelegation,

    #[error("only one delegation allowed per window, retry in {}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: u64 },

    #[error("proposer already has a live proposal ({0})")]
    ActiveProposalExists(U256),

    #[error("proposal is not accepting votes: {0}")]
    ProposalNotActive(String),

    #[error("address has already voted on this proposal")]
    AlreadyVoted,

    #[error("this vote was already submitted")]
    DuplicateSubmission,

    /// Detail is for logs only; see [`IntentError::public_message`].
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl IntentError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::InvalidSignature(_) => 422,
            Self::BalanceTooLow { .. }
            | Self::InsufficientVotingPower { .. }
            | Self::AlreadyDelegatedTo(_)
            | Self::PendingDelegation
            | Self::RateLimited { .. }
            | Self::ActiveProposalExists(_) => 403,
            Self::ProposalNotActive(_) | Self::AlreadyVoted => 400,
            Self::DuplicateSubmission => 409,
            Self::UpstreamUnavailable(_) => 500,
        }
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::BalanceTooLow { .. } => "balance_too_low",
            Self::InsufficientVotingPower { .. } => "insufficient_voting_power",
            Self::AlreadyDelegatedTo(_) => "already_delegated_to",
            Self::PendingDelegation => "pending_delegation",
            Self::RateLimited { .. } => "rate_limited",
            Self::ActiveProposalExists(_) => "active_proposal_exists",
            Self::ProposalNotActive(_) => "proposal_not_active",
            Self::AlreadyVoted => "already_voted",
            Self::DuplicateSubmission => "duplicate_submission",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Message safe to return to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::UpstreamUnavailable(_) => "upstream service unavailable, try again later".into(),
            other => other.to_string(),
        }
    }
}

fn retry_hint(secs: &u64) -> String {
    format_duration(*secs)
}

impl From<ParseError> for IntentError {
    fn from(e: ParseError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<SignatureError> for IntentError {
    fn from(e: SignatureError) -> Self {
        Self::InvalidSignature(e.to_string())
    }
}

impl From<GovernorError> for IntentError {
    fn from(e: GovernorError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<EligibilityError> for IntentError {
    fn from(e: EligibilityError) -> Self {
        match e {
            EligibilityError::BalanceTooLow { balance, minimum } => {
                Self::BalanceTooLow { balance, minimum }
            }
            EligibilityError::AlreadyDelegatedTo(a) => Self::AlreadyDelegatedTo(a),
            EligibilityError::RateLimited { retry_after_secs } => {
                Self::RateLimited { retry_after_secs }
            }
            EligibilityError::PendingDelegation => Self::PendingDelegation,
            EligibilityError::ProposalNotActive(r) => Self::ProposalNotActive(r),
            EligibilityError::InsufficientVotingPower { weight, minimum } => {
                Self::InsufficientVotingPower { weight, minimum }
            }
            EligibilityError::AlreadyVoted => Self::AlreadyVoted,
            EligibilityError::DuplicateSubmission => Self::DuplicateSubmission,
            EligibilityError::ActiveProposalExists(id) => Self::ActiveProposalExists(id),
            EligibilityError::UpstreamUnavailable(d) => Self::UpstreamUnavailable(d),
        }
    }
}

impl From<StoreError> for IntentError {
    fn from(e: StoreError) -> Self {
        EligibilityError::from(e).into()
    }
}
