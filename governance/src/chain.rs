//! Read-only view of token and governor state.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use sigrelay_types::ProposalState;

use crate::ChainError;

/// The parts of a proposal the oracle needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalInfo {
    pub id: U256,
    pub proposer: Address,
    pub state: ProposalState,
    /// Block whose checkpointed votes count for this proposal.
    pub snapshot_block: u64,
    pub end_block: u64,
}

/// Contract reads used by the eligibility oracle and the validator.
///
/// Implementations answer for one token and one governor; which ABI they use
/// is their concern. An unknown proposal id must surface as
/// [`ChainError::Reverted`].
#[async_trait]
pub trait ChainState: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn balance_of(&self, account: Address) -> Result<U256, ChainError>;

    /// Current on-chain delegatee of `account` (zero if none).
    async fn delegates(&self, account: Address) -> Result<Address, ChainError>;

    async fn current_votes(&self, account: Address) -> Result<U256, ChainError>;

    async fn prior_votes(&self, account: Address, block: u64) -> Result<U256, ChainError>;

    /// Token `nonces(account)`, consumed by `delegateBySig`.
    async fn delegation_nonce(&self, account: Address) -> Result<U256, ChainError>;

    async fn proposal(&self, proposal_id: U256) -> Result<ProposalInfo, ChainError>;

    async fn has_voted(&self, proposal_id: U256, voter: Address) -> Result<bool, ChainError>;

    /// Governor nonce bound into extended ballots. Zero for governors
    /// without one.
    async fn vote_nonce(&self, voter: Address) -> Result<U256, ChainError>;

    async fn proposal_threshold(&self) -> Result<U256, ChainError>;

    /// Latest proposal created by `proposer`, if the governor tracks it and
    /// one exists.
    async fn latest_proposal_id(&self, proposer: Address) -> Result<Option<U256>, ChainError>;
}
