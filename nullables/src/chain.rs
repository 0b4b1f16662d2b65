//! Nullable chain: scripted token and governor state.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sigrelay_governance::{ChainError, ChainState, ProposalInfo};
use sigrelay_types::{Address, U256};

#[derive(Default)]
struct ChainFixture {
    block: u64,
    balances: HashMap<Address, U256>,
    delegates: HashMap<Address, Address>,
    current_votes: HashMap<Address, U256>,
    prior_votes: HashMap<Address, U256>,
    delegation_nonces: HashMap<Address, U256>,
    vote_nonces: HashMap<Address, U256>,
    proposals: HashMap<U256, ProposalInfo>,
    receipts: HashSet<(U256, Address)>,
    threshold: U256,
    latest: HashMap<Address, U256>,
    failure: Option<ChainError>,
    latency: Option<Duration>,
    prior_votes_queries: Vec<(Address, u64)>,
    current_votes_queries: Vec<Address>,
}

/// An in-memory [`ChainState`].
///
/// Unset values read as zero, unknown proposals revert. Prior votes are
/// keyed by account only; the queried blocks are recorded for assertions.
pub struct NullChain {
    state: Mutex<ChainFixture>,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainFixture::default()),
        }
    }

    pub fn set_block(&self, block: u64) {
        self.state.lock().unwrap().block = block;
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(account, balance);
    }

    pub fn set_delegate(&self, account: Address, delegatee: Address) {
        self.state.lock().unwrap().delegates.insert(account, delegatee);
    }

    pub fn set_current_votes(&self, account: Address, votes: U256) {
        self.state.lock().unwrap().current_votes.insert(account, votes);
    }

    pub fn set_prior_votes(&self, account: Address, votes: U256) {
        self.state.lock().unwrap().prior_votes.insert(account, votes);
    }

    pub fn set_delegation_nonce(&self, account: Address, nonce: U256) {
        self.state.lock().unwrap().delegation_nonces.insert(account, nonce);
    }

    pub fn set_vote_nonce(&self, voter: Address, nonce: U256) {
        self.state.lock().unwrap().vote_nonces.insert(voter, nonce);
    }

    pub fn add_proposal(&self, proposal: ProposalInfo) {
        self.state.lock().unwrap().proposals.insert(proposal.id, proposal);
    }

    /// Record an on-chain receipt for `voter`.
    pub fn mark_voted(&self, proposal_id: U256, voter: Address) {
        self.state.lock().unwrap().receipts.insert((proposal_id, voter));
    }

    pub fn set_proposal_threshold(&self, threshold: U256) {
        self.state.lock().unwrap().threshold = threshold;
    }

    pub fn set_latest_proposal(&self, proposer: Address, proposal_id: U256) {
        self.state.lock().unwrap().latest.insert(proposer, proposal_id);
    }

    /// Make every subsequent read fail with `error`; `None` heals the chain.
    pub fn fail_with(&self, error: Option<ChainError>) {
        self.state.lock().unwrap().failure = error;
    }

    /// Delay every read by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().unwrap().latency = latency;
    }

    /// Blocks passed to `prior_votes`, in call order.
    pub fn prior_votes_queries(&self) -> Vec<(Address, u64)> {
        self.state.lock().unwrap().prior_votes_queries.clone()
    }

    pub fn current_votes_queries(&self) -> Vec<Address> {
        self.state.lock().unwrap().current_votes_queries.clone()
    }

    async fn read<T>(&self, f: impl FnOnce(&mut ChainFixture) -> Result<T, ChainError>) -> Result<T, ChainError> {
        let latency = self.state.lock().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        f(&mut state)
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainState for NullChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.read(|s| Ok(s.block)).await
    }

    async fn balance_of(&self, account: Address) -> Result<U256, ChainError> {
        self.read(|s| Ok(s.balances.get(&account).copied().unwrap_or_default()))
            .await
    }

    async fn delegates(&self, account: Address) -> Result<Address, ChainError> {
        self.read(|s| Ok(s.delegates.get(&account).copied().unwrap_or_default()))
            .await
    }

    async fn current_votes(&self, account: Address) -> Result<U256, ChainError> {
        self.read(|s| {
            s.current_votes_queries.push(account);
            Ok(s.current_votes.get(&account).copied().unwrap_or_default())
        })
        .await
    }

    async fn prior_votes(&self, account: Address, block: u64) -> Result<U256, ChainError> {
        self.read(|s| {
            s.prior_votes_queries.push((account, block));
            Ok(s.prior_votes.get(&account).copied().unwrap_or_default())
        })
        .await
    }

    async fn delegation_nonce(&self, account: Address) -> Result<U256, ChainError> {
        self.read(|s| Ok(s.delegation_nonces.get(&account).copied().unwrap_or_default()))
            .await
    }

    async fn proposal(&self, proposal_id: U256) -> Result<ProposalInfo, ChainError> {
        self.read(|s| {
            s.proposals
                .get(&proposal_id)
                .cloned()
                .ok_or_else(|| ChainError::Reverted(format!("unknown proposal {proposal_id}")))
        })
        .await
    }

    async fn has_voted(&self, proposal_id: U256, voter: Address) -> Result<bool, ChainError> {
        self.read(|s| Ok(s.receipts.contains(&(proposal_id, voter)))).await
    }

    async fn vote_nonce(&self, voter: Address) -> Result<U256, ChainError> {
        self.read(|s| Ok(s.vote_nonces.get(&voter).copied().unwrap_or_default()))
            .await
    }

    async fn proposal_threshold(&self) -> Result<U256, ChainError> {
        self.read(|s| Ok(s.threshold)).await
    }

    async fn latest_proposal_id(&self, proposer: Address) -> Result<Option<U256>, ChainError> {
        self.read(|s| Ok(s.latest.get(&proposer).copied())).await
    }
}
