//! Eligibility thresholds.

use std::time::Duration;

use alloy_primitives::U256;

use crate::ProposalInfo;

/// 10^18 base units, one whole 18-decimal token.
pub const ONE_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Blocks before `end_block` at which the relay stops taking votes, so a
/// relayed transaction still lands inside the voting period.
pub const DEFAULT_SAFETY_MARGIN_BLOCKS: u64 = 5;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibilityParams {
    pub min_delegation_balance: U256,
    pub min_vote_weight: U256,
    pub safety_margin_blocks: u64,
    /// Bound on every chain and ledger read.
    pub upstream_timeout: Duration,
}

impl Default for EligibilityParams {
    fn default() -> Self {
        Self {
            min_delegation_balance: ONE_TOKEN,
            min_vote_weight: ONE_TOKEN,
            safety_margin_blocks: DEFAULT_SAFETY_MARGIN_BLOCKS,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

impl EligibilityParams {
    /// `current_block < end_block - margin` and the state still accepts votes.
    pub fn proposal_open(&self, proposal: &ProposalInfo, current_block: u64) -> bool {
        proposal.state.accepts_votes()
            && current_block.saturating_add(self.safety_margin_blocks) < proposal.end_block
    }
}
