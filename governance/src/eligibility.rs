//! Eligibility oracle: may this address delegate, vote or propose right now?
//!
//! Every answer is computed from fresh reads. Independent reads are joined
//! concurrently, each bounded by `upstream_timeout`, and the verdicts are
//! then evaluated in a fixed order so the first failing rule wins.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use sigrelay_store::SubmissionLedger;
use sigrelay_types::Clock;
use tracing::debug;

use crate::upstream::{bounded, ledger_call};
use crate::{ChainError, ChainState, EligibilityError, EligibilityParams, ProposalInfo};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationSnapshot {
    pub balance: U256,
    pub current_delegatee: Address,
}

/// Where a vote weight was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightSource {
    /// Checkpointed votes at the proposal snapshot block.
    Snapshot,
    /// Live votes; the snapshot block has not been passed yet.
    Live,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteSnapshot {
    pub current_block: u64,
    pub proposal: ProposalInfo,
    pub has_voted: bool,
    pub weight: U256,
    pub weight_source: WeightSource,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposerSnapshot {
    pub votes: U256,
    pub threshold: U256,
}

pub struct EligibilityOracle {
    chain: Arc<dyn ChainState>,
    ledger: Arc<dyn SubmissionLedger>,
    clock: Arc<dyn Clock>,
    params: EligibilityParams,
}

impl EligibilityOracle {
    pub fn new(
        chain: Arc<dyn ChainState>,
        ledger: Arc<dyn SubmissionLedger>,
        clock: Arc<dyn Clock>,
        params: EligibilityParams,
    ) -> Self {
        Self {
            chain,
            ledger,
            clock,
            params,
        }
    }

    pub fn params(&self) -> &EligibilityParams {
        &self.params
    }

    pub fn chain(&self) -> &Arc<dyn ChainState> {
        &self.chain
    }

    /// Balance, then requested delegatee, then the ledger.
    pub async fn can_delegate(
        &self,
        address: Address,
        delegatee: Option<Address>,
    ) -> Result<DelegationSnapshot, EligibilityError> {
        let now = self.clock.now();
        let timeout = self.params.upstream_timeout;
        let (balance, current, verdict) = tokio::join!(
            bounded(timeout, self.chain.balance_of(address)),
            bounded(timeout, self.chain.delegates(address)),
            ledger_call(&self.ledger, timeout, move |ledger| {
                ledger.delegation_allowed(&address, now)
            }),
        );

        let balance = balance?;
        if balance < self.params.min_delegation_balance {
            debug!(%address, %balance, "delegation rejected: balance too low");
            return Err(EligibilityError::BalanceTooLow {
                balance,
                minimum: self.params.min_delegation_balance,
            });
        }

        let current_delegatee = current?;
        if delegatee == Some(current_delegatee) {
            debug!(%address, delegatee = %current_delegatee, "delegation rejected: unchanged delegatee");
            return Err(EligibilityError::AlreadyDelegatedTo(current_delegatee));
        }

        verdict?;
        Ok(DelegationSnapshot {
            balance,
            current_delegatee,
        })
    }

    /// Proposal open, then weight, then on-chain receipt, then the ledger.
    pub async fn can_vote(
        &self,
        address: Address,
        proposal_id: U256,
    ) -> Result<VoteSnapshot, EligibilityError> {
        let timeout = self.params.upstream_timeout;
        let (block, proposal, receipt, verdict) = tokio::join!(
            bounded(timeout, self.chain.block_number()),
            bounded(timeout, self.chain.proposal(proposal_id)),
            bounded(timeout, self.chain.has_voted(proposal_id, address)),
            ledger_call(&self.ledger, timeout, move |ledger| {
                ledger.vote_allowed(&address, &proposal_id)
            }),
        );

        let current_block = block?;
        let proposal = proposal.map_err(|e| match e {
            ChainError::Reverted(reason) => EligibilityError::ProposalNotActive(reason),
            other => other.into(),
        })?;
        if !self.params.proposal_open(&proposal, current_block) {
            debug!(%address, %proposal_id, state = proposal.state.as_str(), current_block, "vote rejected: proposal closed");
            return Err(EligibilityError::ProposalNotActive(format!(
                "{} at block {current_block}, voting ends at {}",
                proposal.state.as_str(),
                proposal.end_block
            )));
        }

        let (weight, weight_source) = if current_block > proposal.snapshot_block {
            let weight = bounded(
                timeout,
                self.chain.prior_votes(address, proposal.snapshot_block),
            )
            .await?;
            (weight, WeightSource::Snapshot)
        } else {
            let weight = bounded(timeout, self.chain.current_votes(address)).await?;
            (weight, WeightSource::Live)
        };
        if weight < self.params.min_vote_weight {
            debug!(%address, %weight, "vote rejected: insufficient voting power");
            return Err(EligibilityError::InsufficientVotingPower {
                weight,
                minimum: self.params.min_vote_weight,
            });
        }

        if receipt? {
            return Err(EligibilityError::AlreadyVoted);
        }

        verdict?;
        Ok(VoteSnapshot {
            current_block,
            proposal,
            has_voted: false,
            weight,
            weight_source,
        })
    }

    /// Ledger and on-chain receipt only: has this address already voted, or
    /// already submitted a vote, on this proposal? A ledger duplicate wins
    /// over an on-chain receipt.
    pub async fn check_first_vote(
        &self,
        address: Address,
        proposal_id: U256,
    ) -> Result<(), EligibilityError> {
        let timeout = self.params.upstream_timeout;
        let (verdict, receipt) = tokio::join!(
            ledger_call(&self.ledger, timeout, move |ledger| {
                ledger.vote_allowed(&address, &proposal_id)
            }),
            bounded(timeout, self.chain.has_voted(proposal_id, address)),
        );
        verdict?;
        if receipt? {
            return Err(EligibilityError::AlreadyVoted);
        }
        Ok(())
    }

    /// Votes at the previous block must exceed the threshold, and the
    /// proposer's latest proposal must no longer be live.
    pub async fn can_propose(&self, address: Address) -> Result<ProposerSnapshot, EligibilityError> {
        let timeout = self.params.upstream_timeout;
        let (block, threshold, latest) = tokio::join!(
            bounded(timeout, self.chain.block_number()),
            bounded(timeout, self.chain.proposal_threshold()),
            bounded(timeout, self.chain.latest_proposal_id(address)),
        );

        let block = block?;
        let votes = bounded(timeout, self.chain.prior_votes(address, block.saturating_sub(1))).await?;
        let threshold = threshold?;
        if votes <= threshold {
            return Err(EligibilityError::InsufficientVotingPower {
                weight: votes,
                minimum: threshold.saturating_add(U256::from(1u64)),
            });
        }

        if let Some(latest_id) = latest? {
            match bounded(timeout, self.chain.proposal(latest_id)).await {
                Ok(p) if p.state.accepts_votes() => {
                    return Err(EligibilityError::ActiveProposalExists(latest_id));
                }
                Ok(_) | Err(ChainError::Reverted(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }

        Ok(ProposerSnapshot { votes, threshold })
    }

    pub async fn current_votes(&self, address: Address) -> Result<U256, EligibilityError> {
        Ok(bounded(self.params.upstream_timeout, self.chain.current_votes(address)).await?)
    }

    pub async fn delegation_nonce(&self, address: Address) -> Result<U256, EligibilityError> {
        Ok(bounded(self.params.upstream_timeout, self.chain.delegation_nonce(address)).await?)
    }

    pub async fn vote_nonce(&self, voter: Address) -> Result<U256, EligibilityError> {
        Ok(bounded(self.params.upstream_timeout, self.chain.vote_nonce(voter)).await?)
    }
}
