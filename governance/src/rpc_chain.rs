//! [`ChainState`] over an ethers [`Provider`].

use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{TransactionRequest, H160};
use sigrelay_types::{GovernorKind, ProposalState};

use crate::abi::{CompToken, GovernorAlpha, GovernorBravo, GovernorCharlie, VotesToken};
use crate::{ChainError, ChainState, ProposalInfo};

/// JSON-RPC error code geth and most providers use for reverts with data.
const EXECUTION_REVERTED: i64 = 3;

/// Chain reader for one token and one governor.
pub struct RpcChain {
    provider: Provider<Http>,
    url: String,
    token: Address,
    governor: Address,
    kind: GovernorKind,
    timeout: Duration,
}

impl RpcChain {
    pub fn new(
        url: impl Into<String>,
        token: Address,
        governor: Address,
        kind: GovernorKind,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        let url = url.into();
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| ChainError::Transport(format!("invalid rpc url '{url}': {e}")))?;
        Ok(Self {
            provider,
            url,
            token,
            governor,
            kind,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every provider request is bounded by the configured timeout.
    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ChainError> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(ChainError::Timeout),
        }
    }

    async fn call<C>(&self, to: Address, call: C) -> Result<C::Return, ChainError>
    where
        C: SolCall + Send,
    {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(H160(to.0 .0))
            .data(call.abi_encode())
            .into();
        let output = self.bounded(self.provider.call(&tx, None)).await?;
        C::abi_decode_returns(output.as_ref(), true).map_err(|e| ChainError::Decode(e.to_string()))
    }

    fn state(&self, raw: u8) -> Result<ProposalState, ChainError> {
        self.kind
            .proposal_state(raw)
            .ok_or_else(|| ChainError::Decode(format!("unknown proposal state {raw}")))
    }
}

/// Map a provider failure onto [`ChainError`]. Error responses that the
/// node reports as reverts become [`ChainError::Reverted`].
fn classify(error: ProviderError) -> ChainError {
    match error {
        ProviderError::JsonRpcClientError(err) => {
            if let Some(response) = err.as_error_response() {
                if response.code == EXECUTION_REVERTED || response.is_revert() {
                    return ChainError::Reverted(response.message.clone());
                }
                return ChainError::Rpc {
                    code: response.code,
                    message: response.message.clone(),
                };
            }
            if let Some(serde) = err.as_serde_error() {
                return ChainError::Decode(serde.to_string());
            }
            ChainError::Transport(err.to_string())
        }
        ProviderError::SerdeJson(e) => ChainError::Decode(e.to_string()),
        ProviderError::HexError(e) => ChainError::Decode(e.to_string()),
        other => ChainError::Transport(other.to_string()),
    }
}

fn to_block(value: U256) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::Decode(format!("block {value} overflows u64")))
}

#[async_trait]
impl ChainState for RpcChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let block = self.bounded(self.provider.get_block_number()).await?;
        Ok(block.as_u64())
    }

    async fn balance_of(&self, account: Address) -> Result<U256, ChainError> {
        let ret = self
            .call(self.token, CompToken::balanceOfCall { account })
            .await?;
        Ok(ret.balance)
    }

    async fn delegates(&self, account: Address) -> Result<Address, ChainError> {
        let ret = self
            .call(self.token, CompToken::delegatesCall { delegator: account })
            .await?;
        Ok(ret.delegatee)
    }

    async fn current_votes(&self, account: Address) -> Result<U256, ChainError> {
        let votes = match self.kind {
            GovernorKind::Charlie => {
                self.call(self.token, VotesToken::getVotesCall { account })
                    .await?
                    .votes
            }
            GovernorKind::Alpha | GovernorKind::Bravo => {
                self.call(self.token, CompToken::getCurrentVotesCall { account })
                    .await?
                    .votes
            }
        };
        Ok(votes)
    }

    async fn prior_votes(&self, account: Address, block: u64) -> Result<U256, ChainError> {
        let block = U256::from(block);
        let votes = match self.kind {
            GovernorKind::Charlie => {
                self.call(
                    self.token,
                    VotesToken::getPastVotesCall {
                        account,
                        timepoint: block,
                    },
                )
                .await?
                .votes
            }
            GovernorKind::Alpha | GovernorKind::Bravo => {
                self.call(
                    self.token,
                    CompToken::getPriorVotesCall {
                        account,
                        blockNumber: block,
                    },
                )
                .await?
                .votes
            }
        };
        Ok(votes)
    }

    async fn delegation_nonce(&self, account: Address) -> Result<U256, ChainError> {
        let ret = self
            .call(self.token, CompToken::noncesCall { owner: account })
            .await?;
        Ok(ret.nonce)
    }

    async fn proposal(&self, proposal_id: U256) -> Result<ProposalInfo, ChainError> {
        let gov = self.governor;
        match self.kind {
            GovernorKind::Alpha => {
                let (p, s) = tokio::try_join!(
                    self.call(gov, GovernorAlpha::proposalsCall { proposalId: proposal_id }),
                    self.call(gov, GovernorAlpha::stateCall { proposalId: proposal_id }),
                )?;
                if p.id.is_zero() {
                    return Err(ChainError::Reverted(format!("unknown proposal {proposal_id}")));
                }
                Ok(ProposalInfo {
                    id: proposal_id,
                    proposer: p.proposer,
                    state: self.state(s.status)?,
                    snapshot_block: to_block(p.startBlock)?,
                    end_block: to_block(p.endBlock)?,
                })
            }
            GovernorKind::Bravo => {
                let (p, s) = tokio::try_join!(
                    self.call(gov, GovernorBravo::proposalsCall { proposalId: proposal_id }),
                    self.call(gov, GovernorBravo::stateCall { proposalId: proposal_id }),
                )?;
                if p.id.is_zero() {
                    return Err(ChainError::Reverted(format!("unknown proposal {proposal_id}")));
                }
                Ok(ProposalInfo {
                    id: proposal_id,
                    proposer: p.proposer,
                    state: self.state(s.status)?,
                    snapshot_block: to_block(p.startBlock)?,
                    end_block: to_block(p.endBlock)?,
                })
            }
            GovernorKind::Charlie => {
                let (s, snapshot, deadline, proposer) = tokio::try_join!(
                    self.call(gov, GovernorCharlie::stateCall { proposalId: proposal_id }),
                    self.call(gov, GovernorCharlie::proposalSnapshotCall { proposalId: proposal_id }),
                    self.call(gov, GovernorCharlie::proposalDeadlineCall { proposalId: proposal_id }),
                    self.call(gov, GovernorCharlie::proposalProposerCall { proposalId: proposal_id }),
                )?;
                Ok(ProposalInfo {
                    id: proposal_id,
                    proposer: proposer.proposer,
                    state: self.state(s.status)?,
                    snapshot_block: to_block(snapshot.timepoint)?,
                    end_block: to_block(deadline.timepoint)?,
                })
            }
        }
    }

    async fn has_voted(&self, proposal_id: U256, voter: Address) -> Result<bool, ChainError> {
        let gov = self.governor;
        let voted = match self.kind {
            GovernorKind::Alpha => {
                self.call(gov, GovernorAlpha::getReceiptCall { proposalId: proposal_id, voter })
                    .await?
                    .hasVoted
            }
            GovernorKind::Bravo => {
                self.call(gov, GovernorBravo::getReceiptCall { proposalId: proposal_id, voter })
                    .await?
                    .hasVoted
            }
            GovernorKind::Charlie => {
                self.call(
                    gov,
                    GovernorCharlie::hasVotedCall {
                        proposalId: proposal_id,
                        account: voter,
                    },
                )
                .await?
                .voted
            }
        };
        Ok(voted)
    }

    async fn vote_nonce(&self, voter: Address) -> Result<U256, ChainError> {
        if !self.kind.uses_vote_nonce() {
            return Ok(U256::ZERO);
        }
        let ret = self
            .call(self.governor, GovernorCharlie::noncesCall { owner: voter })
            .await?;
        Ok(ret.nonce)
    }

    async fn proposal_threshold(&self) -> Result<U256, ChainError> {
        let gov = self.governor;
        let threshold = match self.kind {
            GovernorKind::Alpha => self.call(gov, GovernorAlpha::proposalThresholdCall {}).await?.threshold,
            GovernorKind::Bravo => self.call(gov, GovernorBravo::proposalThresholdCall {}).await?.threshold,
            GovernorKind::Charlie => {
                self.call(gov, GovernorCharlie::proposalThresholdCall {}).await?.threshold
            }
        };
        Ok(threshold)
    }

    async fn latest_proposal_id(&self, proposer: Address) -> Result<Option<U256>, ChainError> {
        let gov = self.governor;
        let id = match self.kind {
            GovernorKind::Alpha => {
                self.call(gov, GovernorAlpha::latestProposalIdsCall { proposer })
                    .await?
                    .proposalId
            }
            GovernorKind::Bravo => {
                self.call(gov, GovernorBravo::latestProposalIdsCall { proposer })
                    .await?
                    .proposalId
            }
            GovernorKind::Charlie => return Ok(None),
        };
        Ok((!id.is_zero()).then_some(id))
    }
}
