//! Token and governor contract descriptors.
//!
//! A [`Governor`] is selected by [`GovernorKind`] and owns everything that
//! differs between generations on the write side: the ballot schema, the
//! signing domain and the `castVoteBySig` calldata shape.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use sigrelay_crypto::{TypedDomain, TypedMessage, TypedPayload};
use sigrelay_types::{
    DelegationIntent, EncodedCall, GovernorKind, RecordPayload, SubmissionRecord, Support,
    VoteIntent,
};

use crate::abi::{CompToken, GovernorAlpha, GovernorBravo, GovernorCharlie};
use crate::GovernorError;

/// Domain version used by versioned governors when none is configured.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// The governance token: signs delegations, receives `delegateBySig`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenContract {
    pub address: Address,
    pub domain: TypedDomain,
}

impl TokenContract {
    pub fn new(name: impl Into<String>, chain_id: u64, address: Address) -> Self {
        Self {
            address,
            domain: TypedDomain::new(name, chain_id, address),
        }
    }

    pub fn delegation_payload(&self, intent: &DelegationIntent) -> TypedPayload {
        TypedPayload::new(
            self.domain.clone(),
            TypedMessage::Delegation {
                delegatee: intent.delegatee,
                nonce: intent.nonce,
                expiry: intent.expiry,
            },
        )
    }

    pub fn delegate_call(&self, record: &SubmissionRecord) -> Result<EncodedCall, GovernorError> {
        let RecordPayload::Delegate {
            delegatee,
            nonce,
            expiry,
        } = record.payload
        else {
            return Err(GovernorError::NotADelegation(record.id));
        };
        let call = CompToken::delegateBySigCall {
            delegatee,
            nonce,
            expiry: U256::from(expiry),
            v: record.signature.v,
            r: record.signature.r,
            s: record.signature.s,
        };
        Ok(EncodedCall::new(self.address, call.abi_encode()))
    }
}

/// The governor contract votes are cast on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Governor {
    pub kind: GovernorKind,
    pub address: Address,
    pub domain: TypedDomain,
}

impl Governor {
    /// `version` only applies to generations with a versioned domain; alpha
    /// and bravo sign over `EIP712Domain(name,chainId,verifyingContract)`.
    pub fn new(
        kind: GovernorKind,
        name: impl Into<String>,
        version: Option<String>,
        chain_id: u64,
        address: Address,
    ) -> Self {
        let domain = TypedDomain::new(name, chain_id, address);
        let domain = match kind {
            GovernorKind::Charlie => {
                domain.with_version(version.unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()))
            }
            GovernorKind::Alpha | GovernorKind::Bravo => domain,
        };
        Self {
            kind,
            address,
            domain,
        }
    }

    pub fn check_support(&self, support: Support) -> Result<(), GovernorError> {
        if support == Support::Abstain && !self.kind.supports_abstain() {
            return Err(GovernorError::AbstainUnsupported(self.kind));
        }
        Ok(())
    }

    /// The ballot `voter` signs. `nonce` is ignored by generations without
    /// vote nonces.
    pub fn ballot(
        &self,
        proposal_id: U256,
        support: Support,
        voter: Address,
        nonce: U256,
    ) -> Result<TypedMessage, GovernorError> {
        self.check_support(support)?;
        let message = match self.kind {
            GovernorKind::Alpha => TypedMessage::BallotBool {
                proposal_id,
                support: support == Support::For,
            },
            GovernorKind::Bravo => TypedMessage::BallotUint8 {
                proposal_id,
                support: support.as_u8(),
            },
            GovernorKind::Charlie => TypedMessage::BallotExtended {
                proposal_id,
                support: support.as_u8(),
                voter,
                nonce,
            },
        };
        Ok(message)
    }

    pub fn ballot_payload(
        &self,
        intent: &VoteIntent,
        nonce: U256,
    ) -> Result<TypedPayload, GovernorError> {
        let message = self.ballot(intent.proposal_id, intent.support, intent.voter, nonce)?;
        Ok(TypedPayload::new(self.domain.clone(), message))
    }

    pub fn vote_call(&self, record: &SubmissionRecord) -> Result<EncodedCall, GovernorError> {
        let RecordPayload::Vote {
            proposal_id,
            support,
        } = record.payload
        else {
            return Err(GovernorError::NotAVote(record.id));
        };
        self.check_support(support)?;
        let sig = record.signature;
        let data = match self.kind {
            GovernorKind::Alpha => GovernorAlpha::castVoteBySigCall {
                proposalId: proposal_id,
                support: support == Support::For,
                v: sig.v,
                r: sig.r,
                s: sig.s,
            }
            .abi_encode(),
            GovernorKind::Bravo => GovernorBravo::castVoteBySigCall {
                proposalId: proposal_id,
                support: support.as_u8(),
                v: sig.v,
                r: sig.r,
                s: sig.s,
            }
            .abi_encode(),
            GovernorKind::Charlie => GovernorCharlie::castVoteBySigCall {
                proposalId: proposal_id,
                support: support.as_u8(),
                voter: record.from,
                signature: Bytes::copy_from_slice(&sig.to_bytes()),
            }
            .abi_encode(),
        };
        Ok(EncodedCall::new(self.address, data))
    }
}

/// Token plus governor: enough to turn any record into its relay call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contracts {
    pub token: TokenContract,
    pub governor: Governor,
}

impl Contracts {
    pub fn new(token: TokenContract, governor: Governor) -> Self {
        Self { token, governor }
    }

    pub fn relay_call(&self, record: &SubmissionRecord) -> Result<EncodedCall, GovernorError> {
        match record.payload {
            RecordPayload::Vote { .. } => self.governor.vote_call(record),
            RecordPayload::Delegate { .. } => self.token.delegate_call(record),
        }
    }
}
