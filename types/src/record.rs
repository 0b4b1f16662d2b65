//! Persisted submissions.
//!
//! A [`SubmissionRecord`] is written once when an intent is accepted and is
//! only ever mutated to flip `executed` after the relay lands it on-chain.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::intent::{DelegationIntent, SignatureParts, Support, VoteIntent};
use crate::Timestamp;

/// Monotonic identifier assigned by the ledger.
pub type RecordId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Vote,
    Delegate,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vote => "vote",
            Self::Delegate => "delegate",
        }
    }
}

/// The signed content of a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPayload {
    Vote {
        proposal_id: U256,
        support: Support,
    },
    Delegate {
        delegatee: Address,
        nonce: U256,
        expiry: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Zero until the ledger assigns one on insert.
    pub id: RecordId,
    pub from: Address,
    pub payload: RecordPayload,
    /// Signature with `v` already normalised to 27/28.
    pub signature: SignatureParts,
    pub created_at: Timestamp,
    pub executed: bool,
    pub tx_hash: Option<B256>,
}

impl SubmissionRecord {
    pub fn new_vote(intent: &VoteIntent, signature: SignatureParts, created_at: Timestamp) -> Self {
        Self {
            id: 0,
            from: intent.voter,
            payload: RecordPayload::Vote {
                proposal_id: intent.proposal_id,
                support: intent.support,
            },
            signature,
            created_at,
            executed: false,
            tx_hash: None,
        }
    }

    pub fn new_delegation(
        intent: &DelegationIntent,
        signature: SignatureParts,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: 0,
            from: intent.delegator,
            payload: RecordPayload::Delegate {
                delegatee: intent.delegatee,
                nonce: intent.nonce,
                expiry: intent.expiry,
            },
            signature,
            created_at,
            executed: false,
            tx_hash: None,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self.payload {
            RecordPayload::Vote { .. } => RecordKind::Vote,
            RecordPayload::Delegate { .. } => RecordKind::Delegate,
        }
    }

    pub fn proposal_id(&self) -> Option<U256> {
        match self.payload {
            RecordPayload::Vote { proposal_id, .. } => Some(proposal_id),
            RecordPayload::Delegate { .. } => None,
        }
    }

    pub fn with_id(self, id: RecordId) -> Self {
        Self { id, ..self }
    }

    /// Mark as relayed.
    pub fn executed_with(self, tx_hash: B256) -> Self {
        Self {
            executed: true,
            tx_hash: Some(tx_hash),
            ..self
        }
    }
}
