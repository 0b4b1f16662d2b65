//! On-disk encoding of submission records and index keys.
//!
//! Records are bincode-encoded [`StoredRecord`]s holding plain byte arrays,
//! so the layout does not depend on how upstream types choose to serialize.
//! Integer keys are big-endian so LMDB's lexicographic order is numeric order.

use serde::{Deserialize, Serialize};
use sigrelay_types::{
    Address, RecordId, RecordPayload, SignatureParts, SubmissionRecord, Support, Timestamp, B256,
    U256,
};

use crate::LmdbError;

#[derive(Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    id: u64,
    from: [u8; 20],
    payload: StoredPayload,
    v: u8,
    r: [u8; 32],
    s: [u8; 32],
    created_at: u64,
    executed: bool,
    tx_hash: Option<[u8; 32]>,
}

#[derive(Serialize, Deserialize)]
enum StoredPayload {
    Vote {
        proposal_id: [u8; 32],
        support: u8,
    },
    Delegate {
        delegatee: [u8; 20],
        nonce: [u8; 32],
        expiry: u64,
    },
}

impl From<&SubmissionRecord> for StoredRecord {
    fn from(record: &SubmissionRecord) -> Self {
        let payload = match &record.payload {
            RecordPayload::Vote {
                proposal_id,
                support,
            } => StoredPayload::Vote {
                proposal_id: proposal_id.to_be_bytes::<32>(),
                support: support.as_u8(),
            },
            RecordPayload::Delegate {
                delegatee,
                nonce,
                expiry,
            } => StoredPayload::Delegate {
                delegatee: delegatee.into_array(),
                nonce: nonce.to_be_bytes::<32>(),
                expiry: *expiry,
            },
        };
        Self {
            id: record.id,
            from: record.from.into_array(),
            payload,
            v: record.signature.v,
            r: record.signature.r.0,
            s: record.signature.s.0,
            created_at: record.created_at.as_secs(),
            executed: record.executed,
            tx_hash: record.tx_hash.map(|h| h.0),
        }
    }
}

impl TryFrom<StoredRecord> for SubmissionRecord {
    type Error = LmdbError;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let payload = match stored.payload {
            StoredPayload::Vote {
                proposal_id,
                support,
            } => RecordPayload::Vote {
                proposal_id: U256::from_be_bytes(proposal_id),
                support: Support::try_from(support)
                    .map_err(|e| LmdbError::Corruption(format!("record {}: {e}", stored.id)))?,
            },
            StoredPayload::Delegate {
                delegatee,
                nonce,
                expiry,
            } => RecordPayload::Delegate {
                delegatee: Address::from(delegatee),
                nonce: U256::from_be_bytes(nonce),
                expiry,
            },
        };
        Ok(Self {
            id: stored.id,
            from: Address::from(stored.from),
            payload,
            signature: SignatureParts::new(stored.v, B256::from(stored.r), B256::from(stored.s)),
            created_at: Timestamp::new(stored.created_at),
            executed: stored.executed,
            tx_hash: stored.tx_hash.map(B256::from),
        })
    }
}

pub(crate) fn encode_record(record: &SubmissionRecord) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(&StoredRecord::from(record))?)
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<SubmissionRecord, LmdbError> {
    let stored: StoredRecord = bincode::deserialize(bytes)?;
    SubmissionRecord::try_from(stored)
}

pub(crate) fn id_key(id: RecordId) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("{what} has {} bytes, expected 8", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// `address ‖ proposal_id` (20 + 32 bytes). Prefix scans by address work
/// because every address is 20 bytes.
pub(crate) fn vote_key(address: &Address, proposal_id: &U256) -> [u8; 52] {
    let mut key = [0u8; 52];
    key[..20].copy_from_slice(address.as_slice());
    key[20..].copy_from_slice(&proposal_id.to_be_bytes::<32>());
    key
}
