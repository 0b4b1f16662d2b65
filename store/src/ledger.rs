//! Submission ledger trait.

use sigrelay_types::{Address, RecordId, SubmissionRecord, Timestamp, B256, U256};

use crate::{StoreError, VoteFilter};

/// Seven days.
pub const DEFAULT_DELEGATION_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Append-only record of accepted intents.
///
/// Inserts re-check the uniqueness invariants atomically with the write, so
/// two concurrent submissions for the same key cannot both succeed:
///
/// - at most one unexecuted delegation per address
/// - at most one delegation per address within the rolling window
/// - at most one vote per (address, proposal), ever
pub trait SubmissionLedger: Send + Sync {
    /// Persist a delegation record and return its assigned id.
    fn insert_delegation(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError>;

    /// Persist a vote record and return its assigned id.
    fn insert_vote(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError>;

    /// Advisory check: would a delegation from `address` at `now` be accepted?
    fn delegation_allowed(&self, address: &Address, now: Timestamp) -> Result<(), StoreError>;

    /// Advisory check: has `address` not yet voted on `proposal_id`?
    fn vote_allowed(&self, address: &Address, proposal_id: &U256) -> Result<(), StoreError>;

    /// Flip `executed` once the relay has landed the transaction.
    fn mark_executed(&self, id: RecordId, tx_hash: &B256) -> Result<(), StoreError>;

    fn get(&self, id: RecordId) -> Result<SubmissionRecord, StoreError>;

    /// Unexecuted records, oldest first.
    fn list_pending(&self) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Vote records matching `filter`, newest first.
    fn list_votes(&self, filter: &VoteFilter) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Total number of records ever inserted.
    fn record_count(&self) -> Result<u64, StoreError>;
}
