//! Nullable ledger: thread-safe in-memory submission ledger for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use sigrelay_store::{StoreError, SubmissionLedger, VoteFilter, DEFAULT_DELEGATION_WINDOW_SECS};
use sigrelay_types::{Address, RecordId, RecordKind, SubmissionRecord, Timestamp, B256, U256};

#[derive(Default)]
struct LedgerState {
    records: Vec<SubmissionRecord>,
    vote_index: HashMap<(Address, U256), RecordId>,
    pending: HashMap<Address, RecordId>,
    last_delegation: HashMap<Address, Timestamp>,
    failure: Option<StoreError>,
}

/// An in-memory [`SubmissionLedger`] with the same invariants as the LMDB
/// backend. One mutex makes check-and-insert atomic.
pub struct NullLedger {
    state: Mutex<LedgerState>,
    window_secs: u64,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_DELEGATION_WINDOW_SECS)
    }

    pub fn with_window(window_secs: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            window_secs,
        }
    }

    /// Make every subsequent call fail with `error`; `None` heals the ledger.
    pub fn fail_with(&self, error: Option<StoreError>) {
        self.state.lock().unwrap().failure = error;
    }

    /// Every stored record, in insertion order.
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.state.lock().unwrap().records.clone()
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    fn check_failure(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn check_delegation(&self, address: &Address, now: Timestamp, window: u64) -> Result<(), StoreError> {
        if self.pending.contains_key(address) {
            return Err(StoreError::PendingDelegation);
        }
        if let Some(last) = self.last_delegation.get(address) {
            if !last.has_expired(window, now) {
                return Err(StoreError::RateLimited {
                    retry_after_secs: last.secs_until_expiry(window, now),
                });
            }
        }
        Ok(())
    }

    fn push(&mut self, record: &SubmissionRecord) -> RecordId {
        let id = self.records.len() as RecordId + 1;
        self.records.push(record.clone().with_id(id));
        id
    }
}

impl SubmissionLedger for NullLedger {
    fn insert_delegation(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError> {
        if record.kind() != RecordKind::Delegate {
            return Err(StoreError::InvalidRecord("expected a delegation record".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;
        state.check_delegation(&record.from, record.created_at, self.window_secs)?;
        let id = state.push(record);
        if !record.executed {
            state.pending.insert(record.from, id);
        }
        state.last_delegation.insert(record.from, record.created_at);
        Ok(id)
    }

    fn insert_vote(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError> {
        let proposal_id = record
            .proposal_id()
            .ok_or_else(|| StoreError::InvalidRecord("expected a vote record".into()))?;
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;
        let key = (record.from, proposal_id);
        if state.vote_index.contains_key(&key) {
            return Err(StoreError::DuplicateSubmission);
        }
        let id = state.push(record);
        state.vote_index.insert(key, id);
        Ok(id)
    }

    fn delegation_allowed(&self, address: &Address, now: Timestamp) -> Result<(), StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        state.check_delegation(address, now, self.window_secs)
    }

    fn vote_allowed(&self, address: &Address, proposal_id: &U256) -> Result<(), StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        if state.vote_index.contains_key(&(*address, *proposal_id)) {
            return Err(StoreError::DuplicateSubmission);
        }
        Ok(())
    }

    fn mark_executed(&self, id: RecordId, tx_hash: &B256) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;
        let index = state
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
        let record = state.records[index].clone().executed_with(*tx_hash);
        if record.kind() == RecordKind::Delegate && state.pending.get(&record.from) == Some(&id) {
            state.pending.remove(&record.from);
        }
        state.records[index] = record;
        Ok(())
    }

    fn get(&self, id: RecordId) -> Result<SubmissionRecord, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        state
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))
    }

    fn list_pending(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        Ok(state.records.iter().filter(|r| !r.executed).cloned().collect())
    }

    fn list_votes(&self, filter: &VoteFilter) -> Result<Vec<SubmissionRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        Ok(state
            .records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_failure()?;
        Ok(state.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrelay_types::{DelegationIntent, SignatureParts, Support, VoteIntent};

    fn sig() -> SignatureParts {
        SignatureParts::new(27, B256::repeat_byte(1), B256::repeat_byte(2))
    }

    fn delegation(from: u8, at: u64) -> SubmissionRecord {
        let intent = DelegationIntent {
            delegator: Address::repeat_byte(from),
            delegatee: Address::repeat_byte(0xdd),
            nonce: U256::ZERO,
            expiry: 10_000_000_000,
            signature: sig(),
        };
        SubmissionRecord::new_delegation(&intent, sig(), Timestamp::new(at))
    }

    fn vote(from: u8, proposal: u64) -> SubmissionRecord {
        let intent = VoteIntent {
            voter: Address::repeat_byte(from),
            proposal_id: U256::from(proposal),
            support: Support::For,
            signature: sig(),
        };
        SubmissionRecord::new_vote(&intent, sig(), Timestamp::new(1))
    }

    #[test]
    fn pending_then_window() {
        let ledger = NullLedger::with_window(100);
        let id = ledger.insert_delegation(&delegation(1, 10)).unwrap();
        assert_eq!(
            ledger.insert_delegation(&delegation(1, 20)),
            Err(StoreError::PendingDelegation)
        );
        ledger.mark_executed(id, &B256::ZERO).unwrap();
        assert_eq!(
            ledger.delegation_allowed(&Address::repeat_byte(1), Timestamp::new(30)),
            Err(StoreError::RateLimited { retry_after_secs: 81 })
        );
        assert_eq!(
            ledger.insert_delegation(&delegation(1, 110)),
            Err(StoreError::RateLimited { retry_after_secs: 1 })
        );
        assert!(ledger.insert_delegation(&delegation(1, 111)).is_ok());
    }

    #[test]
    fn votes_are_unique_per_proposal() {
        let ledger = NullLedger::new();
        ledger.insert_vote(&vote(1, 5)).unwrap();
        assert_eq!(ledger.insert_vote(&vote(1, 5)), Err(StoreError::DuplicateSubmission));
        assert!(ledger.insert_vote(&vote(1, 6)).is_ok());
        let listed = ledger.list_votes(&VoteFilter::by_address(Address::repeat_byte(1))).unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn injected_failure_surfaces() {
        let ledger = NullLedger::new();
        ledger.fail_with(Some(StoreError::Backend("disk".into())));
        assert!(matches!(ledger.record_count(), Err(StoreError::Backend(_))));
    }
}
