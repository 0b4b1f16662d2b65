//! LMDB implementation of SubmissionLedger.
//!
//! Databases:
//! - `records`: `id (u64 BE)` → bincode record
//! - `vote_index`: `address ‖ proposal_id` → `id`
//! - `pending_delegations`: `address` → `id` of the unexecuted delegation
//! - `last_delegation`: `address` → `created_at (u64 BE)`
//! - `meta`: `next_id`, `schema_version`
//!
//! LMDB allows a single writer at a time, so re-checking the invariants
//! inside the insert's write transaction makes check-and-insert atomic.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};

use sigrelay_store::{StoreError, SubmissionLedger, VoteFilter};
use sigrelay_types::{Address, RecordId, RecordKind, SubmissionRecord, Timestamp, B256, U256};

use crate::codec::{decode_record, decode_u64, encode_record, id_key, vote_key};
use crate::LmdbError;

const NEXT_ID_KEY: &[u8] = b"next_id";

pub struct LmdbSubmissionLedger {
    pub(crate) env: Arc<Env>,
    pub(crate) records_db: Database<Bytes, Bytes>,
    pub(crate) vote_index_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) last_delegation_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) delegation_window_secs: u64,
}

impl LmdbSubmissionLedger {
    pub fn delegation_window_secs(&self) -> u64 {
        self.delegation_window_secs
    }

    fn check_delegation(
        &self,
        txn: &RoTxn,
        address: &Address,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        if self
            .pending_db
            .get(txn, address.as_slice())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::PendingDelegation);
        }
        let last = self
            .last_delegation_db
            .get(txn, address.as_slice())
            .map_err(LmdbError::from)?;
        if let Some(bytes) = last {
            let last = Timestamp::new(decode_u64(bytes, "last_delegation")?);
            if !last.has_expired(self.delegation_window_secs, now) {
                return Err(StoreError::RateLimited {
                    retry_after_secs: last.secs_until_expiry(self.delegation_window_secs, now),
                });
            }
        }
        Ok(())
    }

    fn check_vote(
        &self,
        txn: &RoTxn,
        address: &Address,
        proposal_id: &U256,
    ) -> Result<(), StoreError> {
        let existing = self
            .vote_index_db
            .get(txn, &vote_key(address, proposal_id))
            .map_err(LmdbError::from)?;
        match existing {
            Some(_) => Err(StoreError::DuplicateSubmission),
            None => Ok(()),
        }
    }

    fn allocate_id(&self, wtxn: &mut RwTxn) -> Result<RecordId, LmdbError> {
        let next = match self.meta_db.get(wtxn, NEXT_ID_KEY)? {
            Some(bytes) => decode_u64(bytes, "next_id")?,
            None => 1,
        };
        self.meta_db.put(wtxn, NEXT_ID_KEY, &(next + 1).to_be_bytes())?;
        Ok(next)
    }

    fn write_record(&self, wtxn: &mut RwTxn, record: &SubmissionRecord) -> Result<(), LmdbError> {
        let bytes = encode_record(record)?;
        self.records_db.put(wtxn, &id_key(record.id), &bytes)?;
        Ok(())
    }

    fn load(&self, txn: &RoTxn, id: RecordId) -> Result<SubmissionRecord, LmdbError> {
        let bytes = self
            .records_db
            .get(txn, &id_key(id))?
            .ok_or_else(|| LmdbError::NotFound(format!("record {id}")))?;
        decode_record(bytes)
    }
}

impl SubmissionLedger for LmdbSubmissionLedger {
    fn insert_delegation(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError> {
        if record.kind() != RecordKind::Delegate {
            return Err(StoreError::InvalidRecord(
                "expected a delegation record".to_string(),
            ));
        }
        let address = record.from;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.check_delegation(&wtxn, &address, record.created_at)?;

        let id = self.allocate_id(&mut wtxn)?;
        let stored = record.clone().with_id(id);
        self.write_record(&mut wtxn, &stored)?;
        if !stored.executed {
            self.pending_db
                .put(&mut wtxn, address.as_slice(), &id_key(id))
                .map_err(LmdbError::from)?;
        }
        self.last_delegation_db
            .put(
                &mut wtxn,
                address.as_slice(),
                &stored.created_at.as_secs().to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(id, from = %address, "delegation recorded");
        Ok(id)
    }

    fn insert_vote(&self, record: &SubmissionRecord) -> Result<RecordId, StoreError> {
        let proposal_id = record
            .proposal_id()
            .ok_or_else(|| StoreError::InvalidRecord("expected a vote record".to_string()))?;
        let address = record.from;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.check_vote(&wtxn, &address, &proposal_id)?;

        let id = self.allocate_id(&mut wtxn)?;
        let stored = record.clone().with_id(id);
        self.write_record(&mut wtxn, &stored)?;
        self.vote_index_db
            .put(&mut wtxn, &vote_key(&address, &proposal_id), &id_key(id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(id, from = %address, proposal = %proposal_id, "vote recorded");
        Ok(id)
    }

    fn delegation_allowed(&self, address: &Address, now: Timestamp) -> Result<(), StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.check_delegation(&rtxn, address, now)
    }

    fn vote_allowed(&self, address: &Address, proposal_id: &U256) -> Result<(), StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.check_vote(&rtxn, address, proposal_id)
    }

    fn mark_executed(&self, id: RecordId, tx_hash: &B256) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let record = self.load(&wtxn, id)?.executed_with(*tx_hash);
        self.write_record(&mut wtxn, &record)?;

        if record.kind() == RecordKind::Delegate {
            let pending = self
                .pending_db
                .get(&wtxn, record.from.as_slice())
                .map_err(LmdbError::from)?
                .map(|bytes| decode_u64(bytes, "pending_delegations"))
                .transpose()?;
            if pending == Some(id) {
                self.pending_db
                    .delete(&mut wtxn, record.from.as_slice())
                    .map_err(LmdbError::from)?;
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(id, tx_hash = %tx_hash, "record marked executed");
        Ok(())
    }

    fn get(&self, id: RecordId) -> Result<SubmissionRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load(&rtxn, id)?)
    }

    fn list_pending(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.records_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let record = decode_record(val)?;
            if !record.executed {
                results.push(record);
            }
        }
        Ok(results)
    }

    fn list_votes(&self, filter: &VoteFilter) -> Result<Vec<SubmissionRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();

        match (&filter.address, &filter.proposal_id) {
            (Some(address), Some(proposal_id)) => {
                let hit = self
                    .vote_index_db
                    .get(&rtxn, &vote_key(address, proposal_id))
                    .map_err(LmdbError::from)?;
                if let Some(bytes) = hit {
                    results.push(self.load(&rtxn, decode_u64(bytes, "vote_index")?)?);
                }
            }
            (Some(address), None) => {
                let iter = self
                    .vote_index_db
                    .prefix_iter(&rtxn, address.as_slice())
                    .map_err(LmdbError::from)?;
                for entry in iter {
                    let (_key, val) = entry.map_err(LmdbError::from)?;
                    results.push(self.load(&rtxn, decode_u64(val, "vote_index")?)?);
                }
            }
            _ => {
                let iter = self.records_db.rev_iter(&rtxn).map_err(LmdbError::from)?;
                for entry in iter {
                    let (_key, val) = entry.map_err(LmdbError::from)?;
                    results.push(decode_record(val)?);
                }
            }
        }

        results.retain(|r| filter.matches(r));
        results.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(results)
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.records_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
