use std::sync::Arc;
use std::thread;

use sigrelay_store::{StoreError, SubmissionLedger, VoteFilter};
use sigrelay_store_lmdb::{LmdbEnvironment, LmdbSubmissionLedger};
use sigrelay_types::{
    Address, DelegationIntent, SignatureParts, SubmissionRecord, Support, Timestamp, VoteIntent,
    B256, U256,
};
use tempfile::TempDir;

const WINDOW: u64 = 7 * 24 * 60 * 60;

fn open() -> (TempDir, LmdbEnvironment, LmdbSubmissionLedger) {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
    let ledger = env.submission_ledger(WINDOW);
    (dir, env, ledger)
}

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

fn vote(from: u8, proposal: u64, at: u64) -> SubmissionRecord {
    let intent = VoteIntent {
        voter: Address::repeat_byte(from),
        proposal_id: U256::from(proposal),
        support: Support::For,
        signature: sig(),
    };
    SubmissionRecord::new_vote(&intent, sig(), Timestamp::new(at))
}

#[test]
fn ids_are_assigned_monotonically() {
    let (_dir, _env, ledger) = open();
    let a = ledger.insert_vote(&vote(1, 1, 10)).unwrap();
    let b = ledger.insert_delegation(&delegation(2, 11)).unwrap();
    let c = ledger.insert_vote(&vote(3, 1, 12)).unwrap();
    assert_eq!((a, b, c), (1, 2, 3));
    assert_eq!(ledger.get(b).unwrap().from, Address::repeat_byte(2));
    assert_eq!(ledger.record_count().unwrap(), 3);
}

#[test]
fn second_vote_on_same_proposal_is_a_duplicate() {
    let (_dir, _env, ledger) = open();
    ledger.insert_vote(&vote(1, 5, 10)).unwrap();
    assert_eq!(
        ledger.insert_vote(&vote(1, 5, 20)),
        Err(StoreError::DuplicateSubmission)
    );
    assert_eq!(
        ledger.vote_allowed(&Address::repeat_byte(1), &U256::from(5u64)),
        Err(StoreError::DuplicateSubmission)
    );
    // Other proposals and other voters are unaffected.
    assert!(ledger.insert_vote(&vote(1, 6, 20)).is_ok());
    assert!(ledger.insert_vote(&vote(2, 5, 20)).is_ok());
}

#[test]
fn executed_votes_still_block_duplicates() {
    let (_dir, _env, ledger) = open();
    let id = ledger.insert_vote(&vote(1, 5, 10)).unwrap();
    ledger.mark_executed(id, &B256::repeat_byte(9)).unwrap();
    assert_eq!(
        ledger.insert_vote(&vote(1, 5, 20)),
        Err(StoreError::DuplicateSubmission)
    );
}

#[test]
fn unexecuted_delegation_blocks_the_next_one() {
    let (_dir, _env, ledger) = open();
    ledger.insert_delegation(&delegation(1, 100)).unwrap();
    assert_eq!(
        ledger.insert_delegation(&delegation(1, 100 + WINDOW + 1)),
        Err(StoreError::PendingDelegation)
    );
}

#[test]
fn executed_delegation_is_rate_limited_within_the_window() {
    let (_dir, _env, ledger) = open();
    let id = ledger.insert_delegation(&delegation(1, 1_000)).unwrap();
    ledger.mark_executed(id, &B256::repeat_byte(7)).unwrap();

    let addr = Address::repeat_byte(1);
    assert_eq!(
        ledger.delegation_allowed(&addr, Timestamp::new(1_000 + 60)),
        Err(StoreError::RateLimited {
            retry_after_secs: WINDOW - 60 + 1
        })
    );
    assert_eq!(
        ledger.delegation_allowed(&addr, Timestamp::new(1_000 + WINDOW)),
        Err(StoreError::RateLimited {
            retry_after_secs: 1
        })
    );
    assert!(ledger
        .delegation_allowed(&addr, Timestamp::new(1_000 + WINDOW + 1))
        .is_ok());
    assert!(ledger
        .insert_delegation(&delegation(1, 1_000 + WINDOW + 1))
        .is_ok());
}

#[test]
fn mark_executed_sets_hash_and_clears_pending() {
    let (_dir, _env, ledger) = open();
    let id = ledger.insert_delegation(&delegation(1, 100)).unwrap();
    assert_eq!(ledger.list_pending().unwrap().len(), 1);

    ledger.mark_executed(id, &B256::repeat_byte(0xab)).unwrap();
    let record = ledger.get(id).unwrap();
    assert!(record.executed);
    assert_eq!(record.tx_hash, Some(B256::repeat_byte(0xab)));
    assert!(ledger.list_pending().unwrap().is_empty());
}

#[test]
fn mark_executed_unknown_id_is_not_found() {
    let (_dir, _env, ledger) = open();
    assert!(matches!(
        ledger.mark_executed(42, &B256::ZERO),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn pending_is_oldest_first_and_votes_newest_first() {
    let (_dir, _env, ledger) = open();
    ledger.insert_vote(&vote(1, 9, 10)).unwrap();
    ledger.insert_vote(&vote(2, 9, 11)).unwrap();
    ledger.insert_vote(&vote(3, 8, 12)).unwrap();

    let pending: Vec<_> = ledger.list_pending().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(pending, vec![1, 2, 3]);

    let votes: Vec<_> = ledger
        .list_votes(&VoteFilter::by_proposal(U256::from(9u64)))
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(votes, vec![2, 1]);
}

#[test]
fn list_votes_by_address_and_executed() {
    let (_dir, _env, ledger) = open();
    let a = ledger.insert_vote(&vote(1, 1, 10)).unwrap();
    ledger.insert_vote(&vote(1, 2, 11)).unwrap();
    ledger.insert_vote(&vote(2, 1, 12)).unwrap();
    ledger.insert_delegation(&delegation(1, 13)).unwrap();
    ledger.mark_executed(a, &B256::repeat_byte(1)).unwrap();

    let mine = ledger
        .list_votes(&VoteFilter::by_address(Address::repeat_byte(1)))
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.proposal_id().is_some()));

    let executed = ledger
        .list_votes(&VoteFilter::by_address(Address::repeat_byte(1)).executed(true))
        .unwrap();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].id, a);

    let exact = ledger
        .list_votes(&VoteFilter {
            proposal_id: Some(U256::from(1u64)),
            address: Some(Address::repeat_byte(2)),
            executed: None,
        })
        .unwrap();
    assert_eq!(exact.len(), 1);
}

#[test]
fn wrong_record_kind_is_rejected() {
    let (_dir, _env, ledger) = open();
    assert!(matches!(
        ledger.insert_vote(&delegation(1, 1)),
        Err(StoreError::InvalidRecord(_))
    ));
    assert!(matches!(
        ledger.insert_delegation(&vote(1, 1, 1)),
        Err(StoreError::InvalidRecord(_))
    ));
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let ledger = env.submission_ledger(WINDOW);
        ledger.insert_vote(&vote(1, 1, 10)).unwrap();
        env.sync().unwrap();
    }
    let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
    let ledger = env.submission_ledger(WINDOW);
    assert_eq!(ledger.record_count().unwrap(), 1);
    assert_eq!(ledger.insert_vote(&vote(2, 1, 11)).unwrap(), 2);
}

#[test]
fn concurrent_votes_for_one_key_admit_exactly_one() {
    let (_dir, _env, ledger) = open();
    let ledger = Arc::new(ledger);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.insert_vote(&vote(1, 77, 100 + i)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == StoreError::DuplicateSubmission));
}

#[test]
fn concurrent_delegations_admit_exactly_one() {
    let (_dir, _env, ledger) = open();
    let ledger = Arc::new(ledger);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.insert_delegation(&delegation(4, 500)))
        })
        .collect();
    let ok = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(ok, 1);
}
