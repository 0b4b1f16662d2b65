use std::sync::Arc;
use std::time::Duration;

use sigrelay_governance::{
    ChainError, EligibilityError, EligibilityOracle, EligibilityParams, ProposalInfo, WeightSource,
    ONE_TOKEN,
};
use sigrelay_nullables::{NullChain, NullClock, NullLedger};
use sigrelay_store::{StoreError, SubmissionLedger};
use sigrelay_types::{
    Address, DelegationIntent, ProposalState, SignatureParts, SubmissionRecord, Support,
    Timestamp, VoteIntent, B256, U256,
};

const NOW: u64 = 1_700_000_000;
const WEEK: u64 = 7 * 24 * 60 * 60;

struct Fixture {
    chain: Arc<NullChain>,
    ledger: Arc<NullLedger>,
    clock: Arc<NullClock>,
    oracle: EligibilityOracle,
}

fn fixture_with(params: EligibilityParams) -> Fixture {
    let chain = Arc::new(NullChain::new());
    let ledger = Arc::new(NullLedger::new());
    let clock = Arc::new(NullClock::new(NOW));
    let oracle = EligibilityOracle::new(chain.clone(), ledger.clone(), clock.clone(), params);
    Fixture {
        chain,
        ledger,
        clock,
        oracle,
    }
}

fn fixture() -> Fixture {
    fixture_with(EligibilityParams::default())
}

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn tokens(n: u64) -> U256 {
    ONE_TOKEN * U256::from(n)
}

fn sig() -> SignatureParts {
    SignatureParts::new(27, B256::repeat_byte(1), B256::repeat_byte(2))
}

fn delegation_record(from: Address, at: u64) -> SubmissionRecord {
    let intent = DelegationIntent {
        delegator: from,
        delegatee: bob(),
        nonce: U256::ZERO,
        expiry: NOW + WEEK,
        signature: sig(),
    };
    SubmissionRecord::new_delegation(&intent, sig(), Timestamp::new(at))
}

fn proposal(id: u64, state: ProposalState, snapshot_block: u64, end_block: u64) -> ProposalInfo {
    ProposalInfo {
        id: U256::from(id),
        proposer: bob(),
        state,
        snapshot_block,
        end_block,
    }
}

// ── can_delegate ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delegation_at_exact_minimum_is_allowed() {
    let f = fixture();
    f.chain.set_balance(alice(), ONE_TOKEN);
    let snapshot = f.oracle.can_delegate(alice(), Some(bob())).await.unwrap();
    assert_eq!(snapshot.balance, ONE_TOKEN);
    assert_eq!(snapshot.current_delegatee, Address::ZERO);
}

#[tokio::test]
async fn delegation_below_minimum_is_rejected() {
    let f = fixture();
    f.chain.set_balance(alice(), ONE_TOKEN - U256::from(1u64));
    assert!(matches!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::BalanceTooLow { .. })
    ));
}

#[tokio::test]
async fn balance_is_checked_before_delegatee_and_ledger() {
    let f = fixture();
    f.chain.set_delegate(alice(), bob());
    f.ledger.insert_delegation(&delegation_record(alice(), NOW)).unwrap();
    assert!(matches!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::BalanceTooLow { .. })
    ));
}

#[tokio::test]
async fn delegating_to_current_delegatee_is_rejected() {
    let f = fixture();
    f.chain.set_balance(alice(), tokens(5));
    f.chain.set_delegate(alice(), bob());
    assert_eq!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::AlreadyDelegatedTo(bob()))
    );
    // without a requested delegatee only balance and ledger apply
    assert!(f.oracle.can_delegate(alice(), None).await.is_ok());
}

#[tokio::test]
async fn pending_delegation_blocks_the_next_one() {
    let f = fixture();
    f.chain.set_balance(alice(), tokens(5));
    f.ledger.insert_delegation(&delegation_record(alice(), NOW)).unwrap();
    assert_eq!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::PendingDelegation)
    );
}

#[tokio::test]
async fn executed_delegation_rate_limits_until_the_window_passes() {
    let f = fixture();
    f.chain.set_balance(alice(), tokens(5));
    let id = f
        .ledger
        .insert_delegation(&delegation_record(alice(), NOW))
        .unwrap();
    f.ledger.mark_executed(id, &B256::repeat_byte(7)).unwrap();

    f.clock.advance(60);
    assert_eq!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::RateLimited {
            retry_after_secs: WEEK - 60 + 1
        })
    );

    f.clock.set(NOW + WEEK);
    assert_eq!(
        f.oracle.can_delegate(alice(), Some(bob())).await,
        Err(EligibilityError::RateLimited {
            retry_after_secs: 1
        })
    );

    f.clock.set(NOW + WEEK + 1);
    assert!(f.oracle.can_delegate(alice(), Some(bob())).await.is_ok());
}

#[tokio::test]
async fn chain_failure_is_upstream_unavailable() {
    let f = fixture();
    f.chain.fail_with(Some(ChainError::Transport("connection refused".into())));
    assert!(matches!(
        f.oracle.can_delegate(alice(), None).await,
        Err(EligibilityError::UpstreamUnavailable(_))
    ));
}

#[tokio::test]
async fn ledger_failure_is_upstream_unavailable() {
    let f = fixture();
    f.chain.set_balance(alice(), tokens(5));
    f.ledger.fail_with(Some(StoreError::Backend("disk".into())));
    assert!(matches!(
        f.oracle.can_delegate(alice(), None).await,
        Err(EligibilityError::UpstreamUnavailable(_))
    ));
}

#[tokio::test]
async fn slow_chain_times_out() {
    let f = fixture_with(EligibilityParams {
        upstream_timeout: Duration::from_millis(20),
        ..Default::default()
    });
    f.chain.set_balance(alice(), tokens(5));
    f.chain.set_latency(Some(Duration::from_millis(500)));
    assert!(matches!(
        f.oracle.can_delegate(alice(), None).await,
        Err(EligibilityError::UpstreamUnavailable(_))
    ));
}

// ── can_vote ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_proposal_is_not_active() {
    let f = fixture();
    f.chain.set_block(100);
    assert!(matches!(
        f.oracle.can_vote(alice(), U256::from(99u64)).await,
        Err(EligibilityError::ProposalNotActive(_))
    ));
}

#[tokio::test]
async fn canceled_proposal_is_not_active() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.add_proposal(proposal(1, ProposalState::Canceled, 50, 1_000));
    f.chain.set_prior_votes(alice(), tokens(10));
    assert!(matches!(
        f.oracle.can_vote(alice(), U256::from(1u64)).await,
        Err(EligibilityError::ProposalNotActive(_))
    ));
}

#[tokio::test]
async fn safety_margin_closes_voting_early() {
    let f = fixture();
    f.chain.add_proposal(proposal(1, ProposalState::Active, 50, 200));
    f.chain.set_prior_votes(alice(), tokens(10));

    f.chain.set_block(194);
    assert!(f.oracle.can_vote(alice(), U256::from(1u64)).await.is_ok());

    f.chain.set_block(195);
    assert!(matches!(
        f.oracle.can_vote(alice(), U256::from(1u64)).await,
        Err(EligibilityError::ProposalNotActive(_))
    ));
}

#[tokio::test]
async fn weight_comes_from_snapshot_once_it_has_passed() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.add_proposal(proposal(1, ProposalState::Active, 50, 1_000));
    f.chain.set_prior_votes(alice(), tokens(3));
    f.chain.set_current_votes(alice(), tokens(100));

    let snapshot = f.oracle.can_vote(alice(), U256::from(1u64)).await.unwrap();
    assert_eq!(snapshot.weight, tokens(3));
    assert_eq!(snapshot.weight_source, WeightSource::Snapshot);
    assert_eq!(f.chain.prior_votes_queries(), vec![(alice(), 50)]);
}

#[tokio::test]
async fn weight_is_live_while_snapshot_is_not_yet_passed() {
    let f = fixture();
    f.chain.set_block(50);
    f.chain.add_proposal(proposal(1, ProposalState::Pending, 50, 1_000));
    f.chain.set_prior_votes(alice(), U256::ZERO);
    f.chain.set_current_votes(alice(), tokens(2));

    let snapshot = f.oracle.can_vote(alice(), U256::from(1u64)).await.unwrap();
    assert_eq!(snapshot.weight, tokens(2));
    assert_eq!(snapshot.weight_source, WeightSource::Live);
    assert!(f.chain.prior_votes_queries().is_empty());
}

#[tokio::test]
async fn low_weight_is_rejected_before_receipt() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.add_proposal(proposal(1, ProposalState::Active, 50, 1_000));
    f.chain.set_prior_votes(alice(), ONE_TOKEN - U256::from(1u64));
    f.chain.mark_voted(U256::from(1u64), alice());
    assert!(matches!(
        f.oracle.can_vote(alice(), U256::from(1u64)).await,
        Err(EligibilityError::InsufficientVotingPower { .. })
    ));
}

#[tokio::test]
async fn on_chain_receipt_means_already_voted() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.add_proposal(proposal(1, ProposalState::Active, 50, 1_000));
    f.chain.set_prior_votes(alice(), tokens(2));
    f.chain.mark_voted(U256::from(1u64), alice());
    assert_eq!(
        f.oracle.can_vote(alice(), U256::from(1u64)).await,
        Err(EligibilityError::AlreadyVoted)
    );
}

#[tokio::test]
async fn ledger_vote_means_duplicate_submission() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.add_proposal(proposal(1, ProposalState::Active, 50, 1_000));
    f.chain.set_prior_votes(alice(), tokens(2));
    let intent = VoteIntent {
        voter: alice(),
        proposal_id: U256::from(1u64),
        support: Support::For,
        signature: sig(),
    };
    f.ledger
        .insert_vote(&SubmissionRecord::new_vote(&intent, sig(), Timestamp::new(NOW)))
        .unwrap();
    assert_eq!(
        f.oracle.can_vote(alice(), U256::from(1u64)).await,
        Err(EligibilityError::DuplicateSubmission)
    );
}

// ── can_propose ───────────────────────────────────────────────────────────

#[tokio::test]
async fn proposing_requires_votes_above_threshold() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.set_proposal_threshold(tokens(10));
    f.chain.set_prior_votes(alice(), tokens(10));
    assert!(matches!(
        f.oracle.can_propose(alice()).await,
        Err(EligibilityError::InsufficientVotingPower { .. })
    ));
    assert_eq!(f.chain.prior_votes_queries(), vec![(alice(), 99)]);

    f.chain.set_prior_votes(alice(), tokens(11));
    let snapshot = f.oracle.can_propose(alice()).await.unwrap();
    assert_eq!(snapshot.threshold, tokens(10));
}

#[tokio::test]
async fn live_latest_proposal_blocks_a_new_one() {
    let f = fixture();
    f.chain.set_block(100);
    f.chain.set_prior_votes(alice(), tokens(11));
    f.chain.add_proposal(proposal(4, ProposalState::Active, 90, 1_000));
    f.chain.set_latest_proposal(alice(), U256::from(4u64));
    assert_eq!(
        f.oracle.can_propose(alice()).await,
        Err(EligibilityError::ActiveProposalExists(U256::from(4u64)))
    );

    f.chain.add_proposal(proposal(4, ProposalState::Defeated, 90, 95));
    assert!(f.oracle.can_propose(alice()).await.is_ok());
}

// ── helper reads ──────────────────────────────────────────────────────────

#[tokio::test]
async fn nonce_reads_pass_through() {
    let f = fixture();
    f.chain.set_delegation_nonce(alice(), U256::from(4u64));
    f.chain.set_vote_nonce(alice(), U256::from(9u64));
    f.chain.set_current_votes(alice(), tokens(1));
    assert_eq!(f.oracle.delegation_nonce(alice()).await.unwrap(), U256::from(4u64));
    assert_eq!(f.oracle.vote_nonce(alice()).await.unwrap(), U256::from(9u64));
    assert_eq!(f.oracle.current_votes(alice()).await.unwrap(), tokens(1));
}
