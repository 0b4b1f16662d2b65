//! The intent pipeline.
//!
//! Per intent, strictly in order, first failure wins:
//! 1. structural validation; for votes also the duplicate and on-chain
//!    receipt check, so a resubmission is reported as such whatever its
//!    signature
//! 2. signer recovery against the claimed address
//! 3. eligibility (plus the on-chain delegation nonce)
//! 4. persist, with the ledger re-checking its uniqueness rules
//! 5. relay according to [`RelayMode`]
//! 6. best-effort notification, sent from a detached task

use std::sync::Arc;
use std::time::{Duration, Instant};

use sigrelay_crypto::{normalize_v, recover_signer, TypedPayload};
use sigrelay_governance::{ledger_call, Contracts, EligibilityOracle};
use sigrelay_relay::{Notifier, RelayMode};
use sigrelay_store::{StoreError, SubmissionLedger};
use sigrelay_types::{
    Address, Clock, DelegationIntent, RawDelegation, RawVote, RecordId, RecordKind,
    SignatureParts, SubmissionRecord, VoteIntent, B256, U256,
};
use tracing::{debug, info, warn, Instrument};

use crate::tracing_spans::intent_span;
use crate::{IntentError, IntentMetrics};

pub const VOTE_NOTIFICATION: &str = "New voting sig";
pub const DELEGATION_NOTIFICATION: &str = "New delegation sig";

/// Outcome of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: RecordId,
    pub executed: bool,
    pub tx_hash: Option<B256>,
}

pub struct IntentValidator {
    oracle: Arc<EligibilityOracle>,
    ledger: Arc<dyn SubmissionLedger>,
    contracts: Contracts,
    relay_mode: RelayMode,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    metrics: Arc<IntentMetrics>,
}

impl IntentValidator {
    pub fn new(
        oracle: Arc<EligibilityOracle>,
        ledger: Arc<dyn SubmissionLedger>,
        contracts: Contracts,
        relay_mode: RelayMode,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        metrics: Arc<IntentMetrics>,
    ) -> Self {
        Self {
            oracle,
            ledger,
            contracts,
            relay_mode,
            notifier,
            clock,
            metrics,
        }
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    pub fn relay_mode(&self) -> &RelayMode {
        &self.relay_mode
    }

    pub async fn submit_vote(&self, raw: RawVote) -> Result<Submission, IntentError> {
        let started = Instant::now();
        let intent = match VoteIntent::from_raw(raw) {
            Ok(intent) => intent,
            Err(e) => return Err(self.rejected(RecordKind::Vote, e.into())),
        };
        let span = intent_span(RecordKind::Vote, &intent.voter);
        let result = self.vote_pipeline(intent).instrument(span).await;
        self.finish(RecordKind::Vote, started, result)
    }

    pub async fn submit_delegation(&self, raw: RawDelegation) -> Result<Submission, IntentError> {
        let started = Instant::now();
        let intent = match DelegationIntent::from_raw(raw) {
            Ok(intent) => intent,
            Err(e) => return Err(self.rejected(RecordKind::Delegate, e.into())),
        };
        let span = intent_span(RecordKind::Delegate, &intent.delegator);
        let result = self.delegation_pipeline(intent).instrument(span).await;
        self.finish(RecordKind::Delegate, started, result)
    }

    async fn vote_pipeline(&self, intent: VoteIntent) -> Result<Submission, IntentError> {
        let governor = &self.contracts.governor;
        governor.check_support(intent.support)?;
        self.oracle
            .check_first_vote(intent.voter, intent.proposal_id)
            .await?;

        let nonce = if governor.kind.uses_vote_nonce() {
            self.oracle.vote_nonce(intent.voter).await?
        } else {
            U256::ZERO
        };
        let payload = governor.ballot_payload(&intent, nonce)?;
        let signature = verify(&payload, &intent.signature, intent.voter)?;

        self.oracle
            .can_vote(intent.voter, intent.proposal_id)
            .await?;

        let record = SubmissionRecord::new_vote(&intent, signature, self.clock.now());
        let id = self
            .persist(record.clone(), |ledger, r| ledger.insert_vote(r))
            .await?;
        info!(id, proposal = %intent.proposal_id, support = intent.support.as_u8(), "vote accepted");

        let submission = self.relay(record.with_id(id)).await;
        self.notify(VOTE_NOTIFICATION);
        Ok(submission)
    }

    async fn delegation_pipeline(
        &self,
        intent: DelegationIntent,
    ) -> Result<Submission, IntentError> {
        let now = self.clock.now();
        if intent.expiry < now.as_secs() {
            return Err(IntentError::InvalidInput(format!(
                "signature expired at {}",
                intent.expiry
            )));
        }

        let payload = self.contracts.token.delegation_payload(&intent);
        let signature = verify(&payload, &intent.signature, intent.delegator)?;

        let (eligibility, nonce) = tokio::join!(
            self.oracle
                .can_delegate(intent.delegator, Some(intent.delegatee)),
            self.oracle.delegation_nonce(intent.delegator),
        );
        eligibility?;
        let expected = nonce?;
        if expected != intent.nonce {
            return Err(IntentError::InvalidInput(format!(
                "nonce {} does not match on-chain nonce {expected}",
                intent.nonce
            )));
        }

        let record = SubmissionRecord::new_delegation(&intent, signature, now);
        let id = self
            .persist(record.clone(), |ledger, r| ledger.insert_delegation(r))
            .await?;
        info!(id, delegatee = %intent.delegatee, "delegation accepted");

        let submission = self.relay(record.with_id(id)).await;
        self.notify(DELEGATION_NOTIFICATION);
        Ok(submission)
    }

    async fn persist(
        &self,
        record: SubmissionRecord,
        insert: fn(&dyn SubmissionLedger, &SubmissionRecord) -> Result<RecordId, StoreError>,
    ) -> Result<RecordId, IntentError> {
        let timeout = self.upstream_timeout();
        let id = ledger_call(&self.ledger, timeout, move |ledger| insert(ledger, &record)).await?;
        Ok(id)
    }

    /// Relay failures are logged and counted; the record stays pending.
    async fn relay(&self, record: SubmissionRecord) -> Submission {
        let pending = Submission {
            id: record.id,
            executed: false,
            tx_hash: None,
        };
        let RelayMode::Synchronous(dispatcher) = &self.relay_mode else {
            return pending;
        };

        let call = match self.contracts.relay_call(&record) {
            Ok(call) => call,
            Err(e) => {
                warn!(id = record.id, error = %e, "cannot encode relay call");
                self.metrics.relay_failures.inc();
                return pending;
            }
        };
        let tx_hash = match dispatcher.relay(&call).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(id = record.id, error = %e, "relay failed, record left pending");
                self.metrics.relay_failures.inc();
                return pending;
            }
        };
        self.metrics.relayed.inc();

        let id = record.id;
        let marked = ledger_call(&self.ledger, self.upstream_timeout(), move |ledger| {
            ledger.mark_executed(id, &tx_hash)
        })
        .await;
        if let Err(e) = marked {
            warn!(id, tx_hash = %tx_hash, error = %e, "relayed but could not mark executed");
        }
        Submission {
            id,
            executed: true,
            tx_hash: Some(tx_hash),
        }
    }

    /// The request does not wait for the webhook; failures are logged and
    /// counted by the task.
    fn notify(&self, message: &'static str) {
        let notifier = Arc::clone(&self.notifier);
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(
            async move {
                if let Err(e) = notifier.notify(message).await {
                    warn!(error = %e, "notification failed");
                    metrics.notify_failures.inc();
                }
            }
            .in_current_span(),
        );
    }

    fn upstream_timeout(&self) -> Duration {
        self.oracle.params().upstream_timeout
    }

    fn finish(
        &self,
        kind: RecordKind,
        started: Instant,
        result: Result<Submission, IntentError>,
    ) -> Result<Submission, IntentError> {
        self.metrics
            .submit_time_ms
            .with_label_values(&[kind.as_str()])
            .observe(started.elapsed().as_secs_f64() * 1_000.0);
        match result {
            Ok(submission) => {
                self.metrics.accepted.with_label_values(&[kind.as_str()]).inc();
                Ok(submission)
            }
            Err(e) => Err(self.rejected(kind, e)),
        }
    }

    fn rejected(&self, kind: RecordKind, error: IntentError) -> IntentError {
        match &error {
            IntentError::UpstreamUnavailable(detail) => {
                warn!(kind = kind.as_str(), detail = %detail, "upstream failure");
            }
            other => debug!(kind = kind.as_str(), reason = other.reason(), "intent rejected: {other}"),
        }
        self.metrics.record_rejection(kind.as_str(), error.reason());
        error
    }
}

/// Recover the signer and require it to be `claimed`. Returns the signature
/// with `v` normalised for storage.
fn verify(
    payload: &TypedPayload,
    signature: &SignatureParts,
    claimed: Address,
) -> Result<SignatureParts, IntentError> {
    let v = normalize_v(signature.v)?;
    let signer = recover_signer(payload, signature)?;
    if signer != claimed {
        return Err(IntentError::InvalidSignature(format!(
            "recovered signer {signer} does not match address {claimed}"
        )));
    }
    Ok(signature.with_v(v))
}
