//! Wiring of one relayer instance.
//!
//! [`RelayerContext`] owns the eligibility oracle, the intent validator and
//! the metrics registry. The HTTP layer holds it behind an `Arc` and never
//! touches the chain, the ledger or the relay directly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use sigrelay_governance::{
    ledger_call, ChainState, Contracts, DelegationSnapshot, EligibilityOracle, EligibilityParams,
    ProposerSnapshot, RpcChain, VoteSnapshot,
};
use sigrelay_relay::{HttpRelayDispatcher, Notifier, RelayMode, SilentNotifier, WebhookNotifier};
use sigrelay_store::{StoreError, SubmissionLedger, VoteFilter};
use sigrelay_types::{Address, Clock, SubmissionRecord, SystemClock, U256};
use tracing::{info, warn, Instrument};

use crate::config::{RelayModeSetting, RelayerConfig};
use crate::tracing_spans::probe_span;
use crate::{IntentError, IntentMetrics, IntentValidator, NodeError};

/// External collaborators of a relayer.
pub struct Dependencies {
    pub chain: Arc<dyn ChainState>,
    pub ledger: Arc<dyn SubmissionLedger>,
    pub clock: Arc<dyn Clock>,
    pub relay_mode: RelayMode,
    pub notifier: Arc<dyn Notifier>,
}

/// Concurrent weight reads per `/pending` listing.
const WEIGHT_READS_IN_FLIGHT: usize = 8;

/// An unexecuted record together with the sender's current vote weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    pub record: SubmissionRecord,
    /// `None` when the weight could not be read.
    pub votes: Option<U256>,
}

pub struct RelayerContext {
    oracle: Arc<EligibilityOracle>,
    ledger: Arc<dyn SubmissionLedger>,
    validator: IntentValidator,
    metrics: Arc<IntentMetrics>,
}

impl RelayerContext {
    pub fn new(deps: Dependencies, contracts: Contracts, params: EligibilityParams) -> Self {
        let metrics = Arc::new(IntentMetrics::new());
        let oracle = Arc::new(EligibilityOracle::new(
            deps.chain,
            deps.ledger.clone(),
            deps.clock.clone(),
            params,
        ));
        let validator = IntentValidator::new(
            oracle.clone(),
            deps.ledger.clone(),
            contracts,
            deps.relay_mode,
            deps.notifier,
            deps.clock,
            metrics.clone(),
        );
        Self {
            oracle,
            ledger: deps.ledger,
            validator,
            metrics,
        }
    }

    /// Build the production wiring: JSON-RPC chain reader, HTTP relay (when
    /// synchronous) and the webhook notifier (when a hook is configured).
    pub fn from_config(
        config: &RelayerConfig,
        ledger: Arc<dyn SubmissionLedger>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let params = config.eligibility_params()?;
        let contracts = config.contracts();

        let chain = RpcChain::new(
            config.chain.rpc_url.clone(),
            config.token.address,
            config.governor.address,
            config.governor.kind,
            config.upstream_timeout(),
        )?;

        let relay_mode = match (&config.relay.mode, &config.relay.endpoint) {
            (RelayModeSetting::Synchronous, Some(endpoint)) => {
                let dispatcher = HttpRelayDispatcher::new(endpoint.clone(), config.relay_timeout())?;
                RelayMode::Synchronous(Arc::new(dispatcher))
            }
            _ => RelayMode::Deferred,
        };

        let notifier: Arc<dyn Notifier> = match config.notification_hook.as_deref() {
            Some(hook) if !hook.is_empty() => {
                Arc::new(WebhookNotifier::new(hook, config.upstream_timeout())?)
            }
            _ => Arc::new(SilentNotifier),
        };

        info!(
            rpc = chain.url(),
            governor = %config.governor.address,
            kind = %config.governor.kind,
            relay = relay_mode.as_str(),
            "relayer wired"
        );

        Ok(Self::new(
            Dependencies {
                chain: Arc::new(chain),
                ledger,
                clock: Arc::new(SystemClock),
                relay_mode,
                notifier,
            },
            contracts,
            params,
        ))
    }

    pub fn validator(&self) -> &IntentValidator {
        &self.validator
    }

    pub fn metrics(&self) -> &IntentMetrics {
        &self.metrics
    }

    pub fn oracle(&self) -> &EligibilityOracle {
        &self.oracle
    }

    pub async fn can_delegate(
        &self,
        address: Address,
        delegatee: Option<Address>,
    ) -> Result<DelegationSnapshot, IntentError> {
        let result = self
            .oracle
            .can_delegate(address, delegatee)
            .instrument(probe_span("can_delegate", &address))
            .await;
        self.probed("delegate", result)
    }

    pub async fn can_vote(
        &self,
        address: Address,
        proposal_id: U256,
    ) -> Result<VoteSnapshot, IntentError> {
        let result = self
            .oracle
            .can_vote(address, proposal_id)
            .instrument(probe_span("can_vote", &address))
            .await;
        self.probed("vote", result)
    }

    pub async fn can_propose(&self, address: Address) -> Result<ProposerSnapshot, IntentError> {
        let result = self
            .oracle
            .can_propose(address)
            .instrument(probe_span("can_propose", &address))
            .await;
        self.probed("propose", result)
    }

    /// Vote records, newest first. At least one of proposal or address must
    /// be set.
    pub async fn votes(&self, filter: VoteFilter) -> Result<Vec<SubmissionRecord>, IntentError> {
        if !filter.is_scoped() {
            return Err(IntentError::InvalidInput(
                "proposalId or address required".into(),
            ));
        }
        let records = self
            .read_ledger(move |ledger| ledger.list_votes(&filter))
            .await?;
        Ok(records)
    }

    /// Unexecuted records, each with the sender's current vote weight.
    ///
    /// Weights are read once per sender. A failed read leaves that sender's
    /// weight empty instead of failing the listing.
    pub async fn pending(&self) -> Result<Vec<PendingEntry>, IntentError> {
        let records = self.read_ledger(|ledger| ledger.list_pending()).await?;
        let senders: HashSet<Address> = records.iter().map(|record| record.from).collect();
        let weights: HashMap<Address, U256> = stream::iter(senders)
            .map(|address| async move { (address, self.oracle.current_votes(address).await) })
            .buffer_unordered(WEIGHT_READS_IN_FLIGHT)
            .filter_map(|(address, read)| async move {
                match read {
                    Ok(votes) => Some((address, votes)),
                    Err(e) => {
                        warn!(%address, error = %e, "cannot read vote weight for pending listing");
                        None
                    }
                }
            })
            .collect()
            .await;
        Ok(records
            .into_iter()
            .map(|record| PendingEntry {
                votes: weights.get(&record.from).copied(),
                record,
            })
            .collect())
    }

    async fn read_ledger<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SubmissionLedger) -> Result<T, StoreError> + Send + 'static,
    {
        ledger_call(&self.ledger, self.oracle.params().upstream_timeout, f).await
    }

    fn probed<T, E: Into<IntentError>>(
        &self,
        check: &str,
        result: Result<T, E>,
    ) -> Result<T, IntentError> {
        result.map_err(|e| {
            let error = e.into();
            if let IntentError::UpstreamUnavailable(detail) = &error {
                warn!(check, detail = %detail, "upstream failure during probe");
            }
            self.metrics.record_rejection(check, error.reason());
            error
        })
    }
}
