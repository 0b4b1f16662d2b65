//! sigrelay core.
//!
//! The relayer is the coordinator that:
//! - Loads and validates configuration
//! - Wires the chain reader, ledger, relay and notifier into one context
//! - Runs every submitted intent through the validation pipeline
//! - Answers read-only eligibility probes
//! - Exposes Prometheus metrics and handles graceful shutdown

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod tracing_spans;
pub mod validator;

pub use config::{
    ChainSection, EligibilitySection, GovernorSection, RelayModeSetting, RelaySection,
    RelayerConfig, TokenSection,
};
pub use context::{Dependencies, PendingEntry, RelayerContext};
pub use error::{IntentError, NodeError};
pub use metrics::IntentMetrics;
pub use shutdown::ShutdownController;
pub use validator::{
    IntentValidator, Submission, DELEGATION_NOTIFICATION, VOTE_NOTIFICATION,
};
