//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the relay (clock, chain, ledger, relay
//! service, webhook) sits behind a trait. The types here implement those
//! traits in memory so tests can:
//! - pin time and chain state
//! - inject upstream failures and latency
//! - assert on what was relayed or announced
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod ledger;
pub mod relay;

pub use chain::NullChain;
pub use clock::NullClock;
pub use ledger::NullLedger;
pub use relay::{NullNotifier, NullRelay};
