//! On-chain side of the relay.
//!
//! - [`ChainState`]: contract reads, with [`RpcChain`] as the JSON-RPC
//!   implementation
//! - [`Governor`] / [`TokenContract`]: ballot schemas, signing domains and
//!   relay calldata per [`GovernorKind`](sigrelay_types::GovernorKind)
//! - [`EligibilityOracle`]: the delegate / vote / propose rules

pub mod abi;
pub mod chain;
pub mod eligibility;
pub mod error;
pub mod governor;
pub mod params;
pub mod rpc_chain;
pub mod upstream;

pub use chain::{ChainState, ProposalInfo};
pub use eligibility::{
    DelegationSnapshot, EligibilityOracle, ProposerSnapshot, VoteSnapshot, WeightSource,
};
pub use error::{ChainError, EligibilityError, GovernorError};
pub use governor::{Contracts, Governor, TokenContract, DEFAULT_DOMAIN_VERSION};
pub use params::{EligibilityParams, DEFAULT_SAFETY_MARGIN_BLOCKS, DEFAULT_UPSTREAM_TIMEOUT, ONE_TOKEN};
pub use rpc_chain::RpcChain;
pub use upstream::{bounded, ledger_call};
