//! HTTP API for the relayer.
//!
//! Provides endpoints for:
//! - Eligibility probes (delegate, vote, propose)
//! - Signed vote and delegation submission
//! - Vote listings and the pending queue
//! - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, RpcError};
pub use server::{router, RpcServer};
