//! Abstract storage for accepted submissions.
//!
//! Every storage backend (LMDB in production, in-memory for testing)
//! implements [`SubmissionLedger`]. The rest of the codebase depends only on
//! the trait.

pub mod error;
pub mod filter;
pub mod ledger;

pub use error::StoreError;
pub use filter::VoteFilter;
pub use ledger::{SubmissionLedger, DEFAULT_DELEGATION_WINDOW_SECS};
