//! Fundamental types for sigrelay.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: signed intents, persisted submission records, timestamps,
//! governor variants and encoded contract calls.

pub mod call;
pub mod error;
pub mod governor;
pub mod intent;
pub mod record;
pub mod time;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use call::EncodedCall;
pub use error::ParseError;
pub use governor::{GovernorKind, ProposalState};
pub use intent::{
    parse_address, parse_u256, DelegationIntent, Intent, RawDelegation, RawScalar, RawVote,
    SignatureParts, Support, VoteIntent,
};
pub use record::{RecordId, RecordKind, RecordPayload, SubmissionRecord};
pub use time::{Clock, SystemClock, Timestamp};
