//! LMDB storage backend for sigrelay.
//!
//! Implements [`sigrelay_store::SubmissionLedger`] using the `heed` LMDB
//! bindings. All databases live in a single environment opened once at
//! startup.

mod codec;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod ledger;
pub mod migration;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use ledger::LmdbSubmissionLedger;
pub use migration::CURRENT_SCHEMA_VERSION;
