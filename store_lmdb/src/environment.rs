//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::ledger::LmdbSubmissionLedger;
use crate::migration::Migrator;
use crate::LmdbError;

pub(crate) const RECORDS_DB: &str = "records";
pub(crate) const VOTE_INDEX_DB: &str = "vote_index";
pub(crate) const PENDING_DELEGATIONS_DB: &str = "pending_delegations";
pub(crate) const LAST_DELEGATION_DB: &str = "last_delegation";
pub(crate) const META_DB: &str = "meta";

const MAX_DBS: u32 = 8;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
///
/// Open once per process; handles are cheap to clone into ledgers.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    pub(crate) records_db: Database<Bytes, Bytes>,
    pub(crate) vote_index_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) last_delegation_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and never
        // opened twice for the same path from this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let records_db = env.create_database(&mut wtxn, Some(RECORDS_DB))?;
        let vote_index_db = env.create_database(&mut wtxn, Some(VOTE_INDEX_DB))?;
        let pending_db = env.create_database(&mut wtxn, Some(PENDING_DELEGATIONS_DB))?;
        let last_delegation_db = env.create_database(&mut wtxn, Some(LAST_DELEGATION_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        Migrator::run(&env, meta_db)?;

        tracing::info!(path = %path.display(), map_size, "LMDB environment opened");

        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            records_db,
            vote_index_db,
            pending_db,
            last_delegation_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A ledger over this environment enforcing the given delegation window.
    pub fn submission_ledger(&self, delegation_window_secs: u64) -> LmdbSubmissionLedger {
        LmdbSubmissionLedger {
            env: Arc::clone(&self.env),
            records_db: self.records_db,
            vote_index_db: self.vote_index_db,
            pending_db: self.pending_db,
            last_delegation_db: self.last_delegation_db,
            meta_db: self.meta_db,
            delegation_window_secs,
        }
    }

    /// Flush dirty pages to disk. Called on shutdown.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}
