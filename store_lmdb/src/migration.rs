//! Database schema versioning.
//!
//! Tracks a monotonically increasing schema version in the `meta` database
//! and runs sequential migration steps to bring an older database up to date.

use heed::types::Bytes;
use heed::{Database, Env};

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - A stored version newer than [`CURRENT_SCHEMA_VERSION`] means the
    ///   database was written by a newer relay and is refused.
    pub fn run(env: &Env, meta_db: Database<Bytes, Bytes>) -> Result<u32, LmdbError> {
        let current = read_schema_version(env, meta_db)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(current);
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Corruption(format!(
                "database schema version {current} is newer than supported version {CURRENT_SCHEMA_VERSION}"
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        let mut wtxn = env.write_txn()?;
        meta_db.put(
            &mut wtxn,
            SCHEMA_VERSION_KEY,
            &CURRENT_SCHEMA_VERSION.to_le_bytes(),
        )?;
        wtxn.commit()?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(CURRENT_SCHEMA_VERSION)
    }
}

pub(crate) fn read_schema_version(
    env: &Env,
    meta_db: Database<Bytes, Bytes>,
) -> Result<u32, LmdbError> {
    let rtxn = env.read_txn()?;
    match meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema, nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Corruption(format!(
            "no migration path from schema {from} to {to}"
        ))),
    }
}
