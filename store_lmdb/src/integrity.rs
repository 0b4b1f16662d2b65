//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the relay starts
//! accepting submissions.

use std::path::Path;

use heed::types::Bytes;
use heed::Env;

use crate::codec::{decode_record, decode_u64};
use crate::environment::{
    LAST_DELEGATION_DB, META_DB, PENDING_DELEGATIONS_DB, RECORDS_DB, VOTE_INDEX_DB,
};
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub records_decoded: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

const EXPECTED_DATABASES: &[&str] = &[
    RECORDS_DB,
    VOTE_INDEX_DB,
    PENDING_DELEGATIONS_DB,
    LAST_DELEGATION_DB,
    META_DB,
];

/// Open every expected database, count its entries and decode every record.
///
/// Read failures are collected in the report rather than aborting the check.
pub fn check_integrity(environment: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let env: &Env = environment.env();
    let mut report = IntegrityReport::default();
    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    for entry in environment.records_db.iter(&rtxn)? {
        let (key, value) = entry?;
        match decode_record(value) {
            Ok(_) => report.records_decoded += 1,
            Err(e) => {
                let id = decode_u64(key, "record key")
                    .map_or_else(|k| k.to_string(), |id| id.to_string());
                report.errors.push(format!("record {id}: {e}"));
            }
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() && path.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false) {
        return Err(format!(
            "LMDB directory is not empty but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
