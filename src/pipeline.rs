use log::{info, warn};
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::dataset::TrialBalanceDataset;
use crate::db::{replace_dataset, NewUpload};
use crate::error::Result;
use crate::filter::filter_rows;
use crate::rollup::{reconcile, BalanceWarning, StatementLabels};
use crate::schema::validate;
use crate::tabular::{parse_grid, FileKind};

/// A dataset that passed every check, with any balance warnings found on the way.
#[derive(Debug)]
pub struct Ingested {
    pub dataset: TrialBalanceDataset,
    pub warnings: Vec<BalanceWarning>,
}

/// Parse, validate, filter and classify an uploaded file. Touches no storage.
pub fn ingest(bytes: &[u8], kind: FileKind, labels: &StatementLabels) -> Result<Ingested> {
    let grid = parse_grid(bytes, kind)?;
    let rows = validate(&grid)?;
    let rows = filter_rows(rows)?;
    let dataset = TrialBalanceDataset::new(rows);
    let warnings = reconcile(&dataset, labels);
    for w in &warnings {
        warn!("trial balance does not balance: {w}");
    }
    Ok(Ingested { dataset, warnings })
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug)]
pub struct CommitResult {
    pub rows: usize,
    pub replaced: usize,
    pub unclassified: usize,
    pub warnings: Vec<BalanceWarning>,
}

/// Ingest `bytes` and, only if that succeeds, replace the engagement's dataset with it.
pub fn commit_upload(
    conn: &mut Connection,
    engagement: &str,
    filename: &str,
    bytes: &[u8],
    kind: FileKind,
    labels: &StatementLabels,
) -> Result<CommitResult> {
    let ingested = ingest(bytes, kind, labels)?;
    let digest = checksum(bytes);
    let upload = NewUpload {
        filename,
        kind,
        checksum: &digest,
    };
    let replaced = replace_dataset(conn, engagement, &upload, ingested.dataset.rows())?;
    info!("committed {filename} to '{engagement}' ({} rows)", replaced.inserted);
    Ok(CommitResult {
        rows: replaced.inserted,
        replaced: replaced.removed,
        unclassified: ingested.dataset.tree().unclassified().len(),
        warnings: ingested.warnings,
    })
}
