use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::dataset::TrialBalanceDataset;
use crate::error::{EtbError, Result};
use crate::models::{EtbRow, FileRef};
use crate::tabular::FileKind;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS engagements (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    client TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS etb_uploads (
    id INTEGER PRIMARY KEY,
    engagement_id INTEGER NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    file_kind TEXT NOT NULL,
    checksum TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    uploaded_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (engagement_id) REFERENCES engagements(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS etb_rows (
    id INTEGER PRIMARY KEY,
    upload_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    code TEXT NOT NULL,
    account_name TEXT NOT NULL,
    current_year INTEGER NOT NULL,
    prior_year INTEGER NOT NULL,
    grouping1 TEXT,
    grouping2 TEXT,
    grouping3 TEXT,
    grouping4 TEXT,
    FOREIGN KEY (upload_id) REFERENCES etb_uploads(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_etb_rows_upload ON etb_rows(upload_id, position);

CREATE TABLE IF NOT EXISTS etb_row_files (
    row_id INTEGER NOT NULL,
    file_ref TEXT NOT NULL,
    PRIMARY KEY (row_id, file_ref),
    FOREIGN KEY (row_id) REFERENCES etb_rows(id) ON DELETE CASCADE
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Engagements
// ---------------------------------------------------------------------------

pub fn add_engagement(conn: &Connection, name: &str, client: Option<&str>) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EtbError::Other("engagement name cannot be empty".to_string()));
    }
    conn.execute(
        "INSERT INTO engagements (name, client) VALUES (?1, ?2)",
        rusqlite::params![name, client],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            EtbError::Other(format!("engagement '{name}' already exists"))
        }
        other => other.into(),
    })?;
    Ok(conn.last_insert_rowid())
}

pub fn engagement_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM engagements WHERE name = ?1", [name.trim()], |r| r.get(0))
        .optional()?
        .ok_or_else(|| EtbError::UnknownEngagement(name.to_string()))
}

/// Deleting an engagement removes its dataset along with it.
pub fn delete_engagement(conn: &Connection, name: &str) -> Result<()> {
    let id = engagement_id(conn, name)?;
    conn.execute("DELETE FROM engagements WHERE id = ?1", [id])?;
    info!("deleted engagement '{name}'");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct UploadInfo {
    pub filename: String,
    pub file_kind: String,
    pub checksum: String,
    pub row_count: i64,
    pub uploaded_at: String,
}

#[derive(Debug, Clone)]
pub struct EngagementSummary {
    pub name: String,
    pub client: Option<String>,
    pub upload: Option<UploadInfo>,
}

pub fn list_engagements(conn: &Connection) -> Result<Vec<EngagementSummary>> {
    let mut stmt = conn.prepare(
        "SELECT e.name, e.client, u.filename, u.file_kind, u.checksum, u.row_count, u.uploaded_at \
         FROM engagements e LEFT JOIN etb_uploads u ON u.engagement_id = e.id \
         ORDER BY e.name",
    )?;
    let rows = stmt.query_map([], |row| {
        let filename: Option<String> = row.get(2)?;
        let upload = match filename {
            Some(filename) => Some(UploadInfo {
                filename,
                file_kind: row.get(3)?,
                checksum: row.get(4)?,
                row_count: row.get(5)?,
                uploaded_at: row.get(6)?,
            }),
            None => None,
        };
        Ok(EngagementSummary {
            name: row.get(0)?,
            client: row.get(1)?,
            upload,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

pub struct NewUpload<'a> {
    pub filename: &'a str,
    pub kind: FileKind,
    pub checksum: &'a str,
}

pub struct ReplaceResult {
    pub removed: usize,
    pub inserted: usize,
}

fn busy_as_in_progress(e: rusqlite::Error, engagement: &str) -> EtbError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::DatabaseBusy || err.code == ErrorCode::DatabaseLocked =>
        {
            EtbError::UploadInProgress(engagement.to_string())
        }
        other => other.into(),
    }
}

/// Swap the engagement's dataset for `rows` in one write transaction.
///
/// The previous upload and everything hanging off it is deleted before the new rows go in;
/// readers see either the old dataset or the new one. Writers are serialized by the
/// immediate transaction: a second upload waits for the connection's busy timeout and is
/// then rejected with [`EtbError::UploadInProgress`].
pub fn replace_dataset(
    conn: &mut Connection,
    engagement: &str,
    upload: &NewUpload<'_>,
    rows: &[EtbRow],
) -> Result<ReplaceResult> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| busy_as_in_progress(e, engagement))?;
    let id = engagement_id(&tx, engagement)?;

    let removed: i64 = tx.query_row(
        "SELECT count(*) FROM etb_rows r JOIN etb_uploads u ON r.upload_id = u.id \
         WHERE u.engagement_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    tx.execute("DELETE FROM etb_uploads WHERE engagement_id = ?1", [id])?;

    tx.execute(
        "INSERT INTO etb_uploads (engagement_id, filename, file_kind, checksum, row_count) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id, upload.filename, upload.kind.key(), upload.checksum, rows.len() as i64],
    )?;
    let upload_id = tx.last_insert_rowid();

    {
        let mut insert_row = tx.prepare(
            "INSERT INTO etb_rows (upload_id, position, code, account_name, current_year, prior_year, \
             grouping1, grouping2, grouping3, grouping4) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        let mut insert_file = tx.prepare("INSERT OR IGNORE INTO etb_row_files (row_id, file_ref) VALUES (?1, ?2)")?;
        for (position, row) in rows.iter().enumerate() {
            let [g1, g2, g3, g4] = &row.grouping;
            insert_row.execute(rusqlite::params![
                upload_id,
                position as i64,
                row.code,
                row.account_name,
                row.current_year,
                row.prior_year,
                g1,
                g2,
                g3,
                g4,
            ])?;
            let row_id = tx.last_insert_rowid();
            for file in &row.linked_files {
                insert_file.execute(rusqlite::params![row_id, file.0])?;
            }
        }
    }

    tx.commit().map_err(|e| busy_as_in_progress(e, engagement))?;
    info!(
        "replaced dataset for '{engagement}': {removed} rows removed, {} rows inserted",
        rows.len()
    );
    Ok(ReplaceResult {
        removed: removed as usize,
        inserted: rows.len(),
    })
}

pub fn upload_info(conn: &Connection, engagement: &str) -> Result<Option<UploadInfo>> {
    let id = engagement_id(conn, engagement)?;
    let info = conn
        .query_row(
            "SELECT filename, file_kind, checksum, row_count, uploaded_at FROM etb_uploads \
             WHERE engagement_id = ?1",
            [id],
            |row| {
                Ok(UploadInfo {
                    filename: row.get(0)?,
                    file_kind: row.get(1)?,
                    checksum: row.get(2)?,
                    row_count: row.get(3)?,
                    uploaded_at: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(info)
}

/// The engagement's committed dataset, or `None` before the first upload.
pub fn load_dataset(conn: &Connection, engagement: &str) -> Result<Option<TrialBalanceDataset>> {
    let tx = conn.unchecked_transaction()?;
    let id = engagement_id(&tx, engagement)?;
    let upload_id: Option<i64> = tx
        .query_row("SELECT id FROM etb_uploads WHERE engagement_id = ?1", [id], |r| r.get(0))
        .optional()?;
    let Some(upload_id) = upload_id else {
        return Ok(None);
    };

    let rows = {
        let mut stmt = tx.prepare(
            "SELECT id, code, account_name, current_year, prior_year, grouping1, grouping2, grouping3, grouping4 \
             FROM etb_rows WHERE upload_id = ?1 ORDER BY position",
        )?;
        let mut files = tx.prepare("SELECT file_ref FROM etb_row_files WHERE row_id = ?1 ORDER BY file_ref")?;
        let raw: Vec<(i64, EtbRow)> = stmt
            .query_map([upload_id], |row| {
                Ok((
                    row.get(0)?,
                    EtbRow {
                        code: row.get(1)?,
                        account_name: row.get(2)?,
                        current_year: row.get(3)?,
                        prior_year: row.get(4)?,
                        grouping: [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
                        linked_files: BTreeSet::new(),
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut rows = Vec::with_capacity(raw.len());
        for (row_id, mut row) in raw {
            row.linked_files = files
                .query_map([row_id], |r| Ok(FileRef(r.get(0)?)))?
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            rows.push(row);
        }
        rows
    };
    tx.finish()?;
    debug!("loaded {} rows for '{engagement}'", rows.len());
    Ok(Some(TrialBalanceDataset::new(rows)))
}

// ---------------------------------------------------------------------------
// Linked files
// ---------------------------------------------------------------------------

fn current_rows_with_code(conn: &Connection, engagement: &str, code: &str) -> Result<Vec<i64>> {
    let id = engagement_id(conn, engagement)?;
    let mut stmt = conn.prepare(
        "SELECT r.id FROM etb_rows r JOIN etb_uploads u ON r.upload_id = u.id \
         WHERE u.engagement_id = ?1 AND r.code = ?2",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![id, code.trim()], |r| r.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    if ids.is_empty() {
        return Err(EtbError::Other(format!(
            "no account with code '{code}' in the current dataset of '{engagement}'"
        )));
    }
    Ok(ids)
}

/// Attach `file` to every row carrying `code`. Returns how many rows gained the link.
pub fn link_file(conn: &Connection, engagement: &str, code: &str, file: &FileRef) -> Result<usize> {
    let mut linked = 0;
    for row_id in current_rows_with_code(conn, engagement, code)? {
        linked += conn.execute(
            "INSERT OR IGNORE INTO etb_row_files (row_id, file_ref) VALUES (?1, ?2)",
            rusqlite::params![row_id, file.0],
        )?;
    }
    Ok(linked)
}

pub fn unlink_file(conn: &Connection, engagement: &str, code: &str, file: &FileRef) -> Result<usize> {
    let mut removed = 0;
    for row_id in current_rows_with_code(conn, engagement, code)? {
        removed += conn.execute(
            "DELETE FROM etb_row_files WHERE row_id = ?1 AND file_ref = ?2",
            rusqlite::params![row_id, file.0],
        )?;
    }
    Ok(removed)
}
