use std::path::Path;

use log::debug;

use crate::error::{EtbError, Result};
use crate::models::{Grid, RawCell};

// ---------------------------------------------------------------------------
// File kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

const ALL_KINDS: &[FileKind] = &[FileKind::Csv, FileKind::Xlsx];

impl FileKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        ALL_KINDS
            .iter()
            .find(|k| k.key().eq_ignore_ascii_case(key.trim()))
            .copied()
            .ok_or_else(|| EtbError::Parse(format!("unsupported file kind '{key}' (expected csv or xlsx)")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EtbError::Parse(format!("cannot tell the file kind of {}", path.display())))?;
        Self::from_key(ext)
    }
}

// ---------------------------------------------------------------------------
// parse_grid
// ---------------------------------------------------------------------------

/// Read an in-memory file into a grid of raw cells. Row 0 is the header row.
///
/// No semantic checks happen here: a grid of the wrong shape is still a valid result.
pub fn parse_grid(bytes: &[u8], kind: FileKind) -> Result<Grid> {
    let grid = match kind {
        FileKind::Csv => parse_csv(bytes)?,
        FileKind::Xlsx => parse_xlsx(bytes)?,
    };
    if grid.is_empty() {
        return Err(EtbError::Parse("file contains no rows".to_string()));
    }
    debug!(
        "parsed {} grid: {} rows, {} columns in header",
        kind.key(),
        grid.len(),
        grid[0].len()
    );
    Ok(grid)
}

fn parse_csv(bytes: &[u8]) -> Result<Grid> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| EtbError::Parse(format!("invalid CSV: {e}")))?;
        grid.push(record.iter().map(RawCell::from).collect());
    }
    Ok(grid)
}

#[cfg(feature = "xlsx")]
fn parse_xlsx(bytes: &[u8]) -> Result<Grid> {
    use calamine::{Data, Reader, Xlsx};

    let mut workbook = Xlsx::new(std::io::Cursor::new(bytes))
        .map_err(|e| EtbError::Parse(format!("invalid XLSX: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtbError::Parse("workbook has no sheets".to_string()))?
        .map_err(|e| EtbError::Parse(format!("invalid XLSX: {e}")))?;

    let grid = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => RawCell::Empty,
                    Data::String(s) if s.is_empty() => RawCell::Empty,
                    Data::String(s) => RawCell::Text(s.clone()),
                    Data::Float(f) => RawCell::Number(*f),
                    Data::Int(i) => RawCell::Number(*i as f64),
                    other => RawCell::Text(other.to_string()),
                })
                .collect()
        })
        .collect();
    Ok(grid)
}

#[cfg(not(feature = "xlsx"))]
fn parse_xlsx(_bytes: &[u8]) -> Result<Grid> {
    Err(EtbError::Parse("this build has no XLSX support".to_string()))
}
