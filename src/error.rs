use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowProblem {
    NotANumber,
    /// The column's summed magnitudes no longer fit in an `i64` from this row on.
    OutOfRange,
    /// A grouping label that would split into several path segments.
    ContainsSeparator,
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowProblem::NotANumber => f.write_str("is not a number"),
            RowProblem::OutOfRange => f.write_str("is too large to total with the rest of the column"),
            RowProblem::ContainsSeparator => f.write_str("cannot contain the path separator '>' between spaces"),
        }
    }
}

/// A data row with a cell that cannot be taken as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValidationError {
    /// 1-based and header-inclusive: the first data row is row 2.
    pub row: usize,
    pub column: String,
    pub value: String,
    pub problem: RowProblem,
}

impl fmt::Display for RowValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {} value '{}' {}", self.row, self.column, self.value, self.problem)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No data rows found")]
    NoDataRows,
}

#[derive(Error, Debug)]
pub enum EtbError {
    #[error("Could not read file: {0}")]
    Parse(String),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{} row(s) failed validation:\n{}", .0.len(), join_lines(.0))]
    RowValidation(Vec<RowValidationError>),

    #[error("No valid data rows found")]
    EmptyResult,

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown engagement: {0}")]
    UnknownEngagement(String),

    #[error("Another upload for engagement '{0}' is still being committed; try again")]
    UploadInProgress(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

fn join_lines(errors: &[RowValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, EtbError>;
