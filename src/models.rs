use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// A spreadsheet cell as read from the file, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    /// True for missing cells and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Display text of the cell. Whole numbers render without a fractional part so that
    /// an account code typed as 1000 in Excel reads back as "1000".
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

/// Rows of cells; row 0 is the header row.
pub type Grid = Vec<Vec<RawCell>>;

/// Opaque reference to a document held by the engagement's file library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileRef(pub String);

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One account line of an extended trial balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtbRow {
    pub code: String,
    pub account_name: String,
    pub current_year: i64,
    pub prior_year: i64,
    pub grouping: [Option<String>; 4],
    pub linked_files: BTreeSet<FileRef>,
}

impl EtbRow {
    /// A row with no code, no name and a zero current-year amount carries no information.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.account_name.is_empty() && self.current_year == 0
    }

    pub fn amount(&self, period: Period) -> i64 {
        match period {
            Period::CurrentYear => self.current_year,
            Period::PriorYear => self.prior_year,
        }
    }

    /// Non-empty grouping labels in order, skipping gaps.
    pub fn grouping_labels(&self) -> Vec<&str> {
        self.grouping
            .iter()
            .filter_map(|g| g.as_deref())
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    CurrentYear,
    PriorYear,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CurrentYear => "Current Year",
            Self::PriorYear => "Prior Year",
        }
    }
}

#[cfg(test)]
pub(crate) fn row(code: &str, name: &str, cy: i64, py: i64, grouping: &[&str]) -> EtbRow {
    let mut g: [Option<String>; 4] = Default::default();
    for (slot, label) in g.iter_mut().zip(grouping) {
        if !label.is_empty() {
            *slot = Some(label.to_string());
        }
    }
    EtbRow {
        code: code.to_string(),
        account_name: name.to_string(),
        current_year: cy,
        prior_year: py,
        grouping: g,
        linked_files: BTreeSet::new(),
    }
}
