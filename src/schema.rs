use log::debug;

use crate::classify::is_clean_label;
use crate::error::{EtbError, Result, RowProblem, RowValidationError, SchemaError};
use crate::models::{EtbRow, Grid, RawCell};
use crate::normalize::{normalize, Amount};

pub const CODE: &str = "Code";
pub const ACCOUNT_NAME: &str = "Account Name";
pub const CURRENT_YEAR: &str = "Current Year";
pub const PRIOR_YEAR: &str = "Prior Year";

const REQUIRED: [&str; 4] = [CODE, ACCOUNT_NAME, CURRENT_YEAR, PRIOR_YEAR];
const GROUPING: [&str; 4] = ["Grouping 1", "Grouping 2", "Grouping 3", "Grouping 4"];

/// Column positions resolved once from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: usize,
    pub account_name: usize,
    pub current_year: usize,
    pub prior_year: usize,
    pub grouping: [Option<usize>; 4],
}

fn find_column(header: &[RawCell], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| cell.text().eq_ignore_ascii_case(name))
}

impl ColumnMap {
    /// Resolve every required column, reporting all of the missing ones together.
    pub fn resolve(header: &[RawCell]) -> std::result::Result<Self, SchemaError> {
        let found: Vec<Option<usize>> = REQUIRED.iter().map(|name| find_column(header, name)).collect();
        let missing: Vec<String> = REQUIRED
            .iter()
            .zip(&found)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }
        let idx = |i: usize| found[i].unwrap_or_default();
        Ok(Self {
            code: idx(0),
            account_name: idx(1),
            current_year: idx(2),
            prior_year: idx(3),
            grouping: GROUPING.map(|name| find_column(header, name)),
        })
    }
}

static EMPTY: RawCell = RawCell::Empty;

fn cell(row: &[RawCell], idx: usize) -> &RawCell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// Running sum of one column's absolute amounts. Any total drawn from the column is bounded
/// by it, so keeping it within `i64` keeps every rollup in range.
#[derive(Debug, Default)]
struct Magnitude {
    sum: u64,
    exceeded: bool,
}

impl Magnitude {
    /// Add `value`, returning true only on the row that first pushes the sum out of range.
    fn add(&mut self, value: i64) -> bool {
        if self.exceeded {
            return false;
        }
        match self.sum.checked_add(value.unsigned_abs()) {
            Some(sum) if sum <= i64::MAX.unsigned_abs() => {
                self.sum = sum;
                false
            }
            _ => {
                self.exceeded = true;
                true
            }
        }
    }
}

fn amount_of(
    row: &[RawCell],
    idx: usize,
    column: &str,
    row_number: usize,
    magnitude: &mut Magnitude,
    errors: &mut Vec<RowValidationError>,
) -> i64 {
    let raw = cell(row, idx);
    let problem = match normalize(raw) {
        Amount::Value(v) if !magnitude.add(v) => return v,
        Amount::Value(_) => RowProblem::OutOfRange,
        Amount::NotANumber if raw.is_blank() => return 0,
        Amount::NotANumber => RowProblem::NotANumber,
    };
    errors.push(RowValidationError {
        row: row_number,
        column: column.to_string(),
        value: raw.text(),
        problem,
    });
    0
}

/// Check the grid's columns and amounts and turn every data row into an [`EtbRow`].
///
/// All row errors are collected before failing. Rows are returned unfiltered.
pub fn validate(grid: &Grid) -> Result<Vec<EtbRow>> {
    let header = grid.first().ok_or(SchemaError::NoDataRows)?;
    let columns = ColumnMap::resolve(header)?;
    if grid.len() < 2 {
        return Err(SchemaError::NoDataRows.into());
    }
    debug!("resolved columns: {columns:?}");

    let mut errors = Vec::new();
    let mut rows = Vec::with_capacity(grid.len() - 1);
    let (mut cy_magnitude, mut py_magnitude) = (Magnitude::default(), Magnitude::default());
    for (i, raw) in grid.iter().enumerate().skip(1) {
        let row_number = i + 1;
        let current_year = amount_of(raw, columns.current_year, CURRENT_YEAR, row_number, &mut cy_magnitude, &mut errors);
        let prior_year = amount_of(raw, columns.prior_year, PRIOR_YEAR, row_number, &mut py_magnitude, &mut errors);

        let mut grouping: [Option<String>; 4] = Default::default();
        for ((slot, idx), name) in grouping.iter_mut().zip(columns.grouping).zip(GROUPING) {
            let Some(idx) = idx else { continue };
            let label = cell(raw, idx).text();
            if label.is_empty() {
                continue;
            }
            if !is_clean_label(&label) {
                errors.push(RowValidationError {
                    row: row_number,
                    column: name.to_string(),
                    value: label.clone(),
                    problem: RowProblem::ContainsSeparator,
                });
            }
            *slot = Some(label);
        }
        rows.push(EtbRow {
            code: cell(raw, columns.code).text(),
            account_name: cell(raw, columns.account_name).text(),
            current_year,
            prior_year,
            grouping,
            linked_files: Default::default(),
        });
    }

    if !errors.is_empty() {
        return Err(EtbError::RowValidation(errors));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| RawCell::from(*c)).collect())
            .collect()
    }

    const HEADER: &[&str] = &["Code", "Account Name", "Current Year", "Prior Year", "Grouping 1", "Grouping 2", "Grouping 3"];

    #[test]
    fn test_missing_columns_are_all_reported() {
        let g = grid(&[&["Code", "Name", "CY", "PY"], &["1", "Cash", "1", "2"]]);
        match validate(&g) {
            Err(EtbError::Schema(SchemaError::MissingColumns(missing))) => {
                assert!(missing.contains(&"Account Name".to_string()));
                assert!(missing.contains(&"Current Year".to_string()));
                assert!(missing.contains(&"Prior Year".to_string()));
                assert!(!missing.contains(&"Code".to_string()));
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn test_header_match_ignores_case_and_padding() {
        let g = grid(&[
            &["  code ", "ACCOUNT NAME", "current year", "Prior Year", "grouping 2"],
            &["1000", "Cash", "10", "5", "Current"],
        ]);
        let rows = validate(&g).unwrap();
        assert_eq!(rows[0].code, "1000");
        assert_eq!(rows[0].grouping[0], None);
        assert_eq!(rows[0].grouping[1].as_deref(), Some("Current"));
    }

    #[test]
    fn test_header_only_is_no_data_rows() {
        let g = grid(&[HEADER]);
        assert!(matches!(validate(&g), Err(EtbError::Schema(SchemaError::NoDataRows))));
    }

    #[test]
    fn test_rows_are_normalized() {
        let g = grid(&[
            HEADER,
            &["1000", "Cash", "(55,662)", "42,127", "Assets", "Current", "Cash"],
            &["2000", "Loan", "", "-300.5", "Liabilities"],
        ]);
        let rows = validate(&g).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].current_year, 55662);
        assert_eq!(rows[0].prior_year, 42127);
        assert_eq!(rows[0].grouping_labels(), vec!["Assets", "Current", "Cash"]);
        assert_eq!(rows[1].current_year, 0);
        assert_eq!(rows[1].prior_year, -301);
        assert_eq!(rows[1].grouping[1], None);
    }

    #[test]
    fn test_bad_amount_rejects_whole_upload() {
        let g = grid(&[
            HEADER,
            &["1000", "Cash", "N/A", "0"],
            &["2000", "Bank", "500", "400"],
        ]);
        match validate(&g) {
            Err(EtbError::RowValidation(errors)) => {
                assert_eq!(
                    errors,
                    vec![RowValidationError {
                        row: 2,
                        column: "Current Year".into(),
                        value: "N/A".into(),
                        problem: RowProblem::NotANumber,
                    }]
                );
            }
            other => panic!("expected row validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_row_errors_are_collected() {
        let g = grid(&[
            HEADER,
            &["1", "A", "abc", "def"],
            &["2", "B", "1", "2"],
            &["3", "C", "1", "x1"],
        ]);
        let Err(EtbError::RowValidation(errors)) = validate(&g) else {
            panic!("expected row validation error");
        };
        let rows: Vec<(usize, &str)> = errors.iter().map(|e| (e.row, e.column.as_str())).collect();
        assert_eq!(rows, vec![(2, "Current Year"), (2, "Prior Year"), (4, "Prior Year")]);
    }

    #[test]
    fn test_label_containing_separator_is_rejected() {
        let g = grid(&[
            HEADER,
            &["1000", "Cash", "1", "1", "Assets", "Current > Cash", "Bank"],
            &["1100", "Float", "1", "1", "Assets", "Current", "Cash>Till"],
        ]);
        let Err(EtbError::RowValidation(errors)) = validate(&g) else {
            panic!("expected row validation error");
        };
        assert_eq!(
            errors,
            vec![RowValidationError {
                row: 2,
                column: "Grouping 2".into(),
                value: "Current > Cash".into(),
                problem: RowProblem::ContainsSeparator,
            }]
        );
    }

    #[test]
    fn test_column_total_out_of_range_is_rejected() {
        let big = i64::MAX.to_string();
        let g = grid(&[
            HEADER,
            &["1", "A", big.as_str(), "1"],
            &["2", "B", "-1", "1"],
            &["3", "C", "5", "1"],
        ]);
        let Err(EtbError::RowValidation(errors)) = validate(&g) else {
            panic!("expected row validation error");
        };
        let rows: Vec<(usize, &str, RowProblem)> =
            errors.iter().map(|e| (e.row, e.column.as_str(), e.problem)).collect();
        assert_eq!(rows, vec![(3, "Current Year", RowProblem::OutOfRange)]);

        let max = grid(&[HEADER, &["1", "A", big.as_str(), "0"]]);
        assert_eq!(validate(&max).unwrap()[0].current_year, i64::MAX);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let g = grid(&[HEADER, &["1000"]]);
        let rows = validate(&g).unwrap();
        assert_eq!(rows[0].account_name, "");
        assert_eq!(rows[0].current_year, 0);
        assert!(rows[0].grouping_labels().is_empty());
    }
}
