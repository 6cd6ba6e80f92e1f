use log::debug;

use crate::error::{EtbError, Result};
use crate::models::EtbRow;

/// Drop rows with no code, no account name and a zero current-year amount.
///
/// Fails with [`EtbError::EmptyResult`] when nothing survives.
pub fn filter_rows(rows: Vec<EtbRow>) -> Result<Vec<EtbRow>> {
    let before = rows.len();
    let kept: Vec<EtbRow> = rows.into_iter().filter(|r| !r.is_empty()).collect();
    debug!("row filter kept {} of {} rows", kept.len(), before);
    if kept.is_empty() {
        return Err(EtbError::EmptyResult);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row;

    #[test]
    fn test_drops_rows_without_information() {
        let rows = vec![
            row("1000", "Cash", 10, 0, &[]),
            row("", "", 0, 0, &[]),
            row("", "", 0, 999, &["Assets"]),
            row("", "Suspense", 0, 0, &[]),
            row("", "", -5, 0, &[]),
        ];
        let kept = filter_rows(rows).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| !r.code.is_empty() || !r.account_name.is_empty() || r.current_year != 0));
    }

    #[test]
    fn test_everything_filtered_is_an_error() {
        let rows = vec![row("", "", 0, 0, &[]), row("", "", 0, 12, &[])];
        assert!(matches!(filter_rows(rows), Err(EtbError::EmptyResult)));
    }
}
