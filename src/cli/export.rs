use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::{committed_dataset, open_db};
use crate::error::Result;
use crate::models::Period;
use crate::rollup::{self, side_by_side, ComparativeSection};
use crate::settings::Settings;

const HEADER: [&str; 5] = ["Statement", "Section", "Line", "Current Year", "Prior Year"];

fn default_path(settings: &Settings, name: &str, engagement: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let slug: String = engagement
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    settings
        .exports_dir()
        .join(format!("{name}-{}-{date}.csv", slug.trim_matches('-')))
}

/// One statement block: its sections followed by a grand total row.
struct Block<'a> {
    statement: &'a str,
    sections: Vec<ComparativeSection>,
    total_label: String,
    current_total: i64,
    prior_total: i64,
}

fn write_blocks<W: Write>(out: W, blocks: &[Block], trailer: Option<(&str, i64, i64)>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for block in blocks {
        for section in &block.sections {
            for line in &section.lines {
                wtr.write_record([
                    block.statement,
                    section.name.as_str(),
                    line.label.as_str(),
                    line.current.to_string().as_str(),
                    line.prior.to_string().as_str(),
                ])?;
            }
            wtr.write_record([
                block.statement,
                section.name.as_str(),
                format!("Total {}", section.name).as_str(),
                section.current_total.to_string().as_str(),
                section.prior_total.to_string().as_str(),
            ])?;
        }
        wtr.write_record([
            block.statement,
            "",
            block.total_label.as_str(),
            block.current_total.to_string().as_str(),
            block.prior_total.to_string().as_str(),
        ])?;
    }
    if let Some((label, cy, py)) = trailer {
        wtr.write_record(["", "", label, cy.to_string().as_str(), py.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_file(path: &Path, blocks: &[Block], trailer: Option<(&str, i64, i64)>) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_blocks(file, blocks, trailer)?;
    let display = format!("{}", path.display());
    println!("Wrote {display}");
    Ok(display)
}

pub fn balance_sheet(engagement: &str, output: Option<String>) -> Result<String> {
    let settings = Settings::load()?;
    let conn = open_db(&settings)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let labels = &settings.labels;
    let cy = rollup::balance_sheet(&dataset, labels, Period::CurrentYear);
    let py = rollup::balance_sheet(&dataset, labels, Period::PriorYear);

    let blocks = [
        Block {
            statement: labels.assets.as_str(),
            sections: side_by_side(&cy.assets, &py.assets),
            total_label: format!("Total {}", labels.assets),
            current_total: cy.total_assets,
            prior_total: py.total_assets,
        },
        Block {
            statement: labels.liabilities.as_str(),
            sections: side_by_side(&cy.liabilities, &py.liabilities),
            total_label: format!("Total {}", labels.liabilities),
            current_total: cy.total_liabilities,
            prior_total: py.total_liabilities,
        },
        Block {
            statement: labels.equity.as_str(),
            sections: side_by_side(&cy.equity, &py.equity),
            total_label: format!("Total {}", labels.equity),
            current_total: cy.total_equity,
            prior_total: py.total_equity,
        },
    ];
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&settings, "balance-sheet", engagement));
    write_file(&path, &blocks, None)
}

pub fn income_statement(engagement: &str, output: Option<String>) -> Result<String> {
    let settings = Settings::load()?;
    let conn = open_db(&settings)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let cy = rollup::income_statement(&dataset, &settings.labels, Period::CurrentYear);
    let py = rollup::income_statement(&dataset, &settings.labels, Period::PriorYear);

    let blocks = [
        Block {
            statement: "Revenue",
            sections: side_by_side(&cy.revenue, &py.revenue),
            total_label: "Total Revenue".to_string(),
            current_total: cy.total_revenue,
            prior_total: py.total_revenue,
        },
        Block {
            statement: "Expenses",
            sections: side_by_side(&cy.expenses, &py.expenses),
            total_label: "Total Expenses".to_string(),
            current_total: cy.total_expenses,
            prior_total: py.total_expenses,
        },
    ];
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&settings, "income-statement", engagement));
    write_file(&path, &blocks, Some(("Net Result", cy.net_result, py.net_result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrialBalanceDataset;
    use crate::models::row;
    use crate::rollup::StatementLabels;

    #[test]
    fn test_balance_sheet_csv_rows() {
        let ds = TrialBalanceDataset::new(vec![
            row("1000", "Cash", 100, 80, &["Assets", "Current", "Cash"]),
            row("1100", "Debtors", 50, 20, &["Assets", "Current", "Receivables"]),
            row("2000", "Creditors", 150, 100, &["Liabilities", "Current", "Payables"]),
        ]);
        let labels = StatementLabels::default();
        let cy = rollup::balance_sheet(&ds, &labels, Period::CurrentYear);
        let py = rollup::balance_sheet(&ds, &labels, Period::PriorYear);
        let blocks = [Block {
            statement: "Assets",
            sections: side_by_side(&cy.assets, &py.assets),
            total_label: "Total Assets".to_string(),
            current_total: cy.total_assets,
            prior_total: py.total_assets,
        }];

        let mut buf = Vec::new();
        write_blocks(&mut buf, &blocks, None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Statement,Section,Line,Current Year,Prior Year");
        assert!(lines.contains(&"Assets,Current Assets,Cash,100,80"));
        assert!(lines.contains(&"Assets,Current Assets,Total Current Assets,150,100"));
        assert_eq!(*lines.last().unwrap(), "Assets,,Total Assets,150,100");
    }

    #[test]
    fn test_trailer_row_written_last() {
        let blocks = [Block {
            statement: "Revenue",
            sections: vec![],
            total_label: "Total Revenue".to_string(),
            current_total: 0,
            prior_total: 0,
        }];
        let mut buf = Vec::new();
        write_blocks(&mut buf, &blocks, Some(("Net Result", -5, 7))).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().last(), Some(",,Net Result,-5,7"));
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let written = write_file(&path, &[], None).unwrap();
        assert_eq!(written, path.display().to_string());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Statement,Section"));
    }
}
