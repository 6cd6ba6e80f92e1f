use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{committed_dataset, open_db};
use crate::classify::ClassificationPath;
use crate::error::{EtbError, Result};
use crate::fmt::amount;
use crate::models::Period;
use crate::rollup::{self, side_by_side, ComparativeSection};
use crate::settings::Settings;

fn print_json(value: &serde_json::Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| EtbError::Other(e.to_string()))?;
    println!("{out}");
    Ok(())
}

fn blank_row(table: &mut Table) {
    table.add_row(vec![Cell::new(""), Cell::new(""), Cell::new("")]);
}

fn add_sections(table: &mut Table, sections: &[ComparativeSection]) {
    for section in sections {
        table.add_row(vec![Cell::new(format!("  {}", section.name).bold()), Cell::new(""), Cell::new("")]);
        for line in &section.lines {
            table.add_row(vec![
                Cell::new(format!("    {}", line.label)),
                Cell::new(amount(line.current)),
                Cell::new(amount(line.prior)),
            ]);
        }
        table.add_row(vec![
            Cell::new(format!("  Total {}", section.name)),
            Cell::new(amount(section.current_total)),
            Cell::new(amount(section.prior_total)),
        ]);
    }
}

pub fn balance_sheet(engagement: &str, json: bool) -> Result<()> {
    let settings = Settings::load()?;
    let conn = open_db(&settings)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let cy = rollup::balance_sheet(&dataset, &settings.labels, Period::CurrentYear);
    let py = rollup::balance_sheet(&dataset, &settings.labels, Period::PriorYear);

    if json {
        return print_json(&serde_json::json!({ "current_year": cy, "prior_year": py }));
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Current Year", "Prior Year"]);
    let categories = [
        (&settings.labels.assets, &cy.assets, &py.assets, cy.total_assets, py.total_assets),
        (&settings.labels.liabilities, &cy.liabilities, &py.liabilities, cy.total_liabilities, py.total_liabilities),
        (&settings.labels.equity, &cy.equity, &py.equity, cy.total_equity, py.total_equity),
    ];
    for (label, current, prior, current_total, prior_total) in categories {
        table.add_row(vec![Cell::new(label.to_uppercase().bold()), Cell::new(""), Cell::new("")]);
        add_sections(&mut table, &side_by_side(current, prior));
        table.add_row(vec![
            Cell::new(format!("Total {label}").bold()),
            Cell::new(amount(current_total)),
            Cell::new(amount(prior_total)),
        ]);
        blank_row(&mut table);
    }
    println!("Balance Sheet — {engagement}\n{table}");

    for w in cy.warning.iter().chain(py.warning.iter()) {
        println!("{} {w}", "Warning:".yellow().bold());
    }
    Ok(())
}

pub fn income_statement(engagement: &str, json: bool) -> Result<()> {
    let settings = Settings::load()?;
    let conn = open_db(&settings)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let cy = rollup::income_statement(&dataset, &settings.labels, Period::CurrentYear);
    let py = rollup::income_statement(&dataset, &settings.labels, Period::PriorYear);

    if json {
        return print_json(&serde_json::json!({ "current_year": cy, "prior_year": py }));
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Current Year", "Prior Year"]);
    table.add_row(vec![Cell::new("REVENUE".green().bold()), Cell::new(""), Cell::new("")]);
    add_sections(&mut table, &side_by_side(&cy.revenue, &py.revenue));
    table.add_row(vec![
        Cell::new("Total Revenue".bold()),
        Cell::new(amount(cy.total_revenue)),
        Cell::new(amount(py.total_revenue)),
    ]);
    blank_row(&mut table);
    table.add_row(vec![Cell::new("EXPENSES".red().bold()), Cell::new(""), Cell::new("")]);
    add_sections(&mut table, &side_by_side(&cy.expenses, &py.expenses));
    table.add_row(vec![
        Cell::new("Total Expenses".bold()),
        Cell::new(amount(cy.total_expenses)),
        Cell::new(amount(py.total_expenses)),
    ]);
    blank_row(&mut table);

    let net_label = if cy.net_result >= 0 {
        "NET RESULT".green().bold()
    } else {
        "NET RESULT".red().bold()
    };
    table.add_row(vec![
        Cell::new(net_label),
        Cell::new(amount(cy.net_result)),
        Cell::new(amount(py.net_result)),
    ]);
    println!("Income Statement — {engagement}\n{table}");
    Ok(())
}

pub fn rows(engagement: &str, unclassified: bool, classification: Option<&str>, json: bool) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let rows: Vec<_> = match classification {
        Some(path) => {
            let id = dataset
                .tree()
                .find_str(path)
                .ok_or_else(|| EtbError::Other(format!("Unknown classification: {path}")))?;
            dataset.subtree_rows(id)
        }
        None if unclassified => dataset.unclassified_rows().collect(),
        None => dataset.rows().iter().collect(),
    };

    if json {
        return print_json(&serde_json::json!(rows));
    }
    if rows.is_empty() {
        println!("No rows found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Account Name", "Classification", "Current Year", "Prior Year", "Files"]);
    for r in &rows {
        let path = ClassificationPath::from_row(r).map_or_else(|| "—".to_string(), |p| p.to_string());
        let files: Vec<String> = r.linked_files.iter().map(|f| f.to_string()).collect();
        table.add_row(vec![
            Cell::new(&r.code),
            Cell::new(&r.account_name),
            Cell::new(path),
            Cell::new(amount(r.current_year)),
            Cell::new(amount(r.prior_year)),
            Cell::new(files.join(", ")),
        ]);
    }
    let cy: i64 = rows.iter().map(|r| r.current_year).sum();
    let py: i64 = rows.iter().map(|r| r.prior_year).sum();
    println!(
        "Trial Balance — {engagement} ({} rows, current year {}, prior year {})\n{table}",
        rows.len(),
        amount(cy),
        amount(py)
    );
    Ok(())
}
