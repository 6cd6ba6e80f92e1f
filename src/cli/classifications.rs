use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{committed_dataset, open_db};
use crate::error::Result;
use crate::fmt::amount;
use crate::models::Period;
use crate::rollup::total;
use crate::settings::Settings;

pub fn run(engagement: &str) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    let dataset = committed_dataset(&conn, engagement)?;
    let tree = dataset.tree();
    if tree.is_empty() {
        println!("No classified rows in {engagement}.");
        return Ok(());
    }
    let groups = tree.navigation();

    if groups.is_empty() {
        println!("No selectable classifications (leaves need at least three grouping levels).");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Classification", "Accounts", "Current Year", "Prior Year"]);
    for group in &groups {
        table.add_row(vec![
            Cell::new(group.label.to_uppercase().bold()),
            Cell::new(""),
            Cell::new(amount(total(&dataset, group.node, Period::CurrentYear)).bold()),
            Cell::new(amount(total(&dataset, group.node, Period::PriorYear)).bold()),
        ]);
        for section in &group.sections {
            table.add_row(vec![
                Cell::new(format!("  {}", section.label).bold()),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]);
            for &leaf in &section.leaves {
                let node = tree.node(leaf);
                let label = node.path.segments()[2..].join(" > ");
                table.add_row(vec![
                    Cell::new(format!("    {label}")),
                    Cell::new(node.direct_rows.len()),
                    Cell::new(amount(total(&dataset, leaf, Period::CurrentYear))),
                    Cell::new(amount(total(&dataset, leaf, Period::PriorYear))),
                ]);
            }
        }
    }
    println!("Classifications — {engagement}\n{table}");
    Ok(())
}
