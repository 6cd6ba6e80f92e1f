use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{add_engagement, delete_engagement, list_engagements};
use crate::error::Result;
use crate::settings::Settings;

pub fn add(name: &str, client: Option<&str>) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    add_engagement(&conn, name, client)?;
    println!("Added engagement: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    let engagements = list_engagements(&conn)?;
    if engagements.is_empty() {
        println!("No engagements. Add one with `etb engagement add <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Engagement", "Client", "Trial Balance", "Rows", "Uploaded"]);
    for e in engagements {
        let (file, rows, uploaded) = match e.upload {
            Some(u) => (u.filename, u.row_count.to_string(), u.uploaded_at),
            None => ("—".to_string(), String::new(), String::new()),
        };
        table.add_row(vec![
            Cell::new(e.name),
            Cell::new(e.client.unwrap_or_default()),
            Cell::new(file),
            Cell::new(rows),
            Cell::new(uploaded),
        ]);
    }
    println!("Engagements\n{table}");
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    delete_engagement(&conn, name)?;
    println!("Deleted engagement: {name}");
    Ok(())
}
