use crate::cli::open_db;
use crate::db::{link_file, unlink_file};
use crate::error::Result;
use crate::models::FileRef;
use crate::settings::Settings;

pub fn link(engagement: &str, code: &str, file: &str) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    let n = link_file(&conn, engagement, code, &FileRef(file.to_string()))?;
    if n == 0 {
        println!("'{file}' was already linked to {code}");
    } else {
        println!("Linked '{file}' to {n} row(s) with code {code}");
    }
    Ok(())
}

pub fn unlink(engagement: &str, code: &str, file: &str) -> Result<()> {
    let conn = open_db(&Settings::load()?)?;
    let n = unlink_file(&conn, engagement, code, &FileRef(file.to_string()))?;
    println!("Removed '{file}' from {n} row(s) with code {code}");
    Ok(())
}
