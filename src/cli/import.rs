use std::path::Path;

use colored::Colorize;

use crate::cli::open_db;
use crate::db::upload_info;
use crate::error::Result;
use crate::pipeline::{checksum, commit_upload};
use crate::settings::Settings;
use crate::tabular::FileKind;

pub fn run(file: &str, engagement: &str, kind: Option<&str>) -> Result<()> {
    let settings = Settings::load()?;
    let path = Path::new(file);
    let kind = match kind {
        Some(k) => FileKind::from_key(k)?,
        None => FileKind::from_path(path)?,
    };
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);

    let mut conn = open_db(&settings)?;
    let previous = upload_info(&conn, engagement)?;
    let result = commit_upload(&mut conn, engagement, filename, &bytes, kind, &settings.labels)?;

    if let Some(prev) = previous.filter(|p| p.checksum == checksum(&bytes)) {
        println!(
            "{} file is identical to the previous upload ({}, {})",
            "Note:".cyan(),
            prev.filename,
            prev.uploaded_at
        );
    }

    println!(
        "{} rows committed to '{engagement}' ({} previous rows replaced)",
        result.rows, result.replaced
    );
    if result.unclassified > 0 {
        println!("{} rows have no classification", result.unclassified);
    }
    for w in &result.warnings {
        println!("{} {w}", "Warning:".yellow().bold());
    }
    Ok(())
}
