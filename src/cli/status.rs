use crate::cli::open_db;
use crate::db::list_engagements;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::Settings;

pub fn run() -> Result<()> {
    let settings = Settings::load()?;
    let db_path = settings.db_path();

    println!("Data dir:      {}", settings.data_dir.display());
    println!("Database:      {}", db_path.display());
    println!("Lock timeout:  {} ms", settings.lock_timeout_ms);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:       {}", format_bytes(size));

        let conn = open_db(&settings)?;
        let engagements = list_engagements(&conn)?;
        let uploaded = engagements.iter().filter(|e| e.upload.is_some()).count();
        let rows: i64 = engagements
            .iter()
            .filter_map(|e| e.upload.as_ref().map(|u| u.row_count))
            .sum();

        println!();
        println!("Engagements:   {}", engagements.len());
        println!("Uploaded:      {uploaded}");
        println!("Rows:          {rows}");

        for e in engagements.iter() {
            if let Some(u) = &e.upload {
                println!(
                    "  {}: {} [{}] {} rows, uploaded {} (sha256 {})",
                    e.name,
                    u.filename,
                    u.file_kind,
                    u.row_count,
                    u.uploaded_at,
                    &u.checksum[..u.checksum.len().min(12)]
                );
            }
        }
    } else {
        println!();
        println!("Database not found. Run `etb init` to set up.");
    }

    Ok(())
}
