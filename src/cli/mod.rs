pub mod classifications;
pub mod engagement;
pub mod export;
pub mod import;
pub mod init;
pub mod link;
pub mod report;
pub mod status;

use std::time::Duration;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::dataset::TrialBalanceDataset;
use crate::db::{get_connection, load_dataset};
use crate::error::{EtbError, Result};
use crate::settings::Settings;

/// Open the configured database with the upload lock timeout applied.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let path = settings.db_path();
    if !path.exists() {
        return Err(EtbError::Settings(format!(
            "No database found at {}\nRun `etb init` to create one.",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    conn.busy_timeout(Duration::from_millis(settings.lock_timeout_ms))?;
    Ok(conn)
}

pub(crate) fn committed_dataset(conn: &Connection, engagement: &str) -> Result<TrialBalanceDataset> {
    load_dataset(conn, engagement)?.ok_or_else(|| {
        EtbError::Other(format!(
            "No trial balance uploaded for '{engagement}'. Run `etb import <file> --engagement \"{engagement}\"` first."
        ))
    })
}

#[derive(Parser)]
#[command(name = "etb", about = "Extended trial balance ingestion and statement rollup for audit engagements.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for etb data (default: ~/Documents/etb)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage engagements.
    Engagement {
        #[command(subcommand)]
        command: EngagementCommands,
    },
    /// Upload a CSV/XLSX trial balance, replacing the engagement's current one.
    Import {
        /// Path to the CSV or XLSX file
        file: String,
        /// Engagement to upload into
        #[arg(long)]
        engagement: String,
        /// File kind: csv or xlsx (default: from the file extension)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Browse selectable classifications with their totals.
    Classifications {
        #[arg(long)]
        engagement: String,
    },
    /// Show statements and rows.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export statements to CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Link a library file to every account with the given code.
    Link {
        #[arg(long)]
        engagement: String,
        /// Account code
        #[arg(long)]
        code: String,
        /// File reference from the engagement library
        #[arg(long)]
        file: String,
    },
    /// Remove a file link from every account with the given code.
    Unlink {
        #[arg(long)]
        engagement: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        file: String,
    },
    /// Show the current database and engagement summary.
    Status,
}

#[derive(Subcommand)]
pub enum EngagementCommands {
    /// Add a new engagement.
    Add {
        /// Engagement name, e.g. 'Acme FY24'
        name: String,
        /// Client name
        #[arg(long)]
        client: Option<String>,
    },
    /// List engagements and their current uploads.
    List,
    /// Delete an engagement and its trial balance.
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Balance sheet, current and prior year.
    BalanceSheet {
        #[arg(long)]
        engagement: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Income statement, current and prior year.
    IncomeStatement {
        #[arg(long)]
        engagement: String,
        #[arg(long)]
        json: bool,
    },
    /// All committed rows.
    Rows {
        #[arg(long)]
        engagement: String,
        /// Only rows without any grouping
        #[arg(long, conflicts_with = "classification")]
        unclassified: bool,
        /// Only rows at or beneath a classification, e.g. "Assets > Current"
        #[arg(long)]
        classification: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export the balance sheet to CSV.
    BalanceSheet {
        #[arg(long)]
        engagement: String,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
    },
    /// Export the income statement to CSV.
    IncomeStatement {
        #[arg(long)]
        engagement: String,
        #[arg(long)]
        output: Option<String>,
    },
}
