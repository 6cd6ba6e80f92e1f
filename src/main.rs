mod classify;
mod cli;
mod dataset;
mod db;
mod error;
mod filter;
mod fmt;
mod models;
mod normalize;
mod pipeline;
mod rollup;
mod schema;
mod settings;
mod tabular;

use clap::Parser;

use cli::{Cli, Commands, EngagementCommands, ExportCommands, ReportCommands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Engagement { command } => match command {
            EngagementCommands::Add { name, client } => cli::engagement::add(&name, client.as_deref()),
            EngagementCommands::List => cli::engagement::list(),
            EngagementCommands::Delete { name } => cli::engagement::delete(&name),
        },
        Commands::Import {
            file,
            engagement,
            kind,
        } => cli::import::run(&file, &engagement, kind.as_deref()),
        Commands::Classifications { engagement } => cli::classifications::run(&engagement),
        Commands::Report { command } => match command {
            ReportCommands::BalanceSheet { engagement, json } => cli::report::balance_sheet(&engagement, json),
            ReportCommands::IncomeStatement { engagement, json } => {
                cli::report::income_statement(&engagement, json)
            }
            ReportCommands::Rows {
                engagement,
                unclassified,
                classification,
                json,
            } => cli::report::rows(&engagement, unclassified, classification.as_deref(), json),
        },
        Commands::Export { command } => match command {
            ExportCommands::BalanceSheet { engagement, output } => {
                cli::export::balance_sheet(&engagement, output).map(|_| ())
            }
            ExportCommands::IncomeStatement { engagement, output } => {
                cli::export::income_statement(&engagement, output).map(|_| ())
            }
        },
        Commands::Link {
            engagement,
            code,
            file,
        } => cli::link::link(&engagement, &code, &file),
        Commands::Unlink {
            engagement,
            code,
            file,
        } => cli::link::unlink(&engagement, &code, &file),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
