pub mod record;
pub mod report;
pub mod transfer;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use record::{process_delete_command, process_record_command, process_show_command, RecordCommand};
use report::{
    process_history_command, process_summary_command, process_trend_command, HistoryCommand,
    TrendCommand,
};
use tracing::level_filters::LevelFilter;
use transfer::{
    process_export_command, process_import_command, process_template_command, ExportCommand,
    ImportCommand, TemplateCommand,
};

use crate::{
    config::TrackerConfig,
    storage::history_store::FileHistoryStore,
    tracking::session::TrackingSession,
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        time::parse_cli_date,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Teamhours", version, long_about = None)]
#[command(about = "Daily hours and goal tracking for a small team", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Record the hours of a day. Replaces the day if it was already recorded")]
    Record {
        #[command(flatten)]
        command: RecordCommand,
    },
    #[command(about = "Delete a recorded day")]
    Delete {
        #[arg(help = "Day to delete, e.g. \"yesterday\" or \"15/03/2025\"")]
        date: String,
    },
    #[command(about = "Show every person of a recorded day")]
    Show {
        #[arg(help = "Day to show, e.g. \"today\" or \"15/03/2025\"")]
        date: String,
    },
    #[command(about = "List recorded days, newest first")]
    History {
        #[command(flatten)]
        command: HistoryCommand,
    },
    #[command(about = "Import days from a tab or comma separated file")]
    Import {
        #[command(flatten)]
        command: ImportCommand,
    },
    #[command(about = "Export the whole history as a tab separated report")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
    #[command(about = "Days of the last week, oldest first")]
    Trend {
        #[command(flatten)]
        command: TrendCommand,
    },
    #[command(about = "Weekly and monthly averages against the team target")]
    Summary {},
    #[command(about = "Print a file that can be filled in and imported")]
    Template {
        #[command(flatten)]
        command: TemplateCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let config = TrackerConfig::load_or_create(&dir)?;
    let mut session = TrackingSession::open(FileHistoryStore::in_dir(&dir)).await?;

    match args.commands {
        Commands::Record { command } => {
            process_record_command(command, &config, &mut session).await
        }
        Commands::Delete { date } => process_delete_command(&date, &mut session).await,
        Commands::Show { date } => process_show_command(&date, &session),
        Commands::History { command } => process_history_command(command, session.history()),
        Commands::Import { command } => {
            process_import_command(command, &config, &mut session).await
        }
        Commands::Export { command } => process_export_command(command, &session).await,
        Commands::Trend { command } => {
            process_trend_command(command, session.history(), &DefaultClock)
        }
        Commands::Summary {} => process_summary_command(session.history(), &DefaultClock),
        Commands::Template { command } => process_template_command(command, &config).await,
    }
}

/// Date given on the command line, today when missing.
fn resolve_date(value: Option<&str>) -> Result<NaiveDate> {
    let Some(value) = value else {
        return Ok(DefaultClock.today());
    };
    parse_cli_date(value).map_err(|e| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()
    })
}
