use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    config::TrackerConfig,
    storage::history_store::PersistenceStore,
    tracking::{
        export::{export_file_name, import_template, serialize},
        import::SkipCounts,
        session::{ImportSummary, SessionError, TrackingSession},
    },
    utils::{
        clock::{Clock, DefaultClock},
        duration::is_valid_duration,
    },
};

use super::resolve_date;

#[derive(Debug, Parser)]
pub struct ImportCommand {
    #[arg(help = "Tab or comma separated file with a header and date, name, hours[, goal] rows")]
    file: PathBuf,
    #[arg(long, help = "Goal for rows without one. Defaults to the configured default goal")]
    default_goal: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ExportCommand {
    #[arg(
        long,
        short,
        help = "Where to write the report. Defaults to relatorio_horas_<today>.tsv in the current directory"
    )]
    output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct TemplateCommand {
    #[arg(long, short, help = "Day used in the template rows. Defaults to today")]
    date: Option<String>,
    #[arg(long, short, help = "Where to write the template. Printed to stdout when missing")]
    output: Option<PathBuf>,
}

pub async fn process_import_command(
    ImportCommand { file, default_goal }: ImportCommand,
    config: &TrackerConfig,
    session: &mut TrackingSession<impl PersistenceStore>,
) -> Result<()> {
    let default_goal = default_goal.unwrap_or_else(|| config.default_goal.clone());
    if !is_valid_duration(&default_goal) {
        bail!("Default goal {default_goal:?} should look like H:MM");
    }

    match session.import_file(&file, &default_goal).await {
        Ok(summary) => {
            println!("{}", import_summary_line(&summary));
            Ok(())
        }
        Err(SessionError::Import(e)) => {
            println!("Nothing imported: {e}");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to import {file:?}")),
    }
}

fn import_summary_line(summary: &ImportSummary) -> String {
    let mut line = format!(
        "{} day(s) imported from {} row(s)",
        summary.days_imported, summary.valid_rows
    );
    let SkipCounts {
        too_few_fields,
        invalid_date,
        invalid_duration,
    } = summary.skipped;
    if summary.skipped.total() > 0 {
        line.push_str(&format!(
            ", skipped {} row(s): {too_few_fields} incomplete, {invalid_date} bad date, {invalid_duration} bad hours",
            summary.skipped.total()
        ));
    }
    line
}

pub async fn process_export_command(
    ExportCommand { output }: ExportCommand,
    session: &TrackingSession<impl PersistenceStore>,
) -> Result<()> {
    if session.history().is_empty() {
        println!("Nothing to export");
        return Ok(());
    }
    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(DefaultClock.today())));
    write_output(&path, &serialize(session.history())).await?;
    println!("Exported {} day(s) into {}", session.history().len(), path.display());
    Ok(())
}

pub async fn process_template_command(
    TemplateCommand { date, output }: TemplateCommand,
    config: &TrackerConfig,
) -> Result<()> {
    let date = resolve_date(date.as_deref())?;
    let template = import_template(&config.team, date);
    match output {
        Some(path) => {
            write_output(&path, &template).await?;
            println!("Template written into {}", path.display());
        }
        None => print!("{template}"),
    }
    Ok(())
}

async fn write_output(path: &Path, content: &str) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {path:?}"))?;
    info!("Wrote {} byte(s) into {path:?}", content.len());
    Ok(())
}
