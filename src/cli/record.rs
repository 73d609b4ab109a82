use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::info;

use crate::{
    config::TrackerConfig,
    storage::history_store::PersistenceStore,
    tracking::{
        entities::{DailyRecord, EmployeeHours},
        session::TrackingSession,
    },
    utils::{
        duration::{format_time_input, is_valid_duration},
        percentage::{display, PerformanceBand},
        time::display_date,
    },
};

use super::resolve_date;

#[derive(Debug, Parser)]
pub struct RecordCommand {
    #[arg(
        long,
        short,
        help = "Day being recorded. Examples are \"yesterday\", \"15/03/2025\", \"2025-03-15\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(
        required = true,
        help = "Hours per person as NAME=H:MM or NAME=H:MM/GOAL. \"0830\" is read as 08:30. Team members that are left out are saved without hours"
    )]
    hours: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HoursArg {
    name: String,
    hours: String,
    goal: Option<String>,
}

/// Parses `NAME=H:MM[/GOAL]`. Hours typed without a colon go through the same normalization as
/// the entry form.
fn parse_hours_arg(value: &str) -> Result<HoursArg> {
    let (name, rest) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=H:MM, got {value:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Missing name in {value:?}"));
    }
    let (hours, goal) = match rest.split_once('/') {
        Some((hours, goal)) => (hours.trim(), Some(goal.trim().to_string())),
        None => (rest.trim(), None),
    };
    let hours = if hours.contains(':') {
        hours.to_string()
    } else {
        format_time_input(hours)
    };
    if let Some(goal) = &goal {
        if !is_valid_duration(goal) {
            return Err(anyhow!("Goal {goal:?} of {name} should look like H:MM"));
        }
    }
    Ok(HoursArg {
        name: name.to_string(),
        hours,
        goal,
    })
}

/// Team members keep their position, people outside of the team are appended in the order they
/// were given.
fn build_day(config: &TrackerConfig, args: Vec<HoursArg>) -> Vec<EmployeeHours> {
    let mut day = config.blank_day();
    for arg in args {
        match day.iter_mut().find(|v| v.name == arg.name) {
            Some(entry) => {
                entry.hours_worked = arg.hours;
                if let Some(goal) = arg.goal {
                    entry.daily_goal = goal;
                }
            }
            None => {
                let goal = arg
                    .goal
                    .unwrap_or_else(|| config.goal_for(&arg.name).to_string());
                day.push(EmployeeHours::new(arg.name, arg.hours, goal));
            }
        }
    }
    day
}

pub async fn process_record_command(
    RecordCommand { date, hours }: RecordCommand,
    config: &TrackerConfig,
    session: &mut TrackingSession<impl PersistenceStore>,
) -> Result<()> {
    let date = resolve_date(date.as_deref())?;
    let args = hours
        .iter()
        .map(|v| parse_hours_arg(v))
        .collect::<Result<Vec<_>>>()?;
    let day = build_day(config, args);

    let record = session.record_day(date, &day).await?;
    info!("Recorded {} entries for {date}", record.employees.len());
    for line in day_lines(&record) {
        println!("{line}");
    }
    Ok(())
}

pub async fn process_delete_command(
    date: &str,
    session: &mut TrackingSession<impl PersistenceStore>,
) -> Result<()> {
    let date = resolve_date(Some(date))?;
    if session.delete(date).await? {
        println!("Deleted {}", display_date(date));
    } else {
        println!("Nothing recorded for {}", display_date(date));
    }
    Ok(())
}

pub fn process_show_command(
    date: &str,
    session: &TrackingSession<impl PersistenceStore>,
) -> Result<()> {
    let date = resolve_date(Some(date))?;
    match session.history().find(date) {
        Some(record) => {
            for line in day_lines(record) {
                println!("{line}");
            }
        }
        None => println!("Nothing recorded for {}", display_date(date)),
    }
    Ok(())
}

/// Header line with the day averages followed by one line per person.
fn day_lines(record: &DailyRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "{}\t{}%\t{}\t{}",
        display_date(record.date),
        display(record.average_percentage),
        record.average_time,
        if record.goal_met() {
            "goal met"
        } else {
            "goal missed"
        }
    )];
    lines.extend(record.employees.iter().map(|entry| {
        format!(
            "{}\t{}\t{}\t{}%\t{}",
            entry.name,
            if entry.hours_worked.is_empty() {
                "-"
            } else {
                &entry.hours_worked
            },
            entry.daily_goal,
            display(entry.percentage),
            PerformanceBand::of(entry.percentage)
        )
    }));
    lines
}
