use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use crate::{
    tracking::{entities::DailyRecord, export::goal_met_text, history::HistoryRepository},
    utils::{
        clock::Clock,
        percentage::{display, goal_gap, Percentage},
        time::display_date,
    },
};

#[derive(Debug, Parser)]
pub struct HistoryCommand {
    #[arg(
        short = 'b',
        long = "below",
        help = "Only list days with an average below this percentage, e.g. 90 or 87,5"
    )]
    below: Option<Percentage>,
}

#[derive(Debug, Parser)]
pub struct TrendCommand {
    #[arg(
        long,
        default_value_t = 6,
        help = "How many days before today to include. Today is always included"
    )]
    days: u32,
}

pub fn process_history_command(
    HistoryCommand { below }: HistoryCommand,
    history: &HistoryRepository,
) -> Result<()> {
    if history.is_empty() {
        println!("No days recorded yet");
        return Ok(());
    }
    for line in history_lines(history.all().iter(), below) {
        println!("{line}");
    }
    Ok(())
}

pub fn process_trend_command(
    TrendCommand { days }: TrendCommand,
    history: &HistoryRepository,
    clock: &impl Clock,
) -> Result<()> {
    let window = history.window_since(days, clock.today());
    if window.is_empty() {
        println!("No days recorded in the last {} day(s)", u64::from(days) + 1);
        return Ok(());
    }
    for line in history_lines(window.into_iter(), None) {
        println!("{line}");
    }
    Ok(())
}

pub fn process_summary_command(history: &HistoryRepository, clock: &impl Clock) -> Result<()> {
    for line in summary_lines(history, clock.today()) {
        println!("{line}");
    }
    Ok(())
}

fn history_lines<'a>(
    records: impl Iterator<Item = &'a DailyRecord>,
    below: Option<Percentage>,
) -> Vec<String> {
    records
        .filter(|v| below.map_or(true, |limit| v.average_percentage < *limit))
        .map(|v| {
            format!(
                "{}\t{}%\t{}\t{}",
                display_date(v.date),
                display(v.average_percentage),
                v.average_time,
                goal_met_text(v.goal_met())
            )
        })
        .collect()
}

fn summary_lines(history: &HistoryRepository, today: NaiveDate) -> Vec<String> {
    [
        ("week", history.window_since(6, today).len(), history.weekly_average(today)),
        ("month", history.month_to_date(today).len(), history.monthly_average(today)),
    ]
    .into_iter()
    .map(|(period, days, average)| {
        // Averages are never negative
        let average = Percentage::new_opt(average).unwrap_or_default();
        let gap = goal_gap(*average)
            .map(|v| format!("{}% to target", display(v)))
            .unwrap_or_else(|| "target reached".into());
        format!("{period}\t{days} day(s)\t{average}\t{}\t{gap}", average.band())
    })
    .collect()
}
