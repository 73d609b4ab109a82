use std::fmt::Write;

use chrono::NaiveDate;

use crate::utils::{
    percentage::round_tenth,
    time::{date_to_record_name, display_date},
};

use super::{entities::TargetConfig, history::HistoryRepository};

pub const EXPORT_HEADER: &str = "Data\tMédia (%)\tTempo Médio\tMeta Atingida\tFuncionário\tHoras Trabalhadas\tMeta Diária\tPorcentagem Individual (%)";

pub const IMPORT_TEMPLATE_HEADER: &str = "Data\tFuncionário\tHoras\tMeta";

/// Stands in for hours nobody filled in. It fails the duration grammar, so the row is skipped on
/// import instead of recording a zero.
pub const TEMPLATE_HOURS_PLACEHOLDER: &str = "--:--";

/// How the team writes whether a day met the target.
pub fn goal_met_text(goal_met: bool) -> &'static str {
    if goal_met {
        "Sim"
    } else {
        "Não"
    }
}

/// Flattens the history into tab separated text, one row per day and person, newest day first.
/// Day level values are repeated on every row of that day. Percentages are rounded the same way
/// as on screen, halves go up.
pub fn serialize(history: &HistoryRepository) -> String {
    let mut output = String::from(EXPORT_HEADER);
    output.push('\n');
    for day in history.all() {
        for entry in &day.employees {
            // Writing into a String can't fail
            let _ = writeln!(
                output,
                "{}\t{:.1}\t{}\t{}\t{}\t{}\t{}\t{:.1}",
                display_date(day.date),
                round_tenth(day.average_percentage),
                day.average_time,
                goal_met_text(day.goal_met()),
                entry.name,
                entry.hours_worked,
                entry.daily_goal,
                round_tenth(entry.percentage),
            );
        }
    }
    output
}

/// File in the shape [reconcile](super::import::reconcile) expects, with a placeholder row for
/// every member of the team. Rows still holding the placeholder are skipped when imported.
pub fn import_template(team: &[TargetConfig], date: NaiveDate) -> String {
    let mut output = String::from(IMPORT_TEMPLATE_HEADER);
    output.push('\n');
    for member in team {
        let _ = writeln!(
            output,
            "{}\t{}\t{}\t{}",
            display_date(date),
            member.employee_name,
            TEMPLATE_HOURS_PLACEHOLDER,
            member.daily_goal
        );
    }
    output
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("relatorio_horas_{}.tsv", date_to_record_name(today))
}
