use chrono::NaiveDate;

use crate::utils::{
    duration::{format_minutes, is_valid_duration, parse_minutes, ZERO_DURATION},
    percentage::{percentage_of, TEAM_TARGET_PERCENTAGE},
};

use super::entities::{DailyRecord, EmployeeHours, WorkEntry};

/// Outcome of aggregating one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    /// One entry per input, including people without valid hours.
    pub entries: Vec<WorkEntry>,
    pub average_percentage: f64,
    pub average_time: String,
}

impl DailySummary {
    pub fn goal_met(&self) -> bool {
        self.average_percentage >= TEAM_TARGET_PERCENTAGE
    }

    pub fn into_record(self, date: NaiveDate) -> DailyRecord {
        DailyRecord {
            date,
            employees: self.entries,
            average_percentage: self.average_percentage,
            average_time: self.average_time,
        }
    }
}

fn has_valid_hours(hours: &EmployeeHours) -> bool {
    !hours.hours_worked.is_empty() && is_valid_duration(&hours.hours_worked)
}

/// Reduces the hours of a day into averages.
///
/// Only entries with valid hours take part in the averages. The average percentage is the mean
/// of individual percentages, which differs from the percentage of the average time as soon as
/// goals differ.
pub fn aggregate_day(hours: &[EmployeeHours]) -> DailySummary {
    let entries = hours
        .iter()
        .map(|v| WorkEntry {
            name: v.name.clone(),
            hours_worked: v.hours_worked.clone(),
            daily_goal: v.daily_goal.clone(),
            percentage: if has_valid_hours(v) {
                percentage_of(&v.hours_worked, &v.daily_goal)
            } else {
                0.
            },
        })
        .collect::<Vec<_>>();

    let (percentage_sum, minutes_sum, valid) = hours
        .iter()
        .zip(&entries)
        .filter(|(v, _)| has_valid_hours(v))
        .fold((0., 0u64, 0usize), |(percentages, minutes, count), (v, entry)| {
            (
                percentages + entry.percentage,
                minutes + parse_minutes(&v.hours_worked) as u64,
                count + 1,
            )
        });

    if valid == 0 {
        return DailySummary {
            entries,
            average_percentage: 0.,
            average_time: ZERO_DURATION.to_string(),
        };
    }

    let average_minutes = (minutes_sum as f64 / valid as f64).round() as u32;
    DailySummary {
        entries,
        average_percentage: percentage_sum / valid as f64,
        average_time: format_minutes(average_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::percentage::{display, percentage};

    #[test]
    fn test_two_employees_different_goals() {
        let summary = aggregate_day(&[
            EmployeeHours::new("A", "08:00", "8:30"),
            EmployeeHours::new("B", "6:00", "6:00"),
        ]);
        let expected = (percentage(480, 510) + 100.) / 2.;
        assert_eq!(summary.average_percentage, expected);
        assert_eq!(display(summary.average_percentage), "97,1");
        assert_eq!(summary.average_time, "7:00");

        // Percentage of the averaged times is a different number
        let of_averages = percentage((480 + 360) / 2, (510 + 360) / 2);
        assert!((summary.average_percentage - of_averages).abs() > 0.1);
        assert!(summary.goal_met());
    }

    #[test]
    fn test_invalid_entries_are_kept_but_not_averaged() {
        let summary = aggregate_day(&[
            EmployeeHours::new("A", "08:00", "8:00"),
            EmployeeHours::new("B", "", "8:30"),
            EmployeeHours::new("C", "8:3", "8:30"),
            EmployeeHours::new("D", "830", "8:30"),
        ]);
        assert_eq!(summary.entries.len(), 4);
        assert_eq!(summary.entries[0].percentage, 100.);
        assert!(summary.entries[1..].iter().all(|v| v.percentage == 0.));
        assert_eq!(summary.average_percentage, 100.);
        assert_eq!(summary.average_time, "8:00");
    }

    #[test]
    fn test_no_valid_entries() {
        let summary = aggregate_day(&[EmployeeHours::new("A", "", "8:30")]);
        assert_eq!(summary.average_percentage, 0.);
        assert_eq!(summary.average_time, "0:00");
        assert!(!summary.goal_met());

        let empty = aggregate_day(&[]);
        assert!(empty.entries.is_empty());
        assert_eq!(empty.average_time, "0:00");
    }

    #[test]
    fn test_average_time_rounds_to_nearest_minute() {
        let summary = aggregate_day(&[
            EmployeeHours::new("A", "8:00", "8:30"),
            EmployeeHours::new("B", "8:01", "8:30"),
        ]);
        // 480.5 rounds up
        assert_eq!(summary.average_time, "8:01");
    }

    #[test]
    fn test_zero_goal() {
        let summary = aggregate_day(&[EmployeeHours::new("A", "4:00", "0:00")]);
        assert_eq!(summary.entries[0].percentage, 0.);
        assert_eq!(summary.average_percentage, 0.);
        assert_eq!(summary.average_time, "4:00");
    }

    #[test]
    fn test_into_record() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
        let record = aggregate_day(&[EmployeeHours::new("A", "8:30", "8:30")]).into_record(date);
        assert_eq!(record.date, date);
        assert_eq!(record.employees.len(), 1);
        assert_eq!(record.average_percentage, 100.);
    }
}
