//! Reconciliation of tabular files into the history.
//!
//! Files have a header line followed by `date, name, hours[, goal]` rows separated by tabs or
//! commas. A broken row is skipped, it never fails the import. Every day present in the file
//! replaces the stored day entirely.

use std::{collections::BTreeMap, path::Path};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::utils::{duration::is_valid_duration, time::normalize_import_date};

use super::{aggregator::aggregate_day, entities::EmployeeHours, history::HistoryRepository};

/// Failures that stop a whole import. Nothing is changed when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("The file is empty or only has a header")]
    EmptyInput,
    #[error("0 valid rows found, {skipped} row(s) skipped")]
    NoValidRows { skipped: usize },
}

/// Reason a single row was skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected at least 3 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("unrecognized date {0:?}")]
    InvalidDate(String),
    #[error("unrecognized duration {0:?}")]
    InvalidDuration(String),
}

/// Row that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub date: NaiveDate,
    pub hours: EmployeeHours,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based, counting only non-blank lines including the header.
    pub line: usize,
    pub error: RowError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub too_few_fields: usize,
    pub invalid_date: usize,
    pub invalid_duration: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.too_few_fields + self.invalid_date + self.invalid_duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub history: HistoryRepository,
    pub days_imported: usize,
    pub valid_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportOutcome {
    pub fn skip_counts(&self) -> SkipCounts {
        count_skipped(&self.skipped)
    }
}

fn count_skipped(skipped: &[SkippedRow]) -> SkipCounts {
    skipped
        .iter()
        .fold(SkipCounts::default(), |mut counts, row| {
            match row.error {
                RowError::TooFewFields { .. } => counts.too_few_fields += 1,
                RowError::InvalidDate(_) => counts.invalid_date += 1,
                RowError::InvalidDuration(_) => counts.invalid_duration += 1,
            }
            counts
        })
}

/// Validates a single data line.
pub fn parse_row(line: &str, default_goal: &str) -> Result<ImportRow, RowError> {
    let tokens = line
        .trim()
        .split(['\t', ','])
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();

    let [date, name, hours, rest @ ..] = tokens.as_slice() else {
        return Err(RowError::TooFewFields {
            found: tokens.len(),
        });
    };
    let daily_goal = rest.first().copied().unwrap_or(default_goal);

    let date = normalize_import_date(date).ok_or_else(|| RowError::InvalidDate(date.to_string()))?;

    if !is_valid_duration(hours) {
        return Err(RowError::InvalidDuration(hours.to_string()));
    }

    Ok(ImportRow {
        date,
        hours: EmployeeHours::new(*name, *hours, daily_goal),
    })
}

/// Merges `raw_text` into a copy of `existing`. Each date found in the file is aggregated and
/// replaces whatever was stored for that date.
#[instrument(skip_all)]
pub fn reconcile(
    raw_text: &str,
    existing: &HistoryRepository,
    default_goal: &str,
) -> Result<ImportOutcome, ImportError> {
    let lines = raw_text
        .trim()
        .split('\n')
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>();

    if lines.len() < 2 {
        return Err(ImportError::EmptyInput);
    }

    let mut groups = BTreeMap::<NaiveDate, Vec<EmployeeHours>>::new();
    let mut skipped = vec![];
    let mut valid_rows = 0;

    for (index, line) in lines.iter().enumerate().skip(1) {
        match parse_row(line, default_goal) {
            Ok(row) => {
                valid_rows += 1;
                groups.entry(row.date).or_default().push(row.hours);
            }
            Err(error) => {
                debug!("Skipping line {}: {error}", index + 1);
                skipped.push(SkippedRow {
                    line: index + 1,
                    error,
                });
            }
        }
    }

    if valid_rows == 0 {
        return Err(ImportError::NoValidRows {
            skipped: skipped.len(),
        });
    }

    let days_imported = groups.len();
    let mut history = existing.clone();
    for (date, hours) in groups {
        history.upsert(aggregate_day(&hours).into_record(date));
    }

    info!(
        "Imported {days_imported} day(s) from {valid_rows} row(s), skipped {:?}",
        count_skipped(&skipped)
    );

    Ok(ImportOutcome {
        history,
        days_imported,
        valid_rows,
        skipped,
    })
}

/// Reads a file to be imported. This is the only place where the import waits on I/O, the
/// rest of the pipeline is synchronous.
pub async fn read_import_file(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::tracking::entities::{DailyRecord, WorkEntry};

    const DEFAULT_GOAL: &str = "8:30";
    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();

    fn stored(date: NaiveDate, name: &str) -> DailyRecord {
        DailyRecord {
            date,
            employees: vec![WorkEntry {
                name: name.into(),
                hours_worked: "1:00".into(),
                daily_goal: "8:30".into(),
                percentage: 11.7,
            }],
            average_percentage: 11.7,
            average_time: "1:00".into(),
        }
    }

    #[test]
    fn test_mixed_date_formats_collapse() -> Result<()> {
        let text = "Data\tFuncionário\tHoras\tMeta\n\
                    04/11/2025\tRaposo\t07:59\t8:30\n\
                    2025-11-04\tMika\t08:49\t8:30\n";
        let outcome = reconcile(text, &HistoryRepository::new(), DEFAULT_GOAL)?;

        assert_eq!(outcome.days_imported, 1);
        assert_eq!(outcome.valid_rows, 2);
        assert_eq!(outcome.history.len(), 1);
        let record = outcome.history.find(TEST_DATE).unwrap();
        let names = record.employees.iter().map(|v| v.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Raposo", "Mika"]);
        assert_eq!(record.average_time, "8:24");
        Ok(())
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let existing = HistoryRepository::from_records([stored(TEST_DATE, "Raposo")]);
        assert_eq!(
            reconcile("Data\tFuncionário\tHoras\tMeta\n", &existing, DEFAULT_GOAL),
            Err(ImportError::EmptyInput)
        );
        assert_eq!(
            reconcile("  \n\n", &existing, DEFAULT_GOAL),
            Err(ImportError::EmptyInput)
        );
        assert_eq!(existing.len(), 1);
    }

    #[test]
    fn test_no_valid_rows_leaves_history() {
        let existing = HistoryRepository::from_records([stored(TEST_DATE, "Raposo")]);
        let before = existing.clone();
        let text = "header\n\
                    2025/11/04\tRaposo\t07:59\n\
                    04/11/2025\tMika\t8h49\n\
                    04/11/2025\tLuiz\n";
        assert_eq!(
            reconcile(text, &existing, DEFAULT_GOAL),
            Err(ImportError::NoValidRows { skipped: 3 })
        );
        assert_eq!(existing, before);
    }

    #[test]
    fn test_import_replaces_whole_day() -> Result<()> {
        let other_day = TEST_DATE.pred_opt().unwrap();
        let existing = HistoryRepository::from_records([
            stored(TEST_DATE, "Luiz"),
            stored(other_day, "Luiz"),
        ]);
        let text = "header\n04/11/2025,Raposo,08:00,8:00\n";
        let outcome = reconcile(text, &existing, DEFAULT_GOAL)?;

        let replaced = outcome.history.find(TEST_DATE).unwrap();
        assert_eq!(replaced.employees.len(), 1);
        assert!(replaced.entry("Luiz").is_none());
        assert_eq!(replaced.average_percentage, 100.);
        assert_eq!(outcome.history.find(other_day), existing.find(other_day));
        // The original repository is a separate copy
        assert!(existing.find(TEST_DATE).unwrap().entry("Luiz").is_some());
        Ok(())
    }

    #[test]
    fn test_bad_rows_are_skipped_and_counted() -> Result<()> {
        let text = "header\n\
                    4/11/2025\tRaposo\t7:59\n\
                    32/11/2025\tMika\t08:49\n\
                    04/11/2025\tLuiz\t6:5\n\
                    05/11/2025\tSchutz\n\
                    ,,\n\
                    05/11/2025 , Caio , 05:44 , 6:00\n";
        let outcome = reconcile(text, &HistoryRepository::new(), DEFAULT_GOAL)?;

        assert_eq!(outcome.valid_rows, 2);
        assert_eq!(outcome.days_imported, 2);
        assert_eq!(
            outcome.skip_counts(),
            SkipCounts {
                too_few_fields: 2,
                invalid_date: 1,
                invalid_duration: 1,
            }
        );
        assert_eq!(outcome.skipped[0].line, 3);
        let raposo = outcome.history.find(TEST_DATE).unwrap().entry("Raposo").unwrap();
        assert_eq!(raposo.daily_goal, DEFAULT_GOAL);
        Ok(())
    }

    #[test]
    fn test_parse_row() {
        assert_eq!(
            parse_row("2025-11-4\tMika\t08:49\t6:00", DEFAULT_GOAL),
            Ok(ImportRow {
                date: TEST_DATE,
                hours: EmployeeHours::new("Mika", "08:49", "6:00"),
            })
        );
        assert_eq!(
            parse_row("2025-11-4,,Mika", DEFAULT_GOAL),
            Err(RowError::TooFewFields { found: 2 })
        );
        assert_eq!(
            parse_row("04.11.2025\tMika\t08:49", DEFAULT_GOAL),
            Err(RowError::InvalidDate("04.11.2025".into()))
        );
        assert_eq!(
            parse_row("04/11/2025\tMika\t108:49", DEFAULT_GOAL),
            Err(RowError::InvalidDuration("108:49".into()))
        );
    }

    #[test]
    fn test_windows_line_endings() -> Result<()> {
        let text = "header\r\n04/11/2025\tRaposo\t07:59\t8:30\r\n";
        let outcome = reconcile(text, &HistoryRepository::new(), DEFAULT_GOAL)?;
        assert_eq!(outcome.valid_rows, 1);
        let entry = outcome.history.find(TEST_DATE).unwrap().entry("Raposo").unwrap();
        assert_eq!(entry.daily_goal, "8:30");
        Ok(())
    }

    #[tokio::test]
    async fn test_read_import_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all("header\n04/11/2025\tRaposo\t07:59\n".as_bytes())?;
        let text = read_import_file(file.path()).await?;
        let outcome = reconcile(&text, &HistoryRepository::new(), DEFAULT_GOAL)?;
        assert_eq!(outcome.days_imported, 1);
        Ok(())
    }
}
