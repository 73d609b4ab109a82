use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use super::entities::DailyRecord;

/// Date-unique collection of [DailyRecord]s. Records are always kept newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRepository {
    records: Vec<DailyRecord>,
}

impl HistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository out of records coming from storage. If a date shows up more than once
    /// the last occurrence wins.
    pub fn from_records(records: impl IntoIterator<Item = DailyRecord>) -> Self {
        let mut repository = Self::new();
        for record in records {
            repository.upsert(record);
        }
        repository
    }

    /// Replaces the record for `record.date` or inserts a new one.
    pub fn upsert(&mut self, record: DailyRecord) {
        debug!("Upserting record for {}", record.date);
        self.records.retain(|v| v.date != record.date);
        self.records.push(record);
        self.records.sort_by(|a, b| b.date.cmp(&a.date));
    }

    /// Removes the record for `date`. Returns whether there was one.
    pub fn delete(&mut self, date: NaiveDate) -> bool {
        let initial_len = self.records.len();
        self.records.retain(|v| v.date != date);
        initial_len != self.records.len()
    }

    pub fn find(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records.iter().find(|v| v.date == date)
    }

    /// All records, newest first.
    pub fn all(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records between `today - days_back` and `today` (both inclusive), oldest first. A window
    /// reaching past the first representable day starts there.
    pub fn window_since(&self, days_back: u32, today: NaiveDate) -> Vec<&DailyRecord> {
        let start = today
            .checked_sub_days(Days::new(days_back.into()))
            .unwrap_or(NaiveDate::MIN);
        self.between(start, today)
    }

    /// Records from the first day of the current month up to `today`, oldest first.
    pub fn month_to_date(&self, today: NaiveDate) -> Vec<&DailyRecord> {
        let start = today.with_day(1).unwrap_or(today);
        self.between(start, today)
    }

    /// Mean of the daily averages over the last seven days, today included.
    pub fn weekly_average(&self, today: NaiveDate) -> f64 {
        mean_of_averages(&self.window_since(6, today))
    }

    /// Mean of the daily averages since the start of the month.
    pub fn monthly_average(&self, today: NaiveDate) -> f64 {
        mean_of_averages(&self.month_to_date(today))
    }

    fn between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&DailyRecord> {
        // Records are stored newest first, reversing gives ascending order
        self.records
            .iter()
            .rev()
            .filter(|v| v.date >= start && v.date <= end)
            .collect()
    }
}

fn mean_of_averages(records: &[&DailyRecord]) -> f64 {
    if records.is_empty() {
        return 0.;
    }
    records.iter().map(|v| v.average_percentage).sum::<f64>() / records.len() as f64
}
