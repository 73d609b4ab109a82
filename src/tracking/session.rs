use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info};

use crate::storage::history_store::{PersistenceError, PersistenceStore};

use super::{
    aggregator::aggregate_day,
    entities::{DailyRecord, EmployeeHours},
    history::HistoryRepository,
    import::{read_import_file, reconcile, ImportError, SkipCounts},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("Couldn't read the import file: {0}")]
    ImportRead(#[source] std::io::Error),
    /// The history in memory is already changed at this point, only the stored copy is stale.
    #[error("Changes were applied but not saved: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub days_imported: usize,
    pub valid_rows: usize,
    pub skipped: SkipCounts,
}

/// Owns the history for the lifetime of a command. Every change is applied in memory first and
/// then written to the store.
pub struct TrackingSession<S> {
    store: S,
    history: HistoryRepository,
}

impl<S: PersistenceStore> TrackingSession<S> {
    pub async fn open(store: S) -> Result<Self, PersistenceError> {
        let history = store
            .load()
            .await?
            .map(HistoryRepository::from_records)
            .unwrap_or_default();
        info!("Loaded history with {} day(s)", history.len());
        Ok(Self { store, history })
    }

    pub fn history(&self) -> &HistoryRepository {
        &self.history
    }

    /// Aggregates the hours of a day and stores the result, replacing the day if it existed.
    pub async fn record_day(
        &mut self,
        date: NaiveDate,
        hours: &[EmployeeHours],
    ) -> Result<DailyRecord, SessionError> {
        let record = aggregate_day(hours).into_record(date);
        self.upsert(record.clone()).await?;
        Ok(record)
    }

    pub async fn upsert(&mut self, record: DailyRecord) -> Result<(), SessionError> {
        info!("Saving day {}", record.date);
        self.history.upsert(record);
        self.persist().await
    }

    /// Returns whether the day existed. Nothing is written when it didn't.
    pub async fn delete(&mut self, date: NaiveDate) -> Result<bool, SessionError> {
        if !self.history.delete(date) {
            return Ok(false);
        }
        info!("Deleted day {date}");
        self.persist().await?;
        Ok(true)
    }

    pub async fn import_text(
        &mut self,
        raw_text: &str,
        default_goal: &str,
    ) -> Result<ImportSummary, SessionError> {
        let outcome = reconcile(raw_text, &self.history, default_goal)?;
        let summary = ImportSummary {
            days_imported: outcome.days_imported,
            valid_rows: outcome.valid_rows,
            skipped: outcome.skip_counts(),
        };
        self.history = outcome.history;
        self.persist().await?;
        Ok(summary)
    }

    pub async fn import_file(
        &mut self,
        path: &Path,
        default_goal: &str,
    ) -> Result<ImportSummary, SessionError> {
        let text = read_import_file(path)
            .await
            .map_err(SessionError::ImportRead)?;
        self.import_text(&text, default_goal).await
    }

    async fn persist(&self) -> Result<(), SessionError> {
        self.store
            .save(self.history.all())
            .await
            .inspect_err(|e| error!("History changed in memory but wasn't saved {e:?}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        storage::history_store::{FileHistoryStore, MockPersistenceStore},
        utils::logging::TEST_LOGGING,
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();

    fn team_day() -> Vec<EmployeeHours> {
        vec![
            EmployeeHours::new("Raposo", "07:59", "8:30"),
            EmployeeHours::new("Schutz", "06:06", "6:00"),
            EmployeeHours::new("Luiz", "", "8:30"),
        ]
    }

    fn failed_write() -> PersistenceError {
        PersistenceError::Write(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read only",
        ))
    }

    #[tokio::test]
    async fn test_record_day_persists() -> Result<()> {
        *TEST_LOGGING;
        let mut store = MockPersistenceStore::new();
        store.expect_load().times(1).returning(|| Ok(None));
        store
            .expect_save()
            .withf(|records| records.len() == 1 && records[0].employees.len() == 3)
            .times(1)
            .returning(|_| Ok(()));

        let mut session = TrackingSession::open(store).await?;
        let record = session.record_day(TEST_DATE, &team_day()).await?;

        assert_eq!(record.average_time, "7:03");
        assert_eq!(session.history().find(TEST_DATE), Some(&record));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory() -> Result<()> {
        let mut store = MockPersistenceStore::new();
        store.expect_load().returning(|| Ok(None));
        store.expect_save().returning(|_| Err(failed_write()));

        let mut session = TrackingSession::open(store).await?;
        let result = session.record_day(TEST_DATE, &team_day()).await;

        assert!(matches!(
            result,
            Err(SessionError::Persistence(PersistenceError::Write(_)))
        ));
        assert!(session.history().find(TEST_DATE).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_import_doesnt_touch_store() -> Result<()> {
        let mut store = MockPersistenceStore::new();
        store.expect_load().returning(|| Ok(None));
        store.expect_save().never();

        let mut session = TrackingSession::open(store).await?;
        assert!(matches!(
            session.import_text("header only", "8:30").await,
            Err(SessionError::Import(ImportError::EmptyInput))
        ));
        assert!(matches!(
            session.import_text("header\nbroken\trow\n", "8:30").await,
            Err(SessionError::Import(ImportError::NoValidRows { skipped: 1 }))
        ));
        assert!(session.history().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_day_skips_save() -> Result<()> {
        let mut store = MockPersistenceStore::new();
        store.expect_load().returning(|| Ok(None));
        store.expect_save().never();

        let mut session = TrackingSession::open(store).await?;
        assert!(!session.delete(TEST_DATE).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_import_file() -> Result<()> {
        let dir = tempdir()?;
        let mut session = TrackingSession::open(FileHistoryStore::in_dir(dir.path())).await?;
        let result = session
            .import_file(&dir.path().join("missing.tsv"), "8:30")
            .await;
        assert!(matches!(result, Err(SessionError::ImportRead(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        {
            let mut session = TrackingSession::open(FileHistoryStore::in_dir(dir.path())).await?;
            session.record_day(TEST_DATE, &team_day()).await?;
            let summary = session
                .import_text(
                    "Data\tFuncionário\tHoras\tMeta\n05/11/2025\tMika\t08:49\n05/11/2025\tCaio\n",
                    "8:30",
                )
                .await?;
            assert_eq!(
                summary,
                ImportSummary {
                    days_imported: 1,
                    valid_rows: 1,
                    skipped: SkipCounts {
                        too_few_fields: 1,
                        ..Default::default()
                    },
                }
            );
        }

        let mut session = TrackingSession::open(FileHistoryStore::in_dir(dir.path())).await?;
        let dates = session
            .history()
            .all()
            .iter()
            .map(|v| v.date)
            .collect::<Vec<_>>();
        assert_eq!(dates, vec![TEST_DATE.succ_opt().unwrap(), TEST_DATE]);

        assert!(session.delete(TEST_DATE).await?);
        let reopened = TrackingSession::open(FileHistoryStore::in_dir(dir.path())).await?;
        assert_eq!(reopened.history().len(), 1);
        Ok(())
    }
}
