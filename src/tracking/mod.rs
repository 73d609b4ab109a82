//! The tracking engine. Hours typed in or imported for a day are aggregated by
//! [aggregator::aggregate_day] into a [entities::DailyRecord], which is kept in a
//! [history::HistoryRepository]. [session::TrackingSession] ties the history to a
//! [PersistenceStore](crate::storage::history_store::PersistenceStore).

pub mod aggregator;
pub mod entities;
pub mod export;
pub mod history;
pub mod import;
pub mod session;
