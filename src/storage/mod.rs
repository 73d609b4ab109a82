//! Persistence of the history.
//!  - The whole history is one JSON array of daily records.
//!  - Writing happens only after the in-memory history was already changed, so a failed save
//!    leaves the file behind the memory until the next successful save.

pub mod history_store;
