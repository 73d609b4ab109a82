//! Daily hours tracking for a small team. Each person reports the time worked against a personal
//! goal, days are aggregated into team averages and kept in a history that can be imported from
//! and exported to tab separated files.
//!

pub mod cli;
pub mod config;
pub mod storage;
pub mod tracking;
pub mod utils;
