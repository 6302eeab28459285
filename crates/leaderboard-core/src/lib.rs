//! # leaderboard-core
//!
//! Core library for the leaderboard score service.
//!
//! This crate provides:
//! - Score records and the projections returned by leaderboard queries
//! - Submission validation
//! - The in-memory score store with ranking and player statistics
//! - Write-through snapshot persistence

pub mod difficulty;
pub mod error;
pub mod record;
pub mod storage;
pub mod submission;

pub use difficulty::Difficulty;
pub use error::{Error, Result};
pub use record::{
    DifficultySummary, LeaderboardEntry, PlayerStats, RecentScore, ScoreRecord, SummaryEntry,
};
pub use storage::{ScoreStore, SnapshotFile};
pub use submission::{DEFAULT_LIMIT, MAX_USERNAME_LEN, NewScore, Submission, parse_limit};
