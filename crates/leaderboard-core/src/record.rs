//! Score records and the shapes returned by leaderboard queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::difficulty::Difficulty;
use crate::submission::{coerce_id, coerce_score};

/// One submitted game result, as stored in the snapshot file.
///
/// Every field falls back to its default when missing so snapshots written by
/// older versions keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    pub username: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: i64,
    pub difficulty: String,
    /// Creation instant (RFC 3339, millisecond precision)
    pub timestamp: DateTime<Utc>,
    /// Human-readable local date of `timestamp` (e.g. "10/19/2026")
    pub date: String,
}

impl ScoreRecord {
    pub fn new(id: u64, username: String, score: i64, difficulty: String) -> Self {
        Self::at(id, username, score, difficulty, Utc::now())
    }

    /// Build a record stamped at a specific instant
    pub fn at(
        id: u64,
        username: String,
        score: i64,
        difficulty: String,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = now.trunc_subsecs(3);
        Self {
            id,
            username,
            score,
            difficulty,
            date: format_display_date(timestamp),
            timestamp,
        }
    }
}

/// Any JSON number, saturated into range; anything else reads as 0
fn lenient_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => coerce_score(&n),
        _ => 0,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => coerce_id(&n),
        _ => 0,
    })
}

/// Format an instant the way the leaderboard shows dates (`M/D/YYYY`, local time)
pub fn format_display_date(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%-m/%-d/%Y")
        .to_string()
}

/// Row of a ranked leaderboard query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
    pub difficulty: String,
    pub date: String,
}

impl From<&ScoreRecord> for LeaderboardEntry {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            username: record.username.clone(),
            score: record.score,
            difficulty: record.difficulty.clone(),
            date: record.date.clone(),
        }
    }
}

/// Row of a per-difficulty board in the summary (difficulty is the map key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub username: String,
    pub score: i64,
    pub date: String,
}

impl From<&ScoreRecord> for SummaryEntry {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            username: record.username.clone(),
            score: record.score,
            date: record.date.clone(),
        }
    }
}

/// Top entries for every known difficulty, keyed in board order
pub type DifficultySummary = BTreeMap<Difficulty, Vec<SummaryEntry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentScore {
    pub score: i64,
    pub difficulty: String,
    pub date: String,
}

impl From<&ScoreRecord> for RecentScore {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            score: record.score,
            difficulty: record.difficulty.clone(),
            date: record.date.clone(),
        }
    }
}

/// Aggregate statistics for a single player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Name as stored on the player's best record
    pub username: String,
    pub total_games: usize,
    pub high_score: i64,
    pub average_score: i64,
    /// Best five results, ordered by score rather than by time
    pub recent_scores: Vec<RecentScore>,
}
