use chrono::Utc;
use tracing::info;

use crate::difficulty::Difficulty;
use crate::error::{Error, Result};
use crate::record::{
    DifficultySummary, LeaderboardEntry, PlayerStats, RecentScore, ScoreRecord, SummaryEntry,
};
use crate::submission::{NewScore, Submission};

use super::SnapshotFile;

/// Sentinel difficulty that disables filtering in [`ScoreStore::ranked`]
pub const ALL_DIFFICULTIES: &str = "all";

/// Entries per difficulty in [`ScoreStore::summary`]
pub const SUMMARY_LIMIT: usize = 5;

/// Entries in [`PlayerStats::recent_scores`]
pub const RECENT_SCORES_LIMIT: usize = 5;

/// In-memory score collection backed by a write-through snapshot file.
///
/// Records are kept in insertion order; every ranking is computed on read.
/// Mutations rewrite the snapshot before returning, so callers sharing the
/// store must hold their lock across the whole call.
#[derive(Debug)]
pub struct ScoreStore {
    records: Vec<ScoreRecord>,
    snapshot: SnapshotFile,
    last_id: u64,
}

impl ScoreStore {
    /// Open the store, populating it from the snapshot file
    pub fn open(snapshot: SnapshotFile) -> Self {
        let records = snapshot.load();
        Self::with_records(snapshot, records)
    }

    pub fn with_records(snapshot: SnapshotFile, records: Vec<ScoreRecord>) -> Self {
        let last_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            records,
            snapshot,
            last_id,
        }
    }

    /// Validate and store a submission
    pub fn insert(&mut self, submission: &Submission) -> Result<ScoreRecord> {
        let new_score = submission.validate()?;
        Ok(self.insert_validated(new_score))
    }

    /// Append an already validated score and flush the snapshot.
    ///
    /// A failed flush is logged; the record stays in memory either way.
    pub fn insert_validated(&mut self, new_score: NewScore) -> ScoreRecord {
        let now = Utc::now();
        let id = self.next_id(now.timestamp_millis());
        let record = ScoreRecord::at(
            id,
            new_score.username,
            new_score.score,
            new_score.difficulty,
            now,
        );

        self.records.push(record.clone());
        self.snapshot.save(&self.records);

        info!(
            "New score submitted: {} - {} ({})",
            record.username, record.score, record.difficulty
        );
        record
    }

    /// Millisecond clock id, bumped past the previous one if the clock stalls
    fn next_id(&mut self, now_millis: i64) -> u64 {
        let candidate = u64::try_from(now_millis).unwrap_or(0);
        let id = candidate.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    /// Top `limit` scores, highest first.
    ///
    /// `difficulty` of `None`, `""` or `"all"` ranks every record; any other
    /// value keeps only records with exactly that difficulty. Equal scores
    /// keep their insertion order.
    pub fn ranked(&self, difficulty: Option<&str>, limit: usize) -> Vec<LeaderboardEntry> {
        let filter = difficulty.filter(|d| !d.is_empty() && *d != ALL_DIFFICULTIES);
        self.ranked_by(|r| filter.is_none_or(|d| r.difficulty == d))
            .into_iter()
            .take(limit)
            .map(LeaderboardEntry::from)
            .collect()
    }

    /// Top five scores for each known difficulty
    pub fn summary(&self) -> DifficultySummary {
        Difficulty::ALL
            .iter()
            .map(|difficulty| {
                let entries: Vec<SummaryEntry> = self
                    .ranked_by(|r| difficulty.matches(&r.difficulty))
                    .into_iter()
                    .take(SUMMARY_LIMIT)
                    .map(SummaryEntry::from)
                    .collect();
                (*difficulty, entries)
            })
            .collect()
    }

    /// Aggregate every record whose username matches case-insensitively
    pub fn player_stats(&self, username: &str) -> Result<PlayerStats> {
        let wanted = username.to_lowercase();
        let scores = self.ranked_by(|r| r.username.to_lowercase() == wanted);

        let Some(best) = scores.first() else {
            return Err(Error::PlayerNotFound(username.to_string()));
        };

        let total: i128 = scores.iter().map(|r| i128::from(r.score)).sum();
        let mean = total as f64 / scores.len() as f64;

        Ok(PlayerStats {
            username: best.username.clone(),
            total_games: scores.len(),
            high_score: best.score,
            average_score: round_half_up(mean),
            recent_scores: scores
                .iter()
                .take(RECENT_SCORES_LIMIT)
                .map(|r| RecentScore::from(*r))
                .collect(),
        })
    }

    /// Drop every record and flush the now empty snapshot
    pub fn clear(&mut self) {
        let cleared = self.records.len();
        self.records.clear();
        self.snapshot.save(&self.records);
        info!("Cleared {} scores", cleared);
    }

    /// Write the current state to the snapshot file.
    ///
    /// Returns whether the write succeeded.
    pub fn flush(&self) -> bool {
        self.snapshot.save(&self.records)
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Matching records sorted by score descending (stable)
    fn ranked_by(&self, keep: impl Fn(&ScoreRecord) -> bool) -> Vec<&ScoreRecord> {
        let mut matching: Vec<&ScoreRecord> = self.records.iter().filter(|&r| keep(r)).collect();
        matching.sort_by(|a, b| b.score.cmp(&a.score));
        matching
    }
}

/// Round to nearest, halves toward positive infinity
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    struct Fixture {
        _dir: TempDir,
        store: ScoreStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = ScoreStore::open(SnapshotFile::new(dir.path().join("scores.json")));
        Fixture { _dir: dir, store }
    }

    fn submit(
        store: &mut ScoreStore,
        username: &str,
        score: i64,
        difficulty: &str,
    ) -> ScoreRecord {
        store
            .insert(&Submission::new(username, score, difficulty))
            .unwrap()
    }

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.username.as_str()).collect()
    }

    #[test]
    fn test_insert_returns_record() {
        let mut f = fixture();
        let record = submit(&mut f.store, "  alice ", 500, "easy");

        assert_eq!(record.username, "alice");
        assert_eq!(record.score, 500);
        assert_eq!(record.difficulty, "easy");
        assert!(record.id > 0);
        assert!(!record.date.is_empty());
        assert_eq!(f.store.len(), 1);
    }

    #[test]
    fn test_insert_ids_strictly_increase() {
        let mut f = fixture();
        let ids: Vec<u64> = (0..50)
            .map(|i| submit(&mut f.store, "frog", i, "easy").id)
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_next_id_continues_after_loaded_records() {
        let dir = TempDir::new().unwrap();
        let future = u64::MAX - 10;
        let loaded = vec![ScoreRecord::new(future, "old".into(), 1, "easy".into())];
        let snapshot = SnapshotFile::new(dir.path().join("scores.json"));
        let mut store = ScoreStore::with_records(snapshot, loaded);

        let record = submit(&mut store, "new", 2, "easy");
        assert_eq!(record.id, future + 1);
    }

    #[test]
    fn test_insert_rejects_invalid_without_mutation() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 500, "easy");

        let empty_name = f.store.insert(&Submission::new("", 100, "easy"));
        assert!(matches!(empty_name, Err(Error::Validation(_))));

        let bad_score = f.store.insert(&Submission::new("bob", "notanumber", "easy"));
        assert!(matches!(bad_score, Err(Error::Validation(_))));

        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.snapshot().load().len(), 1);
    }

    #[test]
    fn test_insert_flushes_snapshot() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 500, "easy");
        submit(&mut f.store, "bob", 900, "hard");

        let on_disk = f.store.snapshot().try_load().unwrap();
        assert_eq!(on_disk, f.store.records());
    }

    #[test]
    fn test_insert_survives_failed_flush() {
        let blocker = NamedTempFile::new().unwrap();
        let mut store = ScoreStore::open(SnapshotFile::new(blocker.path().join("scores.json")));

        let record = submit(&mut store, "alice", 500, "easy");
        assert_eq!(store.len(), 1);
        assert_eq!(store.ranked(None, 10)[0].username, record.username);
        assert!(!store.flush());
    }

    #[test]
    fn test_ranked_scenario() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 500, "easy");
        submit(&mut f.store, "bob", 900, "easy");
        submit(&mut f.store, "carol", 900, "hard");

        let easy = f.store.ranked(Some("easy"), 10);
        assert_eq!(names(&easy), ["bob", "alice"]);
        assert_eq!(easy[0].score, 900);
        assert_eq!(easy[1].score, 500);

        let summary = f.store.summary();
        let hard = &summary[&Difficulty::Hard];
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].username, "carol");
        assert_eq!(hard[0].score, 900);
    }

    #[test]
    fn test_ranked_ties_keep_insertion_order() {
        let mut f = fixture();
        submit(&mut f.store, "first", 100, "easy");
        submit(&mut f.store, "top", 300, "easy");
        submit(&mut f.store, "second", 100, "easy");
        submit(&mut f.store, "third", 100, "medium");

        let all = f.store.ranked(None, 10);
        assert_eq!(names(&all), ["top", "first", "second", "third"]);
    }

    #[test]
    fn test_ranked_sorted_and_bounded() {
        let mut f = fixture();
        let scores = [5, 42, -7, 42, 0, 999, 13, 13, 250, 1];
        for (i, score) in scores.iter().enumerate() {
            let difficulty = if i % 2 == 0 { "hard" } else { "easy" };
            submit(&mut f.store, &format!("p{i}"), *score, difficulty);
        }

        let top = f.store.ranked(None, 4);
        assert_eq!(top.len(), 4);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(top[0].score, 999);

        let hard = f.store.ranked(Some("hard"), 100);
        assert_eq!(hard.len(), 5);
        assert!(hard.iter().all(|e| e.difficulty == "hard"));
        assert!(hard.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ranked_all_sentinel_and_empty_filter() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 1, "easy");
        submit(&mut f.store, "bob", 2, "hard");

        assert_eq!(f.store.ranked(Some("all"), 10).len(), 2);
        assert_eq!(f.store.ranked(Some(""), 10).len(), 2);
        assert!(f.store.ranked(Some("medium"), 10).is_empty());
    }

    #[test]
    fn test_ranked_is_idempotent() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 10, "easy");
        submit(&mut f.store, "bob", 10, "easy");
        submit(&mut f.store, "carol", 30, "easy");

        assert_eq!(f.store.ranked(Some("easy"), 2), f.store.ranked(Some("easy"), 2));
    }

    #[test]
    fn test_unknown_difficulty_only_in_explicit_query() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 10, "nightmare");

        let summary = f.store.summary();
        assert_eq!(summary.len(), 4);
        assert!(summary.values().all(Vec::is_empty));

        let explicit = f.store.ranked(Some("nightmare"), 10);
        assert_eq!(names(&explicit), ["alice"]);
    }

    #[test]
    fn test_summary_caps_each_board() {
        let mut f = fixture();
        for i in 0..8 {
            submit(&mut f.store, &format!("e{i}"), i, "easy");
        }
        submit(&mut f.store, "m", 1, "medium");

        let summary = f.store.summary();
        assert_eq!(summary[&Difficulty::Easy].len(), SUMMARY_LIMIT);
        assert_eq!(summary[&Difficulty::Easy][0].score, 7);
        assert_eq!(summary[&Difficulty::Medium].len(), 1);
        assert!(summary[&Difficulty::Insane].is_empty());
    }

    #[test]
    fn test_player_stats() {
        let mut f = fixture();
        submit(&mut f.store, "Alice", 100, "easy");
        submit(&mut f.store, "bob", 999, "easy");
        submit(&mut f.store, "alice", 300, "hard");
        submit(&mut f.store, "ALICE", 201, "medium");

        let stats = f.store.player_stats("aLiCe").unwrap();
        assert_eq!(stats.username, "alice");
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.high_score, 300);
        // (100 + 300 + 201) / 3 = 200.33
        assert_eq!(stats.average_score, 200);
        let recent: Vec<i64> = stats.recent_scores.iter().map(|s| s.score).collect();
        assert_eq!(recent, [300, 201, 100]);
        assert_eq!(stats.recent_scores[0].difficulty, "hard");
    }

    #[test]
    fn test_player_stats_recent_scores_capped_and_ranked() {
        let mut f = fixture();
        for score in [10, 70, 20, 60, 30, 50, 40] {
            submit(&mut f.store, "frog", score, "insane");
        }

        let stats = f.store.player_stats("frog").unwrap();
        let recent: Vec<i64> = stats.recent_scores.iter().map(|s| s.score).collect();
        assert_eq!(recent, [70, 60, 50, 40, 30]);
        assert_eq!(stats.total_games, 7);
        assert_eq!(stats.average_score, 40);
    }

    #[test]
    fn test_player_stats_rounds_half_up() {
        let mut f = fixture();
        submit(&mut f.store, "frog", 1, "easy");
        submit(&mut f.store, "frog", 2, "easy");
        assert_eq!(f.store.player_stats("frog").unwrap().average_score, 2);

        let mut g = fixture();
        submit(&mut g.store, "toad", -1, "easy");
        submit(&mut g.store, "toad", -2, "easy");
        assert_eq!(g.store.player_stats("toad").unwrap().average_score, -1);
    }

    #[test]
    fn test_player_stats_not_found() {
        let mut f = fixture();
        submit(&mut f.store, "alice", 1, "easy");

        let err = f.store.player_stats("dave").unwrap_err();
        assert!(matches!(err, Error::PlayerNotFound(ref name) if name == "dave"));
    }

    #[test]
    fn test_clear_empties_memory_and_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        let mut store = ScoreStore::open(SnapshotFile::new(&path));
        submit(&mut store, "alice", 1, "easy");
        submit(&mut store, "bob", 2, "hard");

        store.clear();
        assert!(store.ranked(None, 10).is_empty());
        assert!(store.is_empty());

        let reopened = ScoreStore::open(SnapshotFile::new(&path));
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_reopen_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        let mut store = ScoreStore::open(SnapshotFile::new(&path));
        submit(&mut store, "alice", 5, "easy");
        submit(&mut store, "bob", 5, "easy");
        submit(&mut store, "carol", 9, "easy");

        let reopened = ScoreStore::open(SnapshotFile::new(&path));
        assert_eq!(reopened.records(), store.records());
        assert_eq!(names(&reopened.ranked(None, 10)), ["carol", "alice", "bob"]);
    }

    #[test]
    fn test_open_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();

        let mut store = ScoreStore::open(SnapshotFile::new(&path));
        assert!(store.is_empty());

        submit(&mut store, "alice", 1, "easy");
        let kept = std::fs::read_to_string(store.snapshot().backup_path()).unwrap();
        assert_eq!(kept, "[{\"id\": ");
    }

    #[test]
    fn test_open_legacy_snapshot_with_huge_score_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "username": "alice", "score": 500, "difficulty": "easy",
                 "timestamp": "2024-10-19T12:00:00.000Z", "date": "10/19/2024"},
                {"id": 2, "username": "whale", "score": 10000000000000000000,
                 "difficulty": "easy", "timestamp": "2024-10-19T12:00:01.000Z",
                 "date": "10/19/2024"}
            ]"#,
        )
        .unwrap();

        let mut store = ScoreStore::open(SnapshotFile::new(&path));
        assert_eq!(store.len(), 2);
        submit(&mut store, "bob", 900, "easy");

        let on_disk = SnapshotFile::new(&path).try_load().unwrap();
        let stored: Vec<&str> = on_disk.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(stored, ["alice", "whale", "bob"]);
        assert_eq!(names(&store.ranked(Some("easy"), 1)), ["whale"]);
    }
}
