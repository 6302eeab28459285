//! Validation of inbound score submissions and query parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Maximum stored username length, in characters
pub const MAX_USERNAME_LEN: usize = 20;

/// Leaderboard size when no usable limit is given
pub const DEFAULT_LIMIT: usize = 10;

const INVALID_SUBMISSION: &str =
    "Invalid input. Username, score (number), and difficulty are required.";

/// Raw submission body.
///
/// Fields are kept as untyped JSON so a wrong type surfaces as a validation
/// error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub username: Value,
    pub score: Value,
    pub difficulty: Value,
}

/// A submission that passed validation, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub username: String,
    pub score: i64,
    pub difficulty: String,
}

impl Submission {
    pub fn new(
        username: impl Into<Value>,
        score: impl Into<Value>,
        difficulty: impl Into<Value>,
    ) -> Self {
        Self {
            username: username.into(),
            score: score.into(),
            difficulty: difficulty.into(),
        }
    }

    pub fn validate(&self) -> Result<NewScore> {
        let username = self
            .username
            .as_str()
            .map(normalize_username)
            .filter(|name| !name.is_empty())
            .ok_or_else(invalid)?;

        let score = match &self.score {
            Value::Number(n) => coerce_score(n),
            _ => return Err(invalid()),
        };

        let difficulty = self
            .difficulty
            .as_str()
            .filter(|d| !d.is_empty())
            .ok_or_else(invalid)?
            .to_string();

        Ok(NewScore {
            username,
            score,
            difficulty,
        })
    }
}

fn invalid() -> Error {
    Error::Validation(INVALID_SUBMISSION.to_string())
}

/// Trim surrounding whitespace and cap the length
pub fn normalize_username(raw: &str) -> String {
    raw.trim().chars().take(MAX_USERNAME_LEN).collect()
}

/// Integer part of a JSON number; out-of-range values saturate
pub(crate) fn coerce_score(n: &serde_json::Number) -> i64 {
    if let Some(i) = n.as_i64() {
        i
    } else if n.as_u64().is_some() {
        i64::MAX
    } else {
        // `as` truncates toward zero and saturates at the i64 bounds
        n.as_f64().map(|f| f.trunc() as i64).unwrap_or_default()
    }
}

/// Like [`coerce_score`], for unsigned ids
pub(crate) fn coerce_id(n: &serde_json::Number) -> u64 {
    if let Some(u) = n.as_u64() {
        u
    } else if n.as_i64().is_some() {
        0
    } else {
        n.as_f64().map(|f| f.trunc() as u64).unwrap_or_default()
    }
}

/// Parse the `limit` query parameter.
///
/// Reads the leading integer of the value (`"5abc"` is 5). Missing,
/// non-numeric, zero and negative values fall back to [`DEFAULT_LIMIT`].
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_LIMIT;
    };

    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];

    if negative || digits.is_empty() {
        return DEFAULT_LIMIT;
    }

    match digits.parse::<usize>() {
        Ok(0) => DEFAULT_LIMIT,
        Ok(n) => n,
        // More digits than fit: effectively unbounded
        Err(_) => usize::MAX,
    }
}
