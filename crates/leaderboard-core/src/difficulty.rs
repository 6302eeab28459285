use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Difficulties that get their own board in the all-difficulties summary.
///
/// Records keep their difficulty as a raw string, so values outside this set
/// are still stored and can be queried explicitly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Insane,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Insane];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Exact (case-sensitive) match against a stored difficulty string
    pub fn matches(&self, raw: &str) -> bool {
        self.as_str() == raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_difficulty_names() {
        assert_eq!(Difficulty::Easy.as_str(), "easy");
        assert_eq!(Difficulty::Insane.to_string(), "insane");
        assert_eq!(Difficulty::from_str("hard").unwrap(), Difficulty::Hard);
        assert!(Difficulty::from_str("nightmare").is_err());
    }

    #[test]
    fn test_difficulty_matches_is_case_sensitive() {
        assert!(Difficulty::Medium.matches("medium"));
        assert!(!Difficulty::Medium.matches("Medium"));
    }

    #[test]
    fn test_all_in_board_order() {
        let mut sorted = Difficulty::ALL;
        sorted.sort();
        assert_eq!(sorted, Difficulty::ALL);
    }
}
