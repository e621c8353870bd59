//! Activities that feed the progress engine.

use serde::{Deserialize, Serialize};

/// A user action that grants experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    TaskCompleted,
    MoodTracked,
    JournalEntry,
    WordleCompleted,
    DailyStreak,
}

impl Activity {
    /// Reason string recorded on the reward ledger entry.
    pub fn reason(self) -> &'static str {
        match self {
            Activity::TaskCompleted => "Task completed",
            Activity::MoodTracked => "Mood tracked",
            Activity::JournalEntry => "Journal entry",
            Activity::WordleCompleted => "Wordle completed",
            Activity::DailyStreak => "Daily streak claimed",
        }
    }

    /// Built-in XP award for this activity.
    pub fn default_xp(self) -> u32 {
        match self {
            Activity::TaskCompleted => 10,
            Activity::MoodTracked => 5,
            Activity::JournalEntry => 15,
            Activity::WordleCompleted => 20,
            Activity::DailyStreak => 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_are_ledger_strings() {
        assert_eq!(Activity::TaskCompleted.reason(), "Task completed");
        assert_eq!(Activity::DailyStreak.reason(), "Daily streak claimed");
    }

    #[test]
    fn test_default_amounts() {
        assert_eq!(Activity::TaskCompleted.default_xp(), 10);
        assert_eq!(Activity::MoodTracked.default_xp(), 5);
        assert_eq!(Activity::JournalEntry.default_xp(), 15);
        assert_eq!(Activity::WordleCompleted.default_xp(), 20);
        assert_eq!(Activity::DailyStreak.default_xp(), 20);
    }

    #[test]
    fn test_snake_case_serialization() {
        let json = serde_json::to_string(&Activity::WordleCompleted).unwrap();
        assert_eq!(json, "\"wordle_completed\"");
    }
}
