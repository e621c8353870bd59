//! Badge catalog and threshold evaluation.
//!
//! The catalog is static and ordered; evaluation and earned-badge
//! insertion both follow catalog order so results are deterministic.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::ProgressRecord;

/// Counter a badge threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Tasks,
    Streak,
    Level,
    MoodEntries,
    JournalEntries,
}

/// Single-dimension numeric requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRequirement {
    pub dimension: Dimension,
    pub threshold: u64,
}

/// Badge definition. Name, description, icon, and color are display
/// metadata the engine never interprets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub requirement: BadgeRequirement,
}

impl Badge {
    const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        icon: &'static str,
        color: &'static str,
        dimension: Dimension,
        threshold: u64,
    ) -> Self {
        Self {
            id,
            name,
            description,
            icon,
            color,
            requirement: BadgeRequirement { dimension, threshold },
        }
    }
}

const CATALOG: [Badge; 8] = [
    Badge::new(
        "first_task",
        "Getting Started",
        "Complete your first task",
        "🎯",
        "bg-blue-500",
        Dimension::Tasks,
        1,
    ),
    Badge::new(
        "task_master",
        "Task Master",
        "Complete 10 tasks",
        "⭐",
        "bg-yellow-500",
        Dimension::Tasks,
        10,
    ),
    Badge::new(
        "productivity_hero",
        "Productivity Hero",
        "Complete 50 tasks",
        "🏆",
        "bg-gold-500",
        Dimension::Tasks,
        50,
    ),
    Badge::new(
        "streak_starter",
        "Streak Starter",
        "Maintain a 3-day streak",
        "🔥",
        "bg-orange-500",
        Dimension::Streak,
        3,
    ),
    Badge::new(
        "consistency_king",
        "Consistency King",
        "Maintain a 7-day streak",
        "👑",
        "bg-purple-500",
        Dimension::Streak,
        7,
    ),
    Badge::new(
        "level_up",
        "Level Up",
        "Reach level 5",
        "📈",
        "bg-green-500",
        Dimension::Level,
        5,
    ),
    Badge::new(
        "mood_tracker",
        "Mood Tracker",
        "Track your mood 7 times",
        "😊",
        "bg-pink-500",
        Dimension::MoodEntries,
        7,
    ),
    Badge::new(
        "journal_writer",
        "Journal Writer",
        "Write 10 journal entries",
        "📝",
        "bg-indigo-500",
        Dimension::JournalEntries,
        10,
    ),
];

/// The ordered badge catalog.
pub fn catalog() -> &'static [Badge] {
    &CATALOG
}

/// Look up a catalog badge by id.
pub fn badge_by_id(id: &str) -> Option<&'static Badge> {
    CATALOG.iter().find(|badge| badge.id == id)
}

/// Record of a badge a user holds. Insert-only, exactly one row per
/// (user, badge) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

impl EarnedBadge {
    pub fn new(user_id: impl Into<String>, badge_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            badge_id: badge_id.into(),
            earned_at: Utc::now(),
        }
    }
}

/// Counter values a badge evaluation runs against.
///
/// Tasks, streak, and level come straight off the progress record. The
/// mood and journal entry counts are owned by their collaborators and
/// must be supplied by the caller; a missing count means badges on that
/// dimension never qualify.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadgeSnapshot {
    pub tasks: u64,
    pub streak: u64,
    pub level: u64,
    pub mood_entries: Option<u64>,
    pub journal_entries: Option<u64>,
}

impl BadgeSnapshot {
    pub fn from_progress(progress: &ProgressRecord) -> Self {
        Self {
            tasks: progress.total_tasks_completed,
            streak: progress.streak_days as u64,
            level: progress.level as u64,
            mood_entries: None,
            journal_entries: None,
        }
    }

    pub fn with_mood_entries(mut self, count: u64) -> Self {
        self.mood_entries = Some(count);
        self
    }

    pub fn with_journal_entries(mut self, count: u64) -> Self {
        self.journal_entries = Some(count);
        self
    }

    fn value(&self, dimension: Dimension) -> Option<u64> {
        match dimension {
            Dimension::Tasks => Some(self.tasks),
            Dimension::Streak => Some(self.streak),
            Dimension::Level => Some(self.level),
            Dimension::MoodEntries => self.mood_entries,
            Dimension::JournalEntries => self.journal_entries,
        }
    }
}

/// Badges newly satisfied by `snapshot`, restricted to `dimensions` and
/// excluding ids already in `earned`. Catalog order.
pub fn qualifying_badges(
    snapshot: &BadgeSnapshot,
    dimensions: &[Dimension],
    earned: &HashSet<&str>,
) -> Vec<&'static Badge> {
    CATALOG
        .iter()
        .filter(|badge| dimensions.contains(&badge.requirement.dimension))
        .filter(|badge| !earned.contains(badge.id))
        .filter(|badge| {
            snapshot
                .value(badge.requirement.dimension)
                .is_some_and(|value| value >= badge.requirement.threshold)
        })
        .collect()
}
