//! Per-user progress record and level arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Experience points needed to advance one level.
pub const XP_PER_LEVEL: u64 = 100;

/// Level implied by a total experience-point count.
///
/// Level 1 covers 0..=99 XP, level 2 covers 100..=199, and so on.
pub fn level_for_xp(xp: u64) -> u32 {
    (xp / XP_PER_LEVEL) as u32 + 1
}

/// Persistent per-user progress state. Only the engine writes this; the
/// UI reads it.
///
/// `experience_points` and `total_tasks_completed` never decrease.
/// `streak_days` resets to 1 when the daily streak breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub level: u32,
    pub experience_points: u64,
    pub total_tasks_completed: u64,
    pub streak_days: u32,
    /// Calendar date of the most recent engine update, `None` until the
    /// first activity.
    pub last_activity_date: Option<NaiveDate>,
}

impl ProgressRecord {
    /// Fresh record for a user with no recorded activity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            level: 1,
            experience_points: 0,
            total_tasks_completed: 0,
            streak_days: 0,
            last_activity_date: None,
        }
    }

    /// XP accumulated inside the current level (0..100).
    pub fn xp_into_level(&self) -> u64 {
        self.experience_points % XP_PER_LEVEL
    }

    /// XP still missing to reach the next level.
    pub fn xp_to_next_level(&self) -> u64 {
        self.level as u64 * XP_PER_LEVEL - self.experience_points
    }

    /// Whether the stored level matches the stored XP.
    pub fn level_is_consistent(&self) -> bool {
        self.level == level_for_xp(self.experience_points)
    }
}
