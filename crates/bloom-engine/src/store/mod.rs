//! Persistence gateway for progress state.
//!
//! The engine owns three tables (progress records, earned badges, the
//! reward ledger) but reaches them only through the [`ProgressStore`]
//! trait, so production code runs on SQLite while tests swap in a
//! deterministic in-memory store. The store does not provide cross-table
//! transactions; each call is atomic on its own.

use async_trait::async_trait;
use bloom_shared::{EarnedBadge, EngineError, ProgressRecord, Reward};
use chrono::NaiveDate;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{DbLocation, SqliteStore};

/// Partial update of a progress row.
///
/// `None` fields are left untouched. A multi-field change (task count
/// plus XP, or streak plus XP) is carried by one patch so it lands in a
/// single store call and the row never exposes half of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressPatch {
    pub level: Option<u32>,
    pub experience_points: Option<u64>,
    pub total_tasks_completed: Option<u64>,
    pub streak_days: Option<u32>,
    pub last_activity_date: Option<NaiveDate>,
}

impl ProgressPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProgressPatch::default()
    }

    /// Apply the patch to an in-memory copy of a record.
    pub fn apply(&self, record: &mut ProgressRecord) {
        if let Some(level) = self.level {
            record.level = level;
        }
        if let Some(xp) = self.experience_points {
            record.experience_points = xp;
        }
        if let Some(tasks) = self.total_tasks_completed {
            record.total_tasks_completed = tasks;
        }
        if let Some(streak) = self.streak_days {
            record.streak_days = streak;
        }
        if let Some(date) = self.last_activity_date {
            record.last_activity_date = Some(date);
        }
    }
}

/// Storage operations the engine needs.
///
/// Every failure surfaces as [`EngineError::Storage`] carrying the
/// underlying cause; implementations never retry.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn fetch_progress(&self, user_id: &str)
        -> Result<Option<ProgressRecord>, EngineError>;

    async fn insert_progress(&self, record: &ProgressRecord) -> Result<(), EngineError>;

    /// Single-row partial update; all fields set in the patch change
    /// together. Updating a missing row is a no-op.
    async fn update_progress(
        &self,
        user_id: &str,
        patch: &ProgressPatch,
    ) -> Result<(), EngineError>;

    async fn earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>, EngineError>;

    /// Insert-only; a (user, badge) pair already present is ignored, not
    /// an error.
    async fn insert_earned_badge(&self, badge: &EarnedBadge) -> Result<(), EngineError>;

    async fn insert_reward(&self, reward: &Reward) -> Result<(), EngineError>;

    async fn unclaimed_rewards(&self, user_id: &str) -> Result<Vec<Reward>, EngineError>;

    /// Flip `claimed` on the unclaimed reward matching both id and owner.
    /// Returns whether a row matched.
    async fn claim_reward(&self, user_id: &str, reward_id: Uuid) -> Result<bool, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply_merges_fields() {
        let mut record = ProgressRecord::new("user-1");
        let patch = ProgressPatch {
            experience_points: Some(110),
            level: Some(2),
            last_activity_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..ProgressPatch::default()
        };
        patch.apply(&mut record);

        assert_eq!(record.experience_points, 110);
        assert_eq!(record.level, 2);
        assert_eq!(record.last_activity_date, NaiveDate::from_ymd_opt(2025, 6, 1));
        // Untouched fields keep their values.
        assert_eq!(record.total_tasks_completed, 0);
        assert_eq!(record.streak_days, 0);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProgressPatch::default().is_empty());
        let patch = ProgressPatch {
            streak_days: Some(1),
            ..ProgressPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
