//! In-memory progress store for deterministic testing.
//!
//! Same observable semantics as the SQLite store, plus failure injection
//! so storage-error propagation and partial-failure sequences can be
//! exercised without a real database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bloom_shared::{EarnedBadge, EngineError, ProgressRecord, Reward};
use uuid::Uuid;

use super::{ProgressPatch, ProgressStore};

#[derive(Default)]
struct MemoryInner {
    progress: HashMap<String, ProgressRecord>,
    badges: Vec<EarnedBadge>,
    rewards: Vec<Reward>,
    /// Remaining calls that succeed before the injected failure fires.
    /// `Some((0, msg))` fails every call.
    fail_after: Option<(usize, String)>,
}

impl MemoryInner {
    fn check_failure(&mut self) -> Result<(), EngineError> {
        match &mut self.fail_after {
            Some((0, message)) => Err(EngineError::Storage(message.clone())),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// HashMap-backed store. Clones share state, so a test can hold a handle
/// to the store it handed the engine.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error.
    pub fn fail_with(&self, message: &str) {
        self.fail_after(0, message);
    }

    /// Let the next `calls` calls succeed, then fail every call after.
    pub fn fail_after(&self, calls: usize, message: &str) {
        self.inner.lock().unwrap().fail_after = Some((calls, message.to_string()));
    }

    /// Clear an injected failure.
    pub fn heal(&self) {
        self.inner.lock().unwrap().fail_after = None;
    }

    /// All earned-badge rows, for assertions.
    pub fn badge_rows(&self) -> Vec<EarnedBadge> {
        self.inner.lock().unwrap().badges.clone()
    }

    /// All reward rows (claimed and unclaimed), for assertions.
    pub fn reward_rows(&self) -> Vec<Reward> {
        self.inner.lock().unwrap().rewards.clone()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn fetch_progress(
        &self,
        user_id: &str,
    ) -> Result<Option<ProgressRecord>, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        Ok(inner.progress.get(user_id).cloned())
    }

    async fn insert_progress(&self, record: &ProgressRecord) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        inner
            .progress
            .insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn update_progress(
        &self,
        user_id: &str,
        patch: &ProgressPatch,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        if let Some(record) = inner.progress.get_mut(user_id) {
            patch.apply(record);
        }
        Ok(())
    }

    async fn earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        Ok(inner
            .badges
            .iter()
            .filter(|badge| badge.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_earned_badge(&self, badge: &EarnedBadge) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        let already_held = inner
            .badges
            .iter()
            .any(|held| held.user_id == badge.user_id && held.badge_id == badge.badge_id);
        if !already_held {
            inner.badges.push(badge.clone());
        }
        Ok(())
    }

    async fn insert_reward(&self, reward: &Reward) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        inner.rewards.push(reward.clone());
        Ok(())
    }

    async fn unclaimed_rewards(&self, user_id: &str) -> Result<Vec<Reward>, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        Ok(inner
            .rewards
            .iter()
            .filter(|reward| reward.user_id == user_id && !reward.claimed)
            .cloned()
            .collect())
    }

    async fn claim_reward(&self, user_id: &str, reward_id: Uuid) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure()?;
        let matched = inner
            .rewards
            .iter_mut()
            .find(|reward| reward.id == reward_id && reward.user_id == user_id && !reward.claimed);
        match matched {
            Some(reward) => {
                reward.claimed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
