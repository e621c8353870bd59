//! Progress engine: turns user activities into durable progress, badge,
//! and reward state.
//!
//! The engine is constructed once at startup with its storage and
//! identity collaborators injected; there is no global instance. Every
//! operation resolves the signed-in user first and no-ops (returns
//! `Ok(None)`) when nobody is signed in.
//!
//! Operations are read-then-write without optimistic locking: two
//! overlapping operations for the same user can lose one update. A
//! single signed-in device is the design target. Likewise, the progress
//! write, the reward append, and badge inserts are separate store calls
//! with no cross-call transaction; a failure in between leaves the
//! earlier writes in place and surfaces the error, and callers should
//! re-read via [`ProgressEngine::fetch_progress`] for persisted truth.

use std::collections::HashSet;
use std::sync::Mutex;

use bloom_shared::badges::{self, Badge, BadgeSnapshot, Dimension, EarnedBadge};
use bloom_shared::{level_for_xp, streak, Activity, EngineError, ProgressRecord, Reward};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::XpConfig;
use crate::identity::IdentityProvider;
use crate::store::{ProgressPatch, ProgressStore};

/// Aggregate view returned by [`ProgressEngine::fetch_progress`].
#[derive(Debug, Clone)]
pub struct ProgressOverview {
    pub progress: ProgressRecord,
    pub badges: Vec<EarnedBadge>,
    pub unclaimed_rewards: Vec<Reward>,
}

/// Result of one XP-granting activity.
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    /// Record state as written by this operation.
    pub progress: ProgressRecord,
    pub xp_granted: u32,
    /// Badges newly earned by this operation, in catalog order.
    pub new_badges: Vec<&'static Badge>,
}

/// Result of a daily-streak claim.
#[derive(Debug, Clone)]
pub enum StreakClaim {
    Claimed(ActivityOutcome),
    /// The record already shows activity on this calendar day; nothing
    /// was written and no XP was granted.
    AlreadyClaimedToday { streak_days: u32 },
}

/// The progress engine. Generic over its store and identity provider so
/// tests run against the in-memory fakes.
pub struct ProgressEngine<S, I> {
    store: S,
    identity: I,
    xp: XpConfig,
    /// Badges earned since the UI last acknowledged them. Transient.
    new_badges: Mutex<Vec<&'static Badge>>,
}

impl<S: ProgressStore, I: IdentityProvider> ProgressEngine<S, I> {
    pub fn new(store: S, identity: I) -> Self {
        Self::with_xp(store, identity, XpConfig::default())
    }

    pub fn with_xp(store: S, identity: I, xp: XpConfig) -> Self {
        Self {
            store,
            identity,
            xp,
            new_badges: Mutex::new(Vec::new()),
        }
    }

    /// Aggregate progress view for the signed-in user, creating a default
    /// record on first request.
    pub async fn fetch_progress(&self) -> Result<Option<ProgressOverview>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            return Ok(None);
        };

        let progress = self.ensure_progress(&user_id).await?;
        let badges = self.store.earned_badges(&user_id).await?;
        let unclaimed_rewards = self.store.unclaimed_rewards(&user_id).await?;

        Ok(Some(ProgressOverview {
            progress,
            badges,
            unclaimed_rewards,
        }))
    }

    /// Record a completed task: +1 task count and the task XP award in a
    /// single progress write, then badge evaluation over tasks, level,
    /// and streak.
    pub async fn complete_task(&self) -> Result<Option<ActivityOutcome>, EngineError> {
        self.complete_task_on(Utc::now().date_naive()).await
    }

    /// Date-explicit variant of [`ProgressEngine::complete_task`].
    pub async fn complete_task_on(
        &self,
        today: NaiveDate,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring task completion");
            return Ok(None);
        };
        let current = self.ensure_progress(&user_id).await?;

        let patch = ProgressPatch {
            total_tasks_completed: Some(current.total_tasks_completed + 1),
            ..ProgressPatch::default()
        };
        let (progress, xp_granted) = self
            .grant_experience(&current, Activity::TaskCompleted, today, patch)
            .await?;

        let new_badges = self
            .evaluate_badges(
                &user_id,
                BadgeSnapshot::from_progress(&progress),
                &[Dimension::Tasks, Dimension::Level, Dimension::Streak],
            )
            .await?;

        Ok(Some(ActivityOutcome {
            progress,
            xp_granted,
            new_badges,
        }))
    }

    /// Record a mood entry. `entries_logged` is the mood tracker's
    /// running entry count; the engine keeps no count of its own and
    /// uses it only for mood badge thresholds.
    pub async fn track_mood(
        &self,
        entries_logged: u64,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        self.track_mood_on(entries_logged, Utc::now().date_naive())
            .await
    }

    pub async fn track_mood_on(
        &self,
        entries_logged: u64,
        today: NaiveDate,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring mood entry");
            return Ok(None);
        };
        let current = self.ensure_progress(&user_id).await?;

        let (progress, xp_granted) = self
            .grant_experience(
                &current,
                Activity::MoodTracked,
                today,
                ProgressPatch::default(),
            )
            .await?;

        let snapshot = BadgeSnapshot::from_progress(&progress).with_mood_entries(entries_logged);
        let new_badges = self
            .evaluate_badges(&user_id, snapshot, &[Dimension::MoodEntries])
            .await?;

        Ok(Some(ActivityOutcome {
            progress,
            xp_granted,
            new_badges,
        }))
    }

    /// Record a journal entry. `entries_written` is the journal's running
    /// entry count, used for journal badge thresholds.
    pub async fn write_journal(
        &self,
        entries_written: u64,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        self.write_journal_on(entries_written, Utc::now().date_naive())
            .await
    }

    pub async fn write_journal_on(
        &self,
        entries_written: u64,
        today: NaiveDate,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring journal entry");
            return Ok(None);
        };
        let current = self.ensure_progress(&user_id).await?;

        let (progress, xp_granted) = self
            .grant_experience(
                &current,
                Activity::JournalEntry,
                today,
                ProgressPatch::default(),
            )
            .await?;

        let snapshot =
            BadgeSnapshot::from_progress(&progress).with_journal_entries(entries_written);
        let new_badges = self
            .evaluate_badges(&user_id, snapshot, &[Dimension::JournalEntries])
            .await?;

        Ok(Some(ActivityOutcome {
            progress,
            xp_granted,
            new_badges,
        }))
    }

    /// Record a solved Wordle. Pure XP grant; no badge dimension exists
    /// for word games.
    pub async fn complete_wordle(&self) -> Result<Option<ActivityOutcome>, EngineError> {
        self.complete_wordle_on(Utc::now().date_naive()).await
    }

    pub async fn complete_wordle_on(
        &self,
        today: NaiveDate,
    ) -> Result<Option<ActivityOutcome>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring wordle completion");
            return Ok(None);
        };
        let current = self.ensure_progress(&user_id).await?;

        let (progress, xp_granted) = self
            .grant_experience(
                &current,
                Activity::WordleCompleted,
                today,
                ProgressPatch::default(),
            )
            .await?;

        Ok(Some(ActivityOutcome {
            progress,
            xp_granted,
            new_badges: Vec::new(),
        }))
    }

    /// Claim the daily streak. A second claim on the same calendar day is
    /// refused without touching the record; note that any XP-granting
    /// activity moves `last_activity_date` forward, so the streak claim
    /// must be the day's first claim but not necessarily its first
    /// activity on a continued streak.
    pub async fn claim_daily_streak(&self) -> Result<Option<StreakClaim>, EngineError> {
        self.claim_daily_streak_on(Utc::now().date_naive()).await
    }

    pub async fn claim_daily_streak_on(
        &self,
        today: NaiveDate,
    ) -> Result<Option<StreakClaim>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring streak claim");
            return Ok(None);
        };
        let current = self.ensure_progress(&user_id).await?;

        if streak::claimed_today(current.last_activity_date, today) {
            debug!(user = %user_id, "streak already claimed today");
            return Ok(Some(StreakClaim::AlreadyClaimedToday {
                streak_days: current.streak_days,
            }));
        }

        let streak_days = streak::advance(current.streak_days, current.last_activity_date, today);
        let patch = ProgressPatch {
            streak_days: Some(streak_days),
            ..ProgressPatch::default()
        };
        let (progress, xp_granted) = self
            .grant_experience(&current, Activity::DailyStreak, today, patch)
            .await?;

        let new_badges = self
            .evaluate_badges(
                &user_id,
                BadgeSnapshot::from_progress(&progress),
                &[Dimension::Streak],
            )
            .await?;

        Ok(Some(StreakClaim::Claimed(ActivityOutcome {
            progress,
            xp_granted,
            new_badges,
        })))
    }

    /// Acknowledge an unclaimed reward. The XP was granted when the
    /// reward was created; claiming only clears it from the unclaimed
    /// list. Fails with `NotFound` when the id does not name one of the
    /// signed-in user's unclaimed rewards.
    pub async fn claim_reward(&self, reward_id: Uuid) -> Result<Option<()>, EngineError> {
        let Some(user_id) = self.identity.current_user() else {
            debug!("no signed-in user, ignoring reward claim");
            return Ok(None);
        };

        let claimed = self.store.claim_reward(&user_id, reward_id).await?;
        if !claimed {
            warn!(user = %user_id, reward = %reward_id, "reward claim matched no unclaimed row");
            return Err(EngineError::NotFound(format!(
                "no unclaimed reward {reward_id} for this user"
            )));
        }

        debug!(user = %user_id, reward = %reward_id, "reward claimed");
        Ok(Some(()))
    }

    /// Badges earned since the last [`ProgressEngine::clear_new_badges`]
    /// call, for celebratory display. Transient, never persisted.
    pub fn new_badges(&self) -> Vec<&'static Badge> {
        self.new_badges.lock().unwrap().clone()
    }

    /// Acknowledge the new-badge notifications.
    pub fn clear_new_badges(&self) {
        self.new_badges.lock().unwrap().clear();
    }

    /// Read the record for `user_id`, creating and persisting the default
    /// record when none exists yet.
    async fn ensure_progress(&self, user_id: &str) -> Result<ProgressRecord, EngineError> {
        if let Some(record) = self.store.fetch_progress(user_id).await? {
            return Ok(record);
        }
        info!(user = %user_id, "creating initial progress record");
        let record = ProgressRecord::new(user_id);
        self.store.insert_progress(&record).await?;
        Ok(record)
    }

    /// Apply an XP grant on top of `current`: merge the new XP total,
    /// level, and activity date into `patch` (so caller-supplied fields
    /// like the task count land in the same write), persist it, and
    /// append the unclaimed ledger entry. Badge evaluation is the
    /// caller's responsibility.
    async fn grant_experience(
        &self,
        current: &ProgressRecord,
        activity: Activity,
        today: NaiveDate,
        mut patch: ProgressPatch,
    ) -> Result<(ProgressRecord, u32), EngineError> {
        let amount = self.xp.amount(activity);
        if amount == 0 {
            return Err(EngineError::Validation(format!(
                "configured XP amount for {activity:?} must be positive"
            )));
        }

        let new_xp = current.experience_points + amount as u64;
        patch.experience_points = Some(new_xp);
        patch.level = Some(level_for_xp(new_xp));
        patch.last_activity_date = Some(today);

        self.store.update_progress(&current.user_id, &patch).await?;

        let mut updated = current.clone();
        patch.apply(&mut updated);

        let reward = Reward::experience(current.user_id.as_str(), amount, activity.reason());
        self.store.insert_reward(&reward).await?;

        debug!(
            user = %current.user_id,
            amount,
            reason = activity.reason(),
            "experience granted"
        );
        Ok((updated, amount))
    }

    /// Insert any badges newly satisfied by `snapshot` within
    /// `dimensions` and queue them for display. Returns them in catalog
    /// order. Ids already in the earned set are skipped, so a badge is
    /// inserted at most once per user.
    async fn evaluate_badges(
        &self,
        user_id: &str,
        snapshot: BadgeSnapshot,
        dimensions: &[Dimension],
    ) -> Result<Vec<&'static Badge>, EngineError> {
        let earned = self.store.earned_badges(user_id).await?;
        let earned_ids: HashSet<&str> = earned.iter().map(|badge| badge.badge_id.as_str()).collect();

        let newly = badges::qualifying_badges(&snapshot, dimensions, &earned_ids);
        for badge in &newly {
            self.store
                .insert_earned_badge(&EarnedBadge::new(user_id, badge.id))
                .await?;
            info!(user = %user_id, badge = badge.id, "badge earned");
        }

        if !newly.is_empty() {
            self.new_badges.lock().unwrap().extend(newly.iter().copied());
        }
        Ok(newly)
    }
}
