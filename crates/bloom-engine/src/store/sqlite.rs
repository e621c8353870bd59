//! SQLite-backed progress store.
//!
//! Single connection guarded by a mutex; every call runs on the blocking
//! pool. WAL mode keeps reads cheap while the dashboard writes.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bloom_shared::{EarnedBadge, EngineError, ProgressRecord, Reward, RewardKind};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ProgressPatch, ProgressStore};

/// Database location.
#[derive(Debug, Clone)]
pub enum DbLocation {
    /// $XDG_DATA_HOME/bloom/progress.db (or the platform equivalent).
    User,
    /// Explicit path, used by tests and the config override.
    Custom(PathBuf),
}

impl DbLocation {
    pub fn path(&self) -> Result<PathBuf, EngineError> {
        match self {
            DbLocation::User => {
                let base = dirs::data_dir().ok_or_else(|| {
                    EngineError::Storage("could not determine user data directory".to_string())
                })?;
                Ok(base.join("bloom").join("progress.db"))
            }
            DbLocation::Custom(path) => Ok(path.clone()),
        }
    }
}

/// SQLite store for progress records, earned badges, and the reward
/// ledger. Clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database and initialize its schema.
    pub async fn open(location: DbLocation) -> Result<Self, EngineError> {
        let db_path = location.path()?;

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                EngineError::Storage(format!("failed to create database directory: {e}"))
            })?;
        }

        info!("opening progress database at {}", db_path.display());

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, EngineError> {
            let conn = Connection::open(&db_path).map_err(EngineError::storage)?;

            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(EngineError::storage)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(EngineError::storage)?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(EngineError::storage)?;

            Ok(conn)
        })
        .await
        .map_err(|e| EngineError::Storage(format!("database open task failed: {e}")))??;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), EngineError> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS user_progress (
                    user_id TEXT PRIMARY KEY,
                    level INTEGER NOT NULL,
                    experience_points INTEGER NOT NULL,
                    total_tasks_completed INTEGER NOT NULL,
                    streak_days INTEGER NOT NULL,
                    last_activity_date TEXT
                )",
                [],
            )?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS user_badges (
                    user_id TEXT NOT NULL,
                    badge_id TEXT NOT NULL,
                    earned_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, badge_id)
                )",
                [],
            )?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS user_rewards (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    reward_type TEXT NOT NULL,
                    reward_data TEXT NOT NULL,
                    claimed INTEGER NOT NULL DEFAULT 0,
                    earned_at TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_rewards_user_claimed
                 ON user_rewards(user_id, claimed)",
                [],
            )?;

            debug!("progress schema ready");
            Ok(())
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn).map_err(EngineError::storage)
        })
        .await
        .map_err(|e| EngineError::Storage(format!("database task failed: {e}")))?
    }
}

fn progress_from_row(row: &Row<'_>) -> Result<ProgressRecord, rusqlite::Error> {
    Ok(ProgressRecord {
        user_id: row.get(0)?,
        level: row.get::<_, i64>(1)? as u32,
        experience_points: row.get::<_, i64>(2)? as u64,
        total_tasks_completed: row.get::<_, i64>(3)? as u64,
        streak_days: row.get::<_, i64>(4)? as u32,
        last_activity_date: row.get::<_, Option<NaiveDate>>(5)?,
    })
}

fn reward_from_row(row: &Row<'_>) -> Result<Reward, rusqlite::Error> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let data: String = row.get(3)?;
    let kind: RewardKind = serde_json::from_str(&data)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Reward {
        id,
        user_id: row.get(1)?,
        kind,
        claimed: row.get(4)?,
        earned_at: row.get::<_, DateTime<Utc>>(5)?,
    })
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn fetch_progress(
        &self,
        user_id: &str,
    ) -> Result<Option<ProgressRecord>, EngineError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT user_id, level, experience_points, total_tasks_completed,
                        streak_days, last_activity_date
                 FROM user_progress WHERE user_id = ?1",
                params![user_id],
                progress_from_row,
            )
            .optional()
        })
        .await
    }

    async fn insert_progress(&self, record: &ProgressRecord) -> Result<(), EngineError> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_progress
                     (user_id, level, experience_points, total_tasks_completed,
                      streak_days, last_activity_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.user_id,
                    record.level as i64,
                    record.experience_points as i64,
                    record.total_tasks_completed as i64,
                    record.streak_days as i64,
                    record.last_activity_date,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_progress(
        &self,
        user_id: &str,
        patch: &ProgressPatch,
    ) -> Result<(), EngineError> {
        if patch.is_empty() {
            return Ok(());
        }
        let user_id = user_id.to_string();
        let patch = patch.clone();
        self.with_conn(move |conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(level) = patch.level {
                sets.push("level = ?");
                values.push(Box::new(level as i64));
            }
            if let Some(xp) = patch.experience_points {
                sets.push("experience_points = ?");
                values.push(Box::new(xp as i64));
            }
            if let Some(tasks) = patch.total_tasks_completed {
                sets.push("total_tasks_completed = ?");
                values.push(Box::new(tasks as i64));
            }
            if let Some(streak) = patch.streak_days {
                sets.push("streak_days = ?");
                values.push(Box::new(streak as i64));
            }
            if let Some(date) = patch.last_activity_date {
                sets.push("last_activity_date = ?");
                values.push(Box::new(date));
            }
            values.push(Box::new(user_id));

            let sql = format!(
                "UPDATE user_progress SET {} WHERE user_id = ?",
                sets.join(", ")
            );
            conn.execute(
                &sql,
                rusqlite::params_from_iter(values.iter().map(|value| value.as_ref())),
            )?;
            Ok(())
        })
        .await
    }

    async fn earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>, EngineError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, badge_id, earned_at
                 FROM user_badges WHERE user_id = ?1
                 ORDER BY earned_at",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(EarnedBadge {
                    user_id: row.get(0)?,
                    badge_id: row.get(1)?,
                    earned_at: row.get::<_, DateTime<Utc>>(2)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn insert_earned_badge(&self, badge: &EarnedBadge) -> Result<(), EngineError> {
        let badge = badge.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at)
                 VALUES (?1, ?2, ?3)",
                params![badge.user_id, badge.badge_id, badge.earned_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_reward(&self, reward: &Reward) -> Result<(), EngineError> {
        let data = serde_json::to_string(&reward.kind)
            .map_err(|e| EngineError::Storage(format!("failed to encode reward data: {e}")))?;
        let reward = reward.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_rewards (id, user_id, reward_type, reward_data, claimed, earned_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    reward.id.to_string(),
                    reward.user_id,
                    reward.kind.tag(),
                    data,
                    reward.claimed,
                    reward.earned_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn unclaimed_rewards(&self, user_id: &str) -> Result<Vec<Reward>, EngineError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, reward_type, reward_data, claimed, earned_at
                 FROM user_rewards
                 WHERE user_id = ?1 AND claimed = 0
                 ORDER BY earned_at",
            )?;
            let rows = stmt.query_map(params![user_id], reward_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn claim_reward(&self, user_id: &str, reward_id: Uuid) -> Result<bool, EngineError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE user_rewards SET claimed = 1
                 WHERE id = ?1 AND user_id = ?2 AND claimed = 0",
                params![reward_id.to_string(), user_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_test_store() -> (SqliteStore, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("progress.db");
        let store = SqliteStore::open(DbLocation::Custom(db_path.clone()))
            .await
            .unwrap();
        assert!(db_path.exists());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_progress_round_trip() {
        let (store, _dir) = open_test_store().await;

        let mut record = ProgressRecord::new("user-1");
        record.experience_points = 145;
        record.level = 2;
        record.last_activity_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        store.insert_progress(&record).await.unwrap();

        let fetched = store.fetch_progress("user-1").await.unwrap();
        assert_eq!(fetched, Some(record));
        assert!(store.fetch_progress("user-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_patch_touches_only_set_fields() {
        let (store, _dir) = open_test_store().await;

        let mut record = ProgressRecord::new("user-1");
        record.streak_days = 4;
        store.insert_progress(&record).await.unwrap();

        let patch = ProgressPatch {
            experience_points: Some(110),
            level: Some(2),
            last_activity_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            ..ProgressPatch::default()
        };
        store.update_progress("user-1", &patch).await.unwrap();

        let fetched = store.fetch_progress("user-1").await.unwrap().unwrap();
        assert_eq!(fetched.experience_points, 110);
        assert_eq!(fetched.level, 2);
        assert_eq!(fetched.last_activity_date, NaiveDate::from_ymd_opt(2025, 6, 2));
        assert_eq!(fetched.streak_days, 4);
        assert_eq!(fetched.total_tasks_completed, 0);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_a_no_op() {
        let (store, _dir) = open_test_store().await;

        let patch = ProgressPatch {
            experience_points: Some(10),
            ..ProgressPatch::default()
        };
        store.update_progress("nobody", &patch).await.unwrap();
        assert!(store.fetch_progress("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_badge_insert_is_ignored() {
        let (store, _dir) = open_test_store().await;

        let badge = EarnedBadge::new("user-1", "first_task");
        store.insert_earned_badge(&badge).await.unwrap();
        store.insert_earned_badge(&badge).await.unwrap();

        let held = store.earned_badges("user-1").await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].badge_id, "first_task");
    }

    #[tokio::test]
    async fn test_reward_round_trip_and_claim_filter() {
        let (store, _dir) = open_test_store().await;

        let reward = Reward::experience("user-1", 10, "Task completed");
        store.insert_reward(&reward).await.unwrap();

        let unclaimed = store.unclaimed_rewards("user-1").await.unwrap();
        assert_eq!(unclaimed.len(), 1);
        assert_eq!(unclaimed[0].kind, reward.kind);

        // Wrong owner matches nothing; the row stays unclaimed.
        assert!(!store.claim_reward("user-2", reward.id).await.unwrap());
        assert_eq!(store.unclaimed_rewards("user-1").await.unwrap().len(), 1);

        assert!(store.claim_reward("user-1", reward.id).await.unwrap());
        assert!(store.unclaimed_rewards("user-1").await.unwrap().is_empty());
        assert!(!store.claim_reward("user-1", reward.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_schema_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("progress.db");

        let store = SqliteStore::open(DbLocation::Custom(db_path.clone()))
            .await
            .unwrap();
        store
            .insert_progress(&ProgressRecord::new("user-1"))
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteStore::open(DbLocation::Custom(db_path)).await.unwrap();
        assert!(reopened.fetch_progress("user-1").await.unwrap().is_some());
    }
}
