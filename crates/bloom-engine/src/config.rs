//! Engine configuration.
//!
//! Config file: ~/.config/bloom/config.toml, overridable with the
//! BLOOM_CONFIG environment variable. A missing file means defaults;
//! a present file only needs the keys it wants to change.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use bloom_shared::Activity;

use crate::store::DbLocation;

fn default_task_xp() -> u32 {
    Activity::TaskCompleted.default_xp()
}
fn default_mood_xp() -> u32 {
    Activity::MoodTracked.default_xp()
}
fn default_journal_xp() -> u32 {
    Activity::JournalEntry.default_xp()
}
fn default_wordle_xp() -> u32 {
    Activity::WordleCompleted.default_xp()
}
fn default_streak_xp() -> u32 {
    Activity::DailyStreak.default_xp()
}

/// XP awarded per activity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_task_xp")]
    pub task: u32,
    #[serde(default = "default_mood_xp")]
    pub mood: u32,
    #[serde(default = "default_journal_xp")]
    pub journal: u32,
    #[serde(default = "default_wordle_xp")]
    pub wordle: u32,
    #[serde(default = "default_streak_xp")]
    pub streak: u32,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            task: default_task_xp(),
            mood: default_mood_xp(),
            journal: default_journal_xp(),
            wordle: default_wordle_xp(),
            streak: default_streak_xp(),
        }
    }
}

impl XpConfig {
    /// Configured amount for one activity.
    pub fn amount(&self, activity: Activity) -> u32 {
        match activity {
            Activity::TaskCompleted => self.task,
            Activity::MoodTracked => self.mood,
            Activity::JournalEntry => self.journal,
            Activity::WordleCompleted => self.wordle,
            Activity::DailyStreak => self.streak,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database path. Unset means the per-user data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn location(&self) -> DbLocation {
        match &self.path {
            Some(path) => DbLocation::Custom(path.clone()),
            None => DbLocation::User,
        }
    }
}

/// Main Bloom configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloomConfig {
    #[serde(default)]
    pub xp: XpConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl BloomConfig {
    /// Resolve the config file path (env override first).
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("BLOOM_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("bloom").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to encode config")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config at {}", path.display()))?;
        Ok(())
    }
}
