//! Bloom progress engine.
//!
//! Turns discrete user activities (completed tasks, mood entries, journal
//! entries, word games, daily streak claims) into durable experience,
//! level, badge, and reward state behind an async library API. The UI
//! layer constructs one [`engine::ProgressEngine`] at startup with its
//! storage and identity collaborators and calls it in response to user
//! actions.

pub mod config;
pub mod engine;
pub mod identity;
pub mod store;

pub use config::{BloomConfig, DatabaseConfig, XpConfig};
pub use engine::{ActivityOutcome, ProgressEngine, ProgressOverview, StreakClaim};
pub use identity::{FixedIdentity, IdentityProvider};
pub use store::{DbLocation, MemoryStore, ProgressPatch, ProgressStore, SqliteStore};
