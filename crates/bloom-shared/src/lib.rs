//! Shared types and pure logic for the Bloom wellness dashboard.
//!
//! Progress records, the badge catalog, the reward ledger, and streak
//! arithmetic live here so the engine and the UI agree on one model.

pub mod activity;
pub mod badges;
pub mod error;
pub mod progress;
pub mod rewards;
pub mod streak;

pub use activity::Activity;
pub use badges::{catalog, Badge, BadgeRequirement, BadgeSnapshot, Dimension, EarnedBadge};
pub use error::EngineError;
pub use progress::{level_for_xp, ProgressRecord, XP_PER_LEVEL};
pub use rewards::{Reward, RewardKind};
