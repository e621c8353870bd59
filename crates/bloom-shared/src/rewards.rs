//! Reward ledger entries.
//!
//! XP grants and user acknowledgement are separate steps: the engine
//! appends an unclaimed reward at grant time and the UI claims it later.
//! The ledger is append-only; `claimed` is the only field that ever
//! changes, false to true exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reward payload, keyed by kind.
///
/// The engine itself only writes `Experience`; the other kinds are
/// reserved for collaborators (badge celebrations, the pet companion,
/// unlockable backgrounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardKind {
    Experience { amount: u32, reason: String },
    Badge { badge_id: String },
    PetHappiness { amount: u32 },
    Background { background_id: String },
}

impl RewardKind {
    /// Stable tag, also used as the `reward_type` column.
    pub fn tag(&self) -> &'static str {
        match self {
            RewardKind::Experience { .. } => "experience",
            RewardKind::Badge { .. } => "badge",
            RewardKind::PetHappiness { .. } => "pet_happiness",
            RewardKind::Background { .. } => "background",
        }
    }
}

/// Single reward ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: Uuid,
    pub user_id: String,
    pub kind: RewardKind,
    pub claimed: bool,
    pub earned_at: DateTime<Utc>,
}

impl Reward {
    /// New unclaimed experience reward.
    pub fn experience(user_id: impl Into<String>, amount: u32, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind: RewardKind::Experience {
                amount,
                reason: reason.into(),
            },
            claimed: false,
            earned_at: Utc::now(),
        }
    }
}
