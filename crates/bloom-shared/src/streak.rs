//! Daily-streak calendar arithmetic.
//!
//! Works on calendar dates, not 24-hour windows: an activity at 23:59
//! followed by one at 00:01 counts as consecutive days.

use chrono::NaiveDate;

/// Whether the streak was already claimed on `today`.
///
/// `last_activity` is the record's last activity date, which every
/// XP-granting operation moves forward, so any activity today blocks a
/// second streak claim.
pub fn claimed_today(last_activity: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_activity == Some(today)
}

/// Streak count after a claim on `today`.
///
/// A gap of exactly one calendar day continues the streak; any other gap
/// (same day, multi-day, or no previous activity) restarts it at 1. The
/// same-day case is normally unreachable because callers check
/// [`claimed_today`] first; restarting is the fallback if they don't.
pub fn advance(streak_days: u32, last_activity: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_activity {
        Some(last) if today.signed_duration_since(last).num_days() == 1 => streak_days + 1,
        _ => 1,
    }
}
