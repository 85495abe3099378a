//! Announcement expiry.
//!
//! Expiry is computed once at creation and stored; activity checks and the
//! sweep compare the stored timestamp against a caller-supplied `now` so the
//! rules stay deterministic under test.

use chrono::{DateTime, Days, Utc};

/// Announcements live for three calendar days unless marked permanent.
pub const ANNOUNCEMENT_TTL_DAYS: u64 = 3;

/// Fixed expiration timestamp for an announcement created at `created_at`.
/// Permanent announcements never expire.
pub fn compute_expiry(created_at: DateTime<Utc>, permanent: bool) -> Option<DateTime<Utc>> {
    if permanent {
        return None;
    }
    Some(
        created_at
            .checked_add_days(Days::new(ANNOUNCEMENT_TTL_DAYS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

/// An announcement is active while `now` is strictly before its expiry;
/// `now == expires_at` already counts as expired.
pub fn is_active(now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>, permanent: bool) -> bool {
    permanent || expires_at.is_none_or(|at| now < at)
}
