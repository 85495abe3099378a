//! Login sessions.

use chrono::{DateTime, Days, Utc};
use uuid::Uuid;

use stockroom_core::UserId;

/// Sessions expire seven days after login.
pub const SESSION_TTL_DAYS: u64 = 7;

/// A bearer-token login session.
///
/// The token is a UUIDv7 minted at login; it is the only credential a
/// client holds after authenticating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Mint a fresh session for `user_id`, expiring [`SESSION_TTL_DAYS`]
    /// from `now`.
    pub fn issue(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::now_v7(),
            user_id,
            created_at: now,
            expires_at: now
                .checked_add_days(Days::new(SESSION_TTL_DAYS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn sessions_expire_after_seven_days() {
        let now: DateTime<Utc> = "2026-03-10T09:30:00Z".parse().unwrap();
        let session = Session::issue(UserId::new(1), now);
        assert!(session.is_live(now));
        assert!(session.is_live(now + TimeDelta::days(6)));
        assert!(!session.is_live(now + TimeDelta::days(7)));
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let now: DateTime<Utc> = "2026-03-10T09:30:00Z".parse().unwrap();
        let a = Session::issue(UserId::new(1), now);
        let b = Session::issue(UserId::new(1), now);
        assert_ne!(a.token, b.token);
    }
}
