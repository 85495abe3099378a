//! Business announcements.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::expiry;
use crate::id::NewsId;
use crate::validate;

/// A business announcement shown to staff.
///
/// `expires_at` is `None` exactly when `is_permanent` is set. It is fixed
/// at creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: NewsId,
    pub title: String,
    pub content: String,
    pub is_permanent: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        expiry::is_active(now, self.expires_at, self.is_permanent)
    }
}

/// Raw announcement input, prior to validation.
#[derive(Debug, Clone, Default)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub is_permanent: Option<bool>,
}

/// A validated announcement ready for insertion. The store stamps
/// `created_at` and computes `expires_at` from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub is_permanent: bool,
}

impl NewAnnouncement {
    pub fn validate(draft: NewsDraft) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        validate::require_non_empty("title", &draft.title, &mut errors);
        validate::require_non_empty("content", &draft.content, &mut errors);
        ValidationError::check(errors)?;
        Ok(Self {
            title: draft.title,
            content: draft.content,
            is_permanent: draft.is_permanent.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn validates_title_and_content_together() {
        let err = NewAnnouncement::validate(NewsDraft::default()).unwrap_err();
        assert_eq!(err.fields().len(), 2);
    }

    #[test]
    fn defaults_to_expiring() {
        let new = NewAnnouncement::validate(NewsDraft {
            title: "CIERRE TEMPRANO".into(),
            content: "Cerramos a las 18:00 el viernes.".into(),
            is_permanent: None,
        })
        .unwrap();
        assert!(!new.is_permanent);
    }

    #[test]
    fn announcement_activity_follows_expiry() {
        let created: DateTime<Utc> = "2026-03-10T09:30:00Z".parse().unwrap();
        let item = Announcement {
            id: NewsId::new(1),
            title: "OFERTA".into(),
            content: "Dos por uno en fideos.".into(),
            is_permanent: false,
            created_at: created,
            expires_at: expiry::compute_expiry(created, false),
        };
        assert!(item.is_active(created + TimeDelta::days(2)));
        assert!(!item.is_active(created + TimeDelta::days(3)));
    }
}
