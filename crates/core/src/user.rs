//! Registered users.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::id::UserId;
use crate::validate;

/// A registered user account.
///
/// Accounts are created at registration and never mutated or deleted.
/// `password_hash` is an argon2id PHC string; the raw password never
/// reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Raw registration input, prior to validation.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
}

impl UserDraft {
    /// Registration contract: uppercase username, password of at least 8
    /// uppercase letters or digits. All violations are reported together.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        validate::require_uppercase("username", &self.username, &mut errors);
        validate::require_password("password", &self.password, &mut errors);
        ValidationError::check(errors)
    }
}

/// A validated, hashed account ready for insertion. The store assigns the
/// id and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
