use uuid::Uuid;

use stockroom_core::UserId;

/// Authenticated identity for a request.
///
/// This is immutable and must be present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: UserId,
    username: String,
}

impl CurrentUser {
    pub fn new(user_id: UserId, username: String) -> Self {
        Self { user_id, username }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// The bearer token that authenticated the request, kept around so logout
/// can revoke exactly the session it arrived on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionToken(pub Uuid);
