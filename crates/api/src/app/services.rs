use std::sync::Arc;

use anyhow::Context;
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::{
    Announcement, NewAnnouncement, NewProduct, NewUser, NewsDraft, NewsId, Product, ProductDraft,
    ProductId, ProductPatch, ProductPatchDraft, User, UserDraft, UserId,
};
use stockroom_store::{MemoryStore, PostgresStore, RecordStore, Session, SessionStore};

use crate::app::errors::ApiError;

/// How many hits product search returns when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// The stores behind the HTTP handlers.
///
/// Handlers never learn which backend is wired in; both implement the same
/// contract, so swapping them changes durability and nothing else.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Select backends from the environment: `USE_PERSISTENT_STORES=true`
/// wires Postgres via `DATABASE_URL`, anything else the in-memory store.
pub async fn build_services() -> anyhow::Result<AppServices> {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;
        let store = Arc::new(
            PostgresStore::connect(&database_url)
                .await
                .context("failed to connect to Postgres")?,
        );
        return Ok(AppServices {
            sessions: store.clone(),
            store,
        });
    }

    Ok(AppServices::in_memory())
}

impl AppServices {
    /// All-in-memory wiring (dev and tests).
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            sessions: store.clone(),
            store,
        }
    }

    pub async fn register(&self, draft: UserDraft, now: DateTime<Utc>) -> Result<User, ApiError> {
        draft.validate()?;
        // Fast duplicate check; the store's uniqueness enforcement stays
        // authoritative under races.
        if self.store.user_by_username(&draft.username).await?.is_some() {
            return Err(ApiError::duplicate("username", draft.username));
        }
        let password_hash = hash_password(&draft.password)?;
        let user = self
            .store
            .insert_user(
                NewUser {
                    username: draft.username,
                    password_hash,
                },
                now,
            )
            .await?;
        Ok(user)
    }

    /// Verify credentials and mint a session. Unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let Some(user) = self.store.user_by_username(username).await? else {
            return Err(ApiError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(self.sessions.create_session(user.id, now).await?)
    }

    pub async fn logout(&self, token: Uuid) -> Result<(), ApiError> {
        self.sessions.revoke_session(token).await?;
        Ok(())
    }

    pub async fn current_user(&self, id: UserId) -> Result<User, ApiError> {
        self.store
            .user(id)
            .await?
            .ok_or(ApiError::NotFound("user"))
    }

    pub async fn create_product(
        &self,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> Result<Product, ApiError> {
        let new = NewProduct::validate(draft)?;
        if self.store.product_by_name(&new.name).await?.is_some() {
            return Err(ApiError::duplicate("name", new.name));
        }
        Ok(self.store.insert_product(new, now).await?)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.store
            .product(id)
            .await?
            .ok_or(ApiError::NotFound("product"))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.store.list_products().await?)
    }

    /// Name search. Queries are uppercased before matching so lookups work
    /// without retyping the storage convention; stored names are already
    /// uppercase.
    pub async fn search_products(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, ApiError> {
        let query = query.trim().to_uppercase();
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        Ok(self.store.search_products(&query, limit).await?)
    }

    pub async fn low_stock_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.store.list_low_stock().await?)
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        draft: ProductPatchDraft,
        now: DateTime<Utc>,
    ) -> Result<Product, ApiError> {
        let patch = ProductPatch::validate(draft)?;
        // An empty patch changes nothing; skip the write so `updated_at`
        // only moves on real mutations.
        if patch.is_empty() {
            return self.product(id).await;
        }
        if let Some(name) = &patch.name {
            if let Some(existing) = self.store.product_by_name(name).await? {
                if existing.id != id {
                    return Err(ApiError::duplicate("name", name.clone()));
                }
            }
        }
        self.store
            .update_product(id, patch, now)
            .await?
            .ok_or(ApiError::NotFound("product"))
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<bool, ApiError> {
        Ok(self.store.delete_product(id).await?)
    }

    pub async fn create_news(
        &self,
        draft: NewsDraft,
        now: DateTime<Utc>,
    ) -> Result<Announcement, ApiError> {
        let new = NewAnnouncement::validate(draft)?;
        Ok(self.store.insert_news(new, now).await?)
    }

    /// Active announcements in creation order. Expired rows are swept out
    /// before listing, so reads keep the table tidy without a background
    /// job.
    pub async fn list_news(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>, ApiError> {
        self.store.sweep_expired(now).await?;
        Ok(self.store.list_active_news(now).await?)
    }

    pub async fn sweep_expired_news(&self, now: DateTime<Utc>) -> Result<u64, ApiError> {
        Ok(self.store.sweep_expired(now).await?)
    }

    pub async fn delete_news(&self, id: NewsId) -> Result<bool, ApiError> {
        Ok(self.store.delete_news(id).await?)
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| ApiError::Internal(format!("stored password hash is malformed: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
