//! `stockroom-store` — record persistence for the inventory domain.
//!
//! Two interchangeable backends implement the same capability traits:
//! [`MemoryStore`] for tests and development, [`PostgresStore`] for
//! production. Callers hold `Arc<dyn RecordStore>` and never branch on
//! which backend is behind it; semantic differences between the two are
//! bugs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod session;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use session::{SESSION_TTL_DAYS, Session};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::{
    Announcement, NewAnnouncement, NewProduct, NewUser, NewsId, Product, ProductId, ProductPatch,
    User, UserId,
};

/// Durable records behind the request handlers.
///
/// Identifier assignment is the store's job: ids increase monotonically and
/// are never reused, even after the record they belonged to is deleted.
/// Uniqueness (usernames, product names) is enforced inside the same write
/// serialization that performs the insert, so two racing writers cannot
/// both succeed.
///
/// Reads of missing records return `Ok(None)`; only genuine backend
/// failures surface as `Err`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a validated user. Fails with [`StoreError::Duplicate`] when
    /// the username is taken.
    async fn insert_user(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a validated product, deriving its sale price at write time.
    /// Fails with [`StoreError::Duplicate`] when the name is taken.
    async fn insert_product(
        &self,
        new: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// All products, ordered by name ascending.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Products whose name contains `query`, sorted by name ascending and
    /// only then truncated to `limit`.
    async fn search_products(&self, query: &str, limit: usize)
    -> Result<Vec<Product>, StoreError>;

    /// Products below their configured minimum stock, by name ascending.
    async fn list_low_stock(&self) -> Result<Vec<Product>, StoreError>;

    /// Merge `patch` into the stored product under the backend's write
    /// serialization and re-derive the sale price. Returns `Ok(None)` when
    /// the product does not exist; that takes precedence over any name
    /// conflict the patch would otherwise raise.
    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError>;

    /// Returns `false` when the product was already gone; deleting twice
    /// is not an error.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Insert a validated announcement, stamping `created_at = now` and
    /// computing its expiry from it.
    async fn insert_news(
        &self,
        new: NewAnnouncement,
        now: DateTime<Utc>,
    ) -> Result<Announcement, StoreError>;

    async fn news_item(&self, id: NewsId) -> Result<Option<Announcement>, StoreError>;

    /// Announcements still active at `now`, in creation order (oldest
    /// first).
    async fn list_active_news(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>, StoreError>;

    async fn delete_news(&self, id: NewsId) -> Result<bool, StoreError>;

    /// Remove every announcement expired at `now`, returning how many were
    /// removed. Idempotent: a second sweep at the same instant removes
    /// nothing.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Bearer-token sessions minted at login.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Look up a live session. Expired or unknown tokens return `Ok(None)`.
    async fn find_session(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Returns `false` when no such session existed.
    async fn revoke_session(&self, token: Uuid) -> Result<bool, StoreError>;
}
