//! In-memory backend.
//!
//! Intended for tests and development. Writes serialize on per-collection
//! `RwLock`s; the duplicate check, id assignment and insert all happen
//! under the same write guard.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::{
    Announcement, NewAnnouncement, NewProduct, NewUser, NewsId, Product, ProductId, ProductPatch,
    User, UserId, expiry,
};

use crate::error::StoreError;
use crate::session::Session;
use crate::{RecordStore, SessionStore};

/// In-memory record and session store.
///
/// Identifiers come from per-collection counters that only ever move
/// forward, so a deleted record's id is never handed out again.
#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<UserId, User>>,
    products: RwLock<BTreeMap<ProductId, Product>>,
    news: RwLock<BTreeMap<NewsId, Announcement>>,
    sessions: RwLock<HashMap<Uuid, Session>>,
    next_user_id: AtomicI64,
    next_product_id: AtomicI64,
    next_news_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            products: RwLock::new(BTreeMap::new()),
            news: RwLock::new(BTreeMap::new()),
            sessions: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_product_id: AtomicI64::new(1),
            next_news_id: AtomicI64::new(1),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("lock poisoned")
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.values().any(|u| u.username == new.username) {
            return Err(StoreError::duplicate("username", new.username));
        }
        let id = UserId::new(self.next_user_id.fetch_add(1, Ordering::Relaxed));
        let user = User {
            id,
            username: new.username,
            password_hash: new.password_hash,
            created_at: now,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_product(
        &self,
        new: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        if products.values().any(|p| p.name == new.name) {
            return Err(StoreError::duplicate("name", new.name));
        }
        let id = ProductId::new(self.next_product_id.fetch_add(1, Ordering::Relaxed));
        let product = Product {
            id,
            sale_price: new.sale_price(),
            name: new.name,
            purchase_price: new.purchase_price,
            profit_margin: new.profit_margin,
            barcode: new.barcode,
            buyer_name: new.buyer_name,
            stock: new.stock,
            min_stock: new.min_stock,
            created_at: now,
            updated_at: now,
        };
        products.insert(id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.get(&id).cloned())
    }

    async fn product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.values().find(|p| p.name == name).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn search_products(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut hits: Vec<Product> = products
            .values()
            .filter(|p| p.name.contains(query))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list_low_stock(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut low: Vec<Product> = products
            .values()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect();
        low.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(low)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        // Existence is decided first; a missing id is `None` even when the
        // patch carries a taken name.
        if !products.contains_key(&id) {
            return Ok(None);
        }
        if let Some(new_name) = &patch.name {
            let taken = products
                .iter()
                .any(|(other_id, p)| *other_id != id && &p.name == new_name);
            if taken {
                return Err(StoreError::duplicate("name", new_name.clone()));
            }
        }
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };
        product.apply_patch(patch, now);
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        Ok(products.remove(&id).is_some())
    }

    async fn insert_news(
        &self,
        new: NewAnnouncement,
        now: DateTime<Utc>,
    ) -> Result<Announcement, StoreError> {
        let mut news = self.news.write().map_err(|_| poisoned())?;
        let id = NewsId::new(self.next_news_id.fetch_add(1, Ordering::Relaxed));
        let item = Announcement {
            id,
            title: new.title,
            content: new.content,
            is_permanent: new.is_permanent,
            created_at: now,
            expires_at: expiry::compute_expiry(now, new.is_permanent),
        };
        news.insert(id, item.clone());
        Ok(item)
    }

    async fn news_item(&self, id: NewsId) -> Result<Option<Announcement>, StoreError> {
        let news = self.news.read().map_err(|_| poisoned())?;
        Ok(news.get(&id).cloned())
    }

    async fn list_active_news(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>, StoreError> {
        let news = self.news.read().map_err(|_| poisoned())?;
        let mut active: Vec<Announcement> =
            news.values().filter(|n| n.is_active(now)).cloned().collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn delete_news(&self, id: NewsId) -> Result<bool, StoreError> {
        let mut news = self.news.write().map_err(|_| poisoned())?;
        Ok(news.remove(&id).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut news = self.news.write().map_err(|_| poisoned())?;
        let before = news.len();
        news.retain(|_, n| n.is_active(now));
        Ok((before - news.len()) as u64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session::issue(user_id, now);
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.insert(session.token, session.clone());
        Ok(session)
    }

    async fn find_session(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.get(&token).filter(|s| s.is_live(now)).cloned())
    }

    async fn revoke_session(&self, token: Uuid) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        Ok(sessions.remove(&token).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use stockroom_core::{NewsDraft, ProductDraft};

    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-10T09:30:00Z".parse().unwrap()
    }

    fn product(name: &str, price: &str) -> NewProduct {
        NewProduct::validate(ProductDraft {
            name: name.into(),
            purchase_price: price.into(),
            ..ProductDraft::default()
        })
        .unwrap()
    }

    fn announcement(title: &str, permanent: bool) -> NewAnnouncement {
        NewAnnouncement::validate(NewsDraft {
            title: title.into(),
            content: "contenido".into(),
            is_permanent: Some(permanent),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_monotonic_ids_and_derives_sale_price() {
        let store = MemoryStore::new();
        let first = store.insert_product(product("ARROZ", "100.00"), now()).await.unwrap();
        let second = store.insert_product(product("AZUCAR", "49.99"), now()).await.unwrap();
        assert_eq!(first.id.get(), 1);
        assert_eq!(second.id.get(), 2);
        assert_eq!(first.sale_price, "120.00".parse().unwrap());
        assert_eq!(second.sale_price, "59.99".parse().unwrap());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = MemoryStore::new();
        store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        let err = store
            .insert_product(product("ARROZ", "12"), now())
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn deleted_ids_are_never_reused() {
        let store = MemoryStore::new();
        let first = store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        assert!(store.delete_product(first.id).await.unwrap());
        let second = store.insert_product(product("AZUCAR", "10"), now()).await.unwrap();
        assert!(second.id.get() > first.id.get());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let item = store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        assert!(store.delete_product(item.id).await.unwrap());
        assert!(!store.delete_product(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_products_orders_by_name_not_insertion() {
        let store = MemoryStore::new();
        for name in ["AZUCAR", "ACEITE", "ARROZ"] {
            store.insert_product(product(name, "10"), now()).await.unwrap();
        }
        let all = store.list_products().await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["ACEITE", "ARROZ", "AZUCAR"]);
    }

    #[tokio::test]
    async fn search_sorts_by_name_before_truncating() {
        let store = MemoryStore::new();
        for name in ["AZUCAR", "ACEITE", "ARROZ", "FIDEOS"] {
            store.insert_product(product(name, "10"), now()).await.unwrap();
        }
        let hits = store.search_products("A", 2).await.unwrap();
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["ACEITE", "ARROZ"]);

        let narrow = store.search_products("AR", 10).await.unwrap();
        let names: Vec<_> = narrow.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["ARROZ"]);
    }

    #[tokio::test]
    async fn search_misses_return_empty() {
        let store = MemoryStore::new();
        store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        assert!(store.search_products("QUINOA", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_rederives_sale_price_and_keeps_other_fields() {
        let store = MemoryStore::new();
        let created = store.insert_product(product("ARROZ", "100.00"), now()).await.unwrap();
        let later = now() + TimeDelta::hours(1);
        let updated = store
            .update_product(
                created.id,
                ProductPatch {
                    purchase_price: Some("50.00".parse().unwrap()),
                    ..ProductPatch::default()
                },
                later,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.sale_price, "60.00".parse().unwrap());
        assert_eq!(updated.name, "ARROZ");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[tokio::test]
    async fn update_to_taken_name_is_rejected() {
        let store = MemoryStore::new();
        store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        let other = store.insert_product(product("AZUCAR", "10"), now()).await.unwrap();
        let err = store
            .update_product(
                other.id,
                ProductPatch {
                    name: Some("ARROZ".into()),
                    ..ProductPatch::default()
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn update_keeping_own_name_is_allowed() {
        let store = MemoryStore::new();
        let item = store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        let updated = store
            .update_product(
                item.id,
                ProductPatch {
                    name: Some("ARROZ".into()),
                    stock: Some(5),
                    ..ProductPatch::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(updated.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn update_missing_product_returns_none() {
        let store = MemoryStore::new();
        let outcome = store
            .update_product(ProductId::new(99), ProductPatch::default(), now())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn update_missing_product_ignores_name_conflicts() {
        let store = MemoryStore::new();
        store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        let outcome = store
            .update_product(
                ProductId::new(999),
                ProductPatch {
                    name: Some("ARROZ".into()),
                    ..ProductPatch::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn low_stock_lists_only_products_below_minimum() {
        let store = MemoryStore::new();
        let a = store.insert_product(product("ARROZ", "10"), now()).await.unwrap();
        store.insert_product(product("AZUCAR", "10"), now()).await.unwrap();
        store
            .update_product(
                a.id,
                ProductPatch {
                    stock: Some(1),
                    min_stock: Some(3),
                    ..ProductPatch::default()
                },
                now(),
            )
            .await
            .unwrap();
        let low = store.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "ARROZ");
    }

    #[tokio::test]
    async fn active_news_hides_expired_items() {
        let store = MemoryStore::new();
        let item = store.insert_news(announcement("OFERTA", false), now()).await.unwrap();
        assert_eq!(item.expires_at, Some(now() + TimeDelta::days(3)));

        let visible = store.list_active_news(now() + TimeDelta::days(2)).await.unwrap();
        assert_eq!(visible.len(), 1);

        // Hidden from the active list, but the record survives until swept.
        let after = store.list_active_news(now() + TimeDelta::days(3)).await.unwrap();
        assert!(after.is_empty());
        assert!(store.news_item(item.id).await.unwrap().is_some());

        store.sweep_expired(now() + TimeDelta::days(3)).await.unwrap();
        assert!(store.news_item(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn permanent_news_survives_the_sweep() {
        let store = MemoryStore::new();
        store.insert_news(announcement("HORARIO", true), now()).await.unwrap();
        store.insert_news(announcement("OFERTA", false), now()).await.unwrap();

        let far_future = now() + TimeDelta::days(30);
        assert_eq!(store.sweep_expired(far_future).await.unwrap(), 1);
        let left = store.list_active_news(far_future).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "HORARIO");
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let store = MemoryStore::new();
        store.insert_news(announcement("OFERTA", false), now()).await.unwrap();
        let later = now() + TimeDelta::days(4);
        assert_eq!(store.sweep_expired(later).await.unwrap(), 1);
        assert_eq!(store.sweep_expired(later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_at_exact_expiry_removes_the_item() {
        let store = MemoryStore::new();
        store.insert_news(announcement("OFERTA", false), now()).await.unwrap();
        assert_eq!(store.sweep_expired(now() + TimeDelta::days(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn active_news_lists_in_creation_order() {
        let store = MemoryStore::new();
        store
            .insert_news(announcement("SEGUNDA", true), now() + TimeDelta::hours(1))
            .await
            .unwrap();
        store.insert_news(announcement("PRIMERA", true), now()).await.unwrap();
        let items = store.list_active_news(now() + TimeDelta::hours(2)).await.unwrap();
        let titles: Vec<_> = items.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["PRIMERA", "SEGUNDA"]);
    }

    #[tokio::test]
    async fn sessions_expire_and_revoke() {
        let store = MemoryStore::new();
        let session = store.create_session(UserId::new(1), now()).await.unwrap();

        assert!(store.find_session(session.token, now()).await.unwrap().is_some());
        let stale = now() + TimeDelta::days(8);
        assert!(store.find_session(session.token, stale).await.unwrap().is_none());

        assert!(store.revoke_session(session.token).await.unwrap());
        assert!(!store.revoke_session(session.token).await.unwrap());
        assert!(store.find_session(session.token, now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn username_duplicates_are_rejected() {
        let store = MemoryStore::new();
        let new_user = |name: &str| NewUser {
            username: name.into(),
            password_hash: "$argon2id$stub".into(),
        };
        store.insert_user(new_user("MARIA"), now()).await.unwrap();
        let err = store.insert_user(new_user("MARIA"), now()).await.unwrap_err();
        assert!(err.is_duplicate());
        assert!(store.user_by_username("MARIA").await.unwrap().is_some());
    }
}
