//! Postgres-backed record store.
//!
//! Uniqueness is enforced by `UNIQUE` constraints; the database is the
//! authority and application-level checks are only a fast path. Unique
//! violations (code `23505`) are mapped to [`StoreError::Duplicate`] so
//! callers see the same error the in-memory backend produces.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;
use stockroom_core::{
    Announcement, NewAnnouncement, NewProduct, NewUser, NewsId, Product, ProductId, ProductPatch,
    User, UserId, expiry,
};

use crate::error::StoreError;
use crate::session::Session;
use crate::{RecordStore, SessionStore};

/// Bootstrap DDL, applied at connect time. Statements are idempotent so a
/// restart against an initialized database is a no-op.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        purchase_price NUMERIC(12, 2) NOT NULL,
        sale_price NUMERIC(16, 2) NOT NULL,
        profit_margin NUMERIC(7, 2) NOT NULL,
        barcode TEXT,
        buyer_name TEXT,
        stock BIGINT NOT NULL DEFAULT 0,
        min_stock BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS business_news (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        is_permanent BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token UUID PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Postgres-backed record and session store.
///
/// Uses the SQLx connection pool, which is thread-safe and can be shared
/// across handlers. BIGSERIAL sequences assign ids; sequences never move
/// backwards and never reissue a value, which gives the monotonic,
/// never-reused id guarantee the store contract asks for.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and apply the bootstrap schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&*self.pool).await?;
        }
        Ok(())
    }
}

/// Check if an error is a unique constraint violation.
fn unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn map_unique(err: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    if unique_violation(&err) {
        StoreError::duplicate(field, value.to_string())
    } else {
        StoreError::from(err)
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[instrument(skip(self, new), err)]
    async fn insert_user(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_unique(e, "username", &new.username))?;

        let id: i64 = row.try_get("id")?;
        Ok(User {
            id: UserId::new(id),
            username: new.username,
            password_hash: new.password_hash,
            created_at: now,
        })
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| UserRow::from_row(&r).map(User::from))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| UserRow::from_row(&r).map(User::from))
            .transpose()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self, new), err)]
    async fn insert_product(
        &self,
        new: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let sale_price = new.sale_price();
        let row = sqlx::query(
            r#"
            INSERT INTO products (
                name,
                purchase_price,
                sale_price,
                profit_margin,
                barcode,
                buyer_name,
                stock,
                min_stock,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(new.purchase_price)
        .bind(sale_price)
        .bind(new.profit_margin)
        .bind(&new.barcode)
        .bind(&new.buyer_name)
        .bind(new.stock)
        .bind(new.min_stock)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_unique(e, "name", &new.name))?;

        let id: i64 = row.try_get("id")?;
        Ok(Product {
            id: ProductId::new(id),
            name: new.name,
            purchase_price: new.purchase_price,
            sale_price,
            profit_margin: new.profit_margin,
            barcode: new.barcode,
            buyer_name: new.buyer_name,
            stock: new.stock,
            min_stock: new.min_stock,
            created_at: now,
            updated_at: now,
        })
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| ProductRow::from_row(&r).map(Product::from))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| ProductRow::from_row(&r).map(Product::from))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
        ))
        .fetch_all(&*self.pool)
        .await?;

        collect_products(rows)
    }

    async fn search_products(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE position($1 in name) > 0
            ORDER BY name ASC
            LIMIT $2
            "#
        ))
        .bind(query)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await?;

        collect_products(rows)
    }

    async fn list_low_stock(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock < min_stock ORDER BY name ASC"
        ))
        .fetch_all(&*self.pool)
        .await?;

        collect_products(rows)
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        // Read-merge-write inside one transaction; the row lock serializes
        // concurrent updates to the same product.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut product = Product::from(ProductRow::from_row(&row)?);
        product.apply_patch(patch, now);

        sqlx::query(
            r#"
            UPDATE products
            SET name = $2,
                purchase_price = $3,
                sale_price = $4,
                profit_margin = $5,
                barcode = $6,
                buyer_name = $7,
                stock = $8,
                min_stock = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(&product.name)
        .bind(product.purchase_price)
        .bind(product.sale_price)
        .bind(product.profit_margin)
        .bind(&product.barcode)
        .bind(&product.buyer_name)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, "name", &product.name))?;

        tx.commit().await?;
        Ok(Some(product))
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let outcome = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await?;
        Ok(outcome.rows_affected() > 0)
    }

    #[instrument(skip(self, new), err)]
    async fn insert_news(
        &self,
        new: NewAnnouncement,
        now: DateTime<Utc>,
    ) -> Result<Announcement, StoreError> {
        let expires_at = expiry::compute_expiry(now, new.is_permanent);
        let row = sqlx::query(
            r#"
            INSERT INTO business_news (title, content, is_permanent, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.is_permanent)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&*self.pool)
        .await?;

        let id: i64 = row.try_get("id")?;
        Ok(Announcement {
            id: NewsId::new(id),
            title: new.title,
            content: new.content,
            is_permanent: new.is_permanent,
            created_at: now,
            expires_at,
        })
    }

    async fn news_item(&self, id: NewsId) -> Result<Option<Announcement>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {NEWS_COLUMNS} FROM business_news WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| NewsRow::from_row(&r).map(Announcement::from))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn list_active_news(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NEWS_COLUMNS}
            FROM business_news
            WHERE is_permanent OR expires_at IS NULL OR expires_at > $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(now)
        .fetch_all(&*self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(Announcement::from(NewsRow::from_row(&row)?));
        }
        Ok(items)
    }

    #[instrument(skip(self), err)]
    async fn delete_news(&self, id: NewsId) -> Result<bool, StoreError> {
        let outcome = sqlx::query("DELETE FROM business_news WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await?;
        Ok(outcome.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let outcome = sqlx::query(
            r#"
            DELETE FROM business_news
            WHERE NOT is_permanent
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&*self.pool)
        .await?;
        Ok(outcome.rows_affected())
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn create_session(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session::issue(user_id, now);
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.token)
        .bind(session.user_id.get())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&*self.pool)
        .await?;
        Ok(session)
    }

    async fn find_session(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| SessionRow::from_row(&r).map(Session::from))
            .transpose()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self, token), err)]
    async fn revoke_session(&self, token: Uuid) -> Result<bool, StoreError> {
        let outcome = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&*self.pool)
            .await?;
        Ok(outcome.rows_affected() > 0)
    }
}

const PRODUCT_COLUMNS: &str = "id, name, purchase_price, sale_price, profit_margin, \
     barcode, buyer_name, stock, min_stock, created_at, updated_at";

const NEWS_COLUMNS: &str = "id, title, content, is_permanent, created_at, expires_at";

fn collect_products(rows: Vec<PgRow>) -> Result<Vec<Product>, StoreError> {
    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        products.push(Product::from(ProductRow::from_row(&row)?));
    }
    Ok(products)
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    purchase_price: Decimal,
    sale_price: Decimal,
    profit_margin: Decimal,
    barcode: Option<String>,
    buyer_name: Option<String>,
    stock: i64,
    min_stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            purchase_price: row.try_get("purchase_price")?,
            sale_price: row.try_get("sale_price")?,
            profit_margin: row.try_get("profit_margin")?,
            barcode: row.try_get("barcode")?,
            buyer_name: row.try_get("buyer_name")?,
            stock: row.try_get("stock")?,
            min_stock: row.try_get("min_stock")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            purchase_price: row.purchase_price,
            sale_price: row.sale_price,
            profit_margin: row.profit_margin,
            barcode: row.barcode,
            buyer_name: row.buyer_name,
            stock: row.stock,
            min_stock: row.min_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct NewsRow {
    id: i64,
    title: String,
    content: String,
    is_permanent: bool,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for NewsRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(NewsRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            is_permanent: row.try_get("is_permanent")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

impl From<NewsRow> for Announcement {
    fn from(row: NewsRow) -> Self {
        Announcement {
            id: NewsId::new(row.id),
            title: row.title,
            content: row.content,
            is_permanent: row.is_permanent,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug)]
struct SessionRow {
    token: Uuid,
    user_id: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for SessionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SessionRow {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.token,
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}
