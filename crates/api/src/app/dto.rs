use serde::Deserialize;

use stockroom_core::{
    Announcement, NewsDraft, Product, ProductDraft, ProductPatchDraft, User, UserDraft,
};
use stockroom_store::Session;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn into_draft(self) -> UserDraft {
        UserDraft {
            username: self.username,
            password: self.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Prices arrive as decimal strings so malformed numbers surface as field
/// violations instead of body rejections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub purchase_price: String,
    pub profit_margin: Option<String>,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

impl CreateProductRequest {
    pub fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name,
            purchase_price: self.purchase_price,
            profit_margin: self.profit_margin,
            barcode: self.barcode,
            buyer_name: self.buyer_name,
            stock: self.stock,
            min_stock: self.min_stock,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub purchase_price: Option<String>,
    pub profit_margin: Option<String>,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

impl UpdateProductRequest {
    pub fn into_draft(self) -> ProductPatchDraft {
        ProductPatchDraft {
            name: self.name,
            purchase_price: self.purchase_price,
            profit_margin: self.profit_margin,
            barcode: self.barcode,
            buyer_name: self.buyer_name,
            stock: self.stock,
            min_stock: self.min_stock,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    pub content: String,
    pub is_permanent: Option<bool>,
}

impl CreateNewsRequest {
    pub fn into_draft(self) -> NewsDraft {
        NewsDraft {
            title: self.title,
            content: self.content,
            is_permanent: self.is_permanent,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id,
        "name": product.name,
        "purchasePrice": product.purchase_price.to_string(),
        "salePrice": product.sale_price.to_string(),
        "profitMargin": product.profit_margin.to_string(),
        "barcode": product.barcode,
        "buyerName": product.buyer_name,
        "stock": product.stock,
        "minStock": product.min_stock,
        "lowStock": product.is_low_stock(),
        "createdAt": product.created_at.to_rfc3339(),
        "updatedAt": product.updated_at.to_rfc3339(),
    })
}

pub fn news_to_json(item: Announcement) -> serde_json::Value {
    serde_json::json!({
        "id": item.id,
        "title": item.title,
        "content": item.content,
        "isPermanent": item.is_permanent,
        "createdAt": item.created_at.to_rfc3339(),
        "expiresAt": item.expires_at.map(|at| at.to_rfc3339()),
    })
}

/// `password_hash` never leaves the server.
pub fn user_to_json(user: User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "createdAt": user.created_at.to_rfc3339(),
    })
}

pub fn session_to_json(session: Session) -> serde_json::Value {
    serde_json::json!({
        "token": session.token,
        "expiresAt": session.expires_at.to_rfc3339(),
    })
}
