//! Products and their pricing lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::id::ProductId;
use crate::pricing;
use crate::validate;

/// An inventory product.
///
/// `sale_price` is always derived from `purchase_price` and `profit_margin`;
/// no caller supplies it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub profit_margin: Decimal,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: i64,
    pub min_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Merge a validated patch, re-derive the sale price and refresh
    /// `updated_at`. Fields absent from the patch keep their stored values.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.purchase_price {
            self.purchase_price = price;
        }
        if let Some(margin) = patch.profit_margin {
            self.profit_margin = margin;
        }
        if let Some(barcode) = patch.barcode {
            self.barcode = Some(barcode);
        }
        if let Some(buyer_name) = patch.buyer_name {
            self.buyer_name = Some(buyer_name);
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(min_stock) = patch.min_stock {
            self.min_stock = min_stock;
        }
        self.sale_price = pricing::derive_sale_price(self.purchase_price, self.profit_margin);
        self.updated_at = now;
    }

    /// Whether the product has fallen below its configured minimum stock.
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }
}

/// Raw create input, prior to validation. Prices arrive as decimal strings.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub purchase_price: String,
    pub profit_margin: Option<String>,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

/// A validated product ready for insertion. The store assigns the id and
/// timestamps and derives the sale price at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub purchase_price: Decimal,
    pub profit_margin: Decimal,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: i64,
    pub min_stock: i64,
}

impl NewProduct {
    /// Validate a create draft. The margin defaults to
    /// [`pricing::DEFAULT_PROFIT_MARGIN`] and stock counters default to zero.
    pub fn validate(draft: ProductDraft) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        validate::require_uppercase("name", &draft.name, &mut errors);
        let purchase_price =
            validate::parse_positive_decimal("purchasePrice", &draft.purchase_price, &mut errors);
        let profit_margin = match draft.profit_margin.as_deref() {
            Some(raw) => validate::parse_margin("profitMargin", raw, &mut errors),
            None => Some(pricing::DEFAULT_PROFIT_MARGIN),
        };
        match (purchase_price, profit_margin) {
            (Some(purchase_price), Some(profit_margin)) if errors.is_empty() => Ok(Self {
                name: draft.name,
                purchase_price,
                profit_margin,
                barcode: draft.barcode,
                buyer_name: draft.buyer_name,
                stock: draft.stock.unwrap_or(0),
                min_stock: draft.min_stock.unwrap_or(0),
            }),
            _ => Err(ValidationError(errors)),
        }
    }

    /// Sale price this product will carry once inserted.
    pub fn sale_price(&self) -> Decimal {
        pricing::derive_sale_price(self.purchase_price, self.profit_margin)
    }
}

/// Raw update input; omitted fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct ProductPatchDraft {
    pub name: Option<String>,
    pub purchase_price: Option<String>,
    pub profit_margin: Option<String>,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    pub barcode: Option<String>,
    pub buyer_name: Option<String>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

impl ProductPatch {
    /// Validate an update draft. Only the fields present are validated.
    pub fn validate(draft: ProductPatchDraft) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        if let Some(name) = &draft.name {
            validate::require_uppercase("name", name, &mut errors);
        }
        let purchase_price = match draft.purchase_price.as_deref() {
            Some(raw) => validate::parse_positive_decimal("purchasePrice", raw, &mut errors),
            None => None,
        };
        let profit_margin = match draft.profit_margin.as_deref() {
            Some(raw) => validate::parse_margin("profitMargin", raw, &mut errors),
            None => None,
        };
        ValidationError::check(errors)?;
        Ok(Self {
            name: draft.name,
            purchase_price,
            profit_margin,
            barcode: draft.barcode,
            buyer_name: draft.buyer_name,
            stock: draft.stock,
            min_stock: draft.min_stock,
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn draft(name: &str, price: &str) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            purchase_price: price.into(),
            ..ProductDraft::default()
        }
    }

    fn stored(name: &str, price: &str, margin: &str) -> Product {
        let now = "2026-03-10T09:30:00Z".parse().unwrap();
        Product {
            id: ProductId::new(1),
            name: name.into(),
            purchase_price: dec(price),
            sale_price: pricing::derive_sale_price(dec(price), dec(margin)),
            profit_margin: dec(margin),
            barcode: None,
            buyer_name: None,
            stock: 0,
            min_stock: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_defaults_margin_and_stock() {
        let new = NewProduct::validate(draft("ARROZ", "100.00")).unwrap();
        assert_eq!(new.profit_margin, pricing::DEFAULT_PROFIT_MARGIN);
        assert_eq!(new.stock, 0);
        assert_eq!(new.sale_price(), dec("120.00"));
    }

    #[test]
    fn create_honors_margin_override() {
        let mut input = draft("ARROZ", "100.00");
        input.profit_margin = Some("35".into());
        let new = NewProduct::validate(input).unwrap();
        assert_eq!(new.sale_price(), dec("135.00"));
    }

    #[test]
    fn create_collects_every_violation() {
        let mut input = draft("arroz", "-1");
        input.profit_margin = Some("nope".into());
        let err = NewProduct::validate(input).unwrap_err();
        assert_eq!(err.fields().len(), 3);
    }

    #[test]
    fn create_rejects_prices_beyond_the_money_columns() {
        // Decimal::MAX parses fine, but validation bounds the value before
        // the pricing engine ever multiplies it.
        let err = NewProduct::validate(draft("ARROZ", "79228162514264337593543950335")).unwrap_err();
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, "purchasePrice");
    }

    #[test]
    fn patch_rejects_invalid_fields_only_when_present() {
        assert!(ProductPatch::validate(ProductPatchDraft::default()).is_ok());
        let bad = ProductPatchDraft {
            purchase_price: Some("zero".into()),
            ..ProductPatchDraft::default()
        };
        assert!(ProductPatch::validate(bad).is_err());
    }

    #[test]
    fn patch_rederives_sale_price_from_new_purchase_price() {
        let mut product = stored("ARROZ", "100.00", "20");
        let later = "2026-03-11T00:00:00Z".parse().unwrap();
        product.apply_patch(
            ProductPatch {
                purchase_price: Some(dec("49.99")),
                ..ProductPatch::default()
            },
            later,
        );
        assert_eq!(product.sale_price, dec("59.99"));
        assert_eq!(product.updated_at, later);
    }

    #[test]
    fn patch_rederives_sale_price_from_new_margin() {
        let mut product = stored("ARROZ", "100.00", "20");
        product.apply_patch(
            ProductPatch {
                profit_margin: Some(dec("50")),
                ..ProductPatch::default()
            },
            "2026-03-11T00:00:00Z".parse().unwrap(),
        );
        assert_eq!(product.sale_price, dec("150.00"));
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let mut product = stored("ARROZ", "100.00", "20");
        product.stock = 8;
        product.apply_patch(
            ProductPatch {
                name: Some("ARROZ INTEGRAL".into()),
                ..ProductPatch::default()
            },
            "2026-03-11T00:00:00Z".parse().unwrap(),
        );
        assert_eq!(product.name, "ARROZ INTEGRAL");
        assert_eq!(product.stock, 8);
        assert_eq!(product.purchase_price, dec("100.00"));
    }

    #[test]
    fn low_stock_is_strictly_below_minimum() {
        let mut product = stored("ARROZ", "100.00", "20");
        product.stock = 2;
        product.min_stock = 2;
        assert!(!product.is_low_stock());
        product.stock = 1;
        assert!(product.is_low_stock());
    }
}
