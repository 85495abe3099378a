//! `stockroom-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** rules (no infrastructure concerns):
//! entities, field validation, price derivation and announcement expiry.

pub mod error;
pub mod expiry;
pub mod id;
pub mod news;
pub mod pricing;
pub mod product;
pub mod user;
pub mod validate;

pub use error::{FieldError, ValidationError};
pub use id::{NewsId, ProductId, UserId};
pub use news::{Announcement, NewAnnouncement, NewsDraft};
pub use product::{NewProduct, Product, ProductDraft, ProductPatch, ProductPatchDraft};
pub use user::{NewUser, User, UserDraft};
