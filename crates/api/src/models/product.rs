//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Category, Email, Price, ProductId};

/// A catalog product.
///
/// `owner_email` is a denormalized copy of the creator's email, serialized
/// as `userEmail`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: String,
    #[serde(rename = "userEmail")]
    pub owner_email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `email` owns this product.
    #[must_use]
    pub fn is_owned_by(&self, email: &Email) -> bool {
        self.owner_email == *email
    }
}

/// Product fields embedded in cart lines and orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Category,
    pub image_url: String,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
            category: p.category,
            image_url: p.image_url.clone(),
        }
    }
}
