//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Address, OrderId, OrderStatus, Price, ProductId, Quantity, UserId};

use super::product::ProductSummary;

/// A placed order (one product line).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address: Address,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An order with its product expanded.
///
/// `product` is `None` once the product has been deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub product_id: ProductId,
    pub product: Option<ProductSummary>,
    pub quantity: Quantity,
    pub price: Price,
    pub address: Address,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

impl OrderView {
    /// Combine an order with its (possibly deleted) product.
    #[must_use]
    pub fn new(order: Order, product: Option<ProductSummary>) -> Self {
        Self {
            id: order.id,
            product_id: order.product_id,
            product,
            quantity: order.quantity,
            price: order.price,
            address: order.address,
            status: order.status,
            order_date: order.created_at,
        }
    }
}
