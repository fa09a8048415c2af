//! Order repository, including the transactional checkout.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{
    Address, Cart, CartLine, Category, OrderId, OrderStatus, Price, ProductId, Quantity, UserId,
};

use super::RepositoryError;
use crate::models::{Order, ProductSummary};

const ORDER_COLUMNS: &str =
    "id, user_id, address, product_id, quantity, price, status, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    address: Json<Address>,
    product_id: ProductId,
    quantity: i32,
    price: Price,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order quantity in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            address: row.address.0,
            product_id: row.product_id,
            quantity,
            price: row.price,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// Order row joined with its product, which may have been deleted.
#[derive(sqlx::FromRow)]
struct OrderWithProductRow {
    #[sqlx(flatten)]
    order: OrderRow,
    product_name: Option<String>,
    product_price: Option<Price>,
    product_category: Option<String>,
    product_image_url: Option<String>,
}

impl OrderWithProductRow {
    fn into_parts(self) -> Result<(Order, Option<ProductSummary>), RepositoryError> {
        let product_id = self.order.product_id;
        let product = match (
            self.product_name,
            self.product_price,
            self.product_category,
            self.product_image_url,
        ) {
            (Some(name), Some(price), Some(category), Some(image_url)) => {
                let category = category.parse::<Category>().map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
                })?;
                Some(ProductSummary {
                    id: product_id,
                    name,
                    price,
                    category,
                    image_url,
                })
            }
            _ => None,
        };

        Ok((Order::try_from(self.order)?, product))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place one pending order per line and clear the account's cart.
    ///
    /// Runs in a single transaction holding a row lock on the account. The
    /// stored cart must still equal `expected`, the cart the lines were taken
    /// from; otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    /// Returns `RepositoryError::Conflict` if the cart changed since it was read.
    pub async fn place_from_cart(
        &self,
        user_id: UserId,
        expected: &Cart,
        address: &Address,
        lines: &[CartLine],
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Json<Cart>> =
            sqlx::query_scalar("SELECT cart FROM shop.user WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(Json(current)) = current else {
            return Err(RepositoryError::NotFound);
        };
        if current != *expected {
            return Err(RepositoryError::Conflict(
                "cart changed during checkout".to_owned(),
            ));
        }

        let mut orders = Vec::with_capacity(lines.len());
        for line in lines {
            let row: OrderRow = sqlx::query_as(&format!(
                r"
                INSERT INTO shop.order (user_id, address, product_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ORDER_COLUMNS}
                "
            ))
            .bind(user_id)
            .bind(Json(address))
            .bind(line.product)
            .bind(i32::from(line.quantity))
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;

            orders.push(Order::try_from(row)?);
        }

        sqlx::query("UPDATE shop.user SET cart = '[]'::jsonb WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(orders)
    }

    /// Orders of an account, newest first, each with its product if it still exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Option<ProductSummary>)>, RepositoryError> {
        let rows: Vec<OrderWithProductRow> = sqlx::query_as(
            r"
            SELECT o.id, o.user_id, o.address, o.product_id, o.quantity, o.price,
                   o.status, o.created_at,
                   p.name AS product_name,
                   p.price AS product_price,
                   p.category AS product_category,
                   p.image_url AS product_image_url
            FROM shop.order o
            LEFT JOIN shop.product p ON p.id = o.product_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderWithProductRow::into_parts).collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Move an order from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `None` when the order is missing, owned by another account,
    /// or no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn transition(
        &self,
        id: OrderId,
        user_id: UserId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE shop.order
            SET status = $4
            WHERE id = $1 AND user_id = $2 AND status = $3
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }
}
