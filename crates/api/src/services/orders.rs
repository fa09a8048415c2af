//! Checkout and order workflow.
//!
//! Checkout orders the lines of the stored cart (optionally a subset of
//! them), always at the price captured when each line was added, then clears
//! the whole cart. Orders and the clear are written in one transaction.

use std::collections::HashMap;

use sqlx::PgPool;

use bazaar_core::{Address, CartError, OrderId, ProductId};

use super::CommerceError;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{CurrentUser, Order, OrderView, ProductSummary};

/// Order service.
pub struct OrderService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Place one pending order per selected cart line and clear the cart.
    ///
    /// With `selection` set, only those products are ordered and each must
    /// be in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AccountNotFound`, `CommerceError::Address`,
    /// `CommerceError::EmptyCart`, `CommerceError::NotInCart`, or
    /// `CommerceError::CartChanged` when the cart was modified concurrently.
    #[tracing::instrument(skip(self, principal, address), fields(user_id = %principal.id))]
    pub async fn checkout(
        &self,
        principal: &CurrentUser,
        address: Address,
        selection: Option<Vec<ProductId>>,
    ) -> Result<Vec<OrderView>, CommerceError> {
        let user = self
            .users
            .get_by_id(principal.id)
            .await?
            .ok_or(CommerceError::AccountNotFound)?;
        let address = address.normalized()?;

        let lines = user
            .cart
            .checkout_lines(selection.as_deref())
            .map_err(|e| match e {
                CartError::Empty => CommerceError::EmptyCart,
                CartError::LineNotFound(id) => CommerceError::NotInCart(id),
            })?;

        let orders = self
            .orders
            .place_from_cart(user.id, &user.cart, &address, &lines)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::AccountNotFound,
                RepositoryError::Conflict(_) => CommerceError::CartChanged,
                other => other.into(),
            })?;

        tracing::info!(orders = orders.len(), "checkout complete");
        self.expand(orders).await
    }

    /// The principal's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AccountNotFound` if the account was deleted.
    pub async fn list(&self, principal: &CurrentUser) -> Result<Vec<OrderView>, CommerceError> {
        if self.users.get_by_id(principal.id).await?.is_none() {
            return Err(CommerceError::AccountNotFound);
        }

        Ok(self
            .orders
            .list_for_user(principal.id)
            .await?
            .into_iter()
            .map(|(order, product)| OrderView::new(order, product))
            .collect())
    }

    /// Cancel a pending order owned by the principal.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::OrderNotFound` for a missing or foreign order
    /// and `CommerceError::Status` unless the order is pending.
    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn cancel(
        &self,
        principal: &CurrentUser,
        id: OrderId,
    ) -> Result<OrderView, CommerceError> {
        let order = self.owned(principal, id).await?;
        let target = order.status.cancel()?;

        let updated = match self
            .orders
            .transition(id, principal.id, order.status, target)
            .await?
        {
            Some(updated) => updated,
            // Status moved between the read and the update.
            None => {
                let current = self.owned(principal, id).await?;
                return Err(current.status.cancel().err().map_or(
                    CommerceError::OrderNotFound,
                    CommerceError::Status,
                ));
            }
        };

        tracing::info!(order_id = %id, "order cancelled");
        let mut views = self.expand(vec![updated]).await?;
        views.pop().ok_or(CommerceError::OrderNotFound)
    }

    async fn owned(&self, principal: &CurrentUser, id: OrderId) -> Result<Order, CommerceError> {
        self.orders
            .get_by_id(id)
            .await?
            .filter(|o| o.user_id == principal.id)
            .ok_or(CommerceError::OrderNotFound)
    }

    async fn expand(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, CommerceError> {
        let ids: Vec<ProductId> = orders.iter().map(|o| o.product_id).collect();
        let products: HashMap<ProductId, ProductSummary> = self
            .products
            .get_many(&ids)
            .await?
            .iter()
            .map(|p| (p.id, ProductSummary::from(p)))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let product = products.get(&order.product_id).cloned();
                OrderView::new(order, product)
            })
            .collect())
    }
}
