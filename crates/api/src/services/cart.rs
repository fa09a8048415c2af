//! Cart workflow.
//!
//! Mutations are read-modify-write on the account row without locking; a
//! concurrent write from the same account wins last.

use std::collections::HashMap;

use sqlx::PgPool;

use bazaar_core::{Cart, CartError, ProductId, Quantity};

use super::CommerceError;
use crate::db::{ProductRepository, RepositoryError, UserRepository};
use crate::models::{CartView, CurrentUser, ProductSummary, User};

/// Cart service.
pub struct CartService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Add a product, or overwrite quantity and price if already present.
    ///
    /// The line price is the product's current price.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AccountNotFound`, `CommerceError::ProductNotFound`,
    /// or `CommerceError::Quantity` for a quantity below 1.
    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn add_item(
        &self,
        principal: &CurrentUser,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, CommerceError> {
        let mut user = self.account(principal).await?;
        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound)?;
        let quantity = Quantity::new(quantity)?;

        user.cart.put(product.id, quantity, product.price);
        self.save(&user).await?;

        self.expand(&user.cart).await
    }

    /// Change the quantity of an existing line, keeping its price.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Quantity` for a quantity below 1,
    /// `CommerceError::AccountNotFound`, or `CommerceError::LineNotFound`.
    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn update_quantity(
        &self,
        principal: &CurrentUser,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, CommerceError> {
        let quantity = Quantity::new(quantity)?;
        let mut user = self.account(principal).await?;

        user.cart
            .set_quantity(product_id, quantity)
            .map_err(|e| match e {
                CartError::LineNotFound(id) => CommerceError::LineNotFound(id),
                CartError::Empty => CommerceError::EmptyCart,
            })?;
        self.save(&user).await?;

        self.expand(&user.cart).await
    }

    /// The expanded cart with subtotal.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AccountNotFound` if the account was deleted.
    pub async fn get(&self, principal: &CurrentUser) -> Result<CartView, CommerceError> {
        let user = self.account(principal).await?;
        self.expand(&user.cart).await
    }

    async fn account(&self, principal: &CurrentUser) -> Result<User, CommerceError> {
        self.users
            .get_by_id(principal.id)
            .await?
            .ok_or(CommerceError::AccountNotFound)
    }

    async fn save(&self, user: &User) -> Result<(), CommerceError> {
        self.users
            .save_cart(user.id, &user.cart)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::AccountNotFound,
                other => other.into(),
            })
    }

    async fn expand(&self, cart: &Cart) -> Result<CartView, CommerceError> {
        let products: HashMap<ProductId, ProductSummary> = self
            .products
            .get_many(&cart.product_ids())
            .await?
            .iter()
            .map(|p| (p.id, ProductSummary::from(p)))
            .collect();

        Ok(CartView::expand(cart, |id| products.get(&id).cloned()))
    }
}
