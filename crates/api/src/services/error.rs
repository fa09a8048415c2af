//! Errors for the cart, catalog, checkout and account workflows.

use thiserror::Error;

use bazaar_core::{AddressError, CategoryError, PriceError, ProductId, QuantityError, StatusError};

use super::media::MediaError;
use crate::db::RepositoryError;

/// Business-rule failures shared by the commerce services.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The principal's account no longer exists.
    #[error("user not found")]
    AccountNotFound,

    #[error("product not found")]
    ProductNotFound,

    /// Missing, or owned by another account.
    #[error("order not found")]
    OrderNotFound,

    /// Quantity change for a product that is not in the cart.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// Product update or delete by someone other than its owner.
    #[error("not authorized to modify this product")]
    NotOwner,

    #[error("invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    #[error("invalid price: {0}")]
    Price(#[from] PriceError),

    #[error("invalid category: {0}")]
    Category(#[from] CategoryError),

    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("cart is empty")]
    EmptyCart,

    /// Checkout selection names a product that is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("{0}")]
    Status(#[from] StatusError),

    /// The cart was modified while checkout was in progress.
    #[error("cart changed during checkout, please review it and try again")]
    CartChanged,

    /// Image rejected or image host failed.
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
