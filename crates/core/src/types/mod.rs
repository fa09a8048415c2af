//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use address::{Address, AddressError, AddressType};
pub use cart::{Cart, CartError, CartLine, Quantity, QuantityError};
pub use category::{Category, CategoryError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::{OrderStatus, StatusError};
