//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `account` - Profile and saved addresses
//! - `cart` - The account's embedded cart
//! - `catalog` - Product CRUD with owner checks
//! - `orders` - Checkout, order history, cancellation
//! - `media` - Image validation and hosting
//!
//! Services borrow the pool for the duration of one request and are built
//! inside handlers, like the repositories they wrap.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod media;
pub mod orders;

pub use account::AccountService;
pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::{CatalogService, NewProductInput, ProductChanges};
pub use error::CommerceError;
pub use media::{ImageUpload, MediaError, MediaFolder, MediaService};
pub use orders::OrderService;
