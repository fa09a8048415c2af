//! Domain models and JSON views for the API.
//!
//! Row types live in `crate::db`; these are the validated domain types the
//! services work with and the camelCase views handlers serialize.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{Order, OrderView};
pub use product::{Product, ProductSummary};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{CartLineView, CartView, PublicUser, User, UserProfile};
