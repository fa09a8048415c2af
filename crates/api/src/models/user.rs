//! Account domain types and their JSON views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Address, Cart, CartLine, Email, Price, ProductId, Quantity, UserId};

use super::product::ProductSummary;

/// A storefront account (domain type).
///
/// The password hash is deliberately absent: it is only read by the
/// authentication repository method that needs it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub profile_image: Option<String>,
    pub addresses: Vec<Address>,
    pub cart: Cart,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields returned after registration and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub profile_image: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Profile page view: public fields plus saved addresses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            user: PublicUser::from(&user),
            created_at: user.created_at,
            addresses: user.addresses,
        }
    }
}

/// A cart line with its product expanded.
///
/// `product` is `None` when the product was deleted after it was added.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub product: Option<ProductSummary>,
    pub quantity: Quantity,
    pub price: Price,
    pub line_total: Price,
}

/// The expanded cart with a server-computed subtotal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: Price,
}

impl CartView {
    /// Expand `cart` using the products that still exist.
    ///
    /// Lines keep cart order; `lookup` returns the product for an ID.
    pub fn expand<F>(cart: &Cart, mut lookup: F) -> Self
    where
        F: FnMut(ProductId) -> Option<ProductSummary>,
    {
        let items = cart
            .lines()
            .iter()
            .map(|line: &CartLine| CartLineView {
                product_id: line.product,
                product: lookup(line.product),
                quantity: line.quantity,
                price: line.price,
                line_total: line.total(),
            })
            .collect();

        Self {
            items,
            subtotal: cart.subtotal(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_view_expands_and_sums() {
        let mut cart = Cart::new();
        cart.put(
            ProductId::new(1),
            Quantity::new(2).unwrap(),
            Price::parse("2.50").unwrap(),
        );
        cart.put(
            ProductId::new(2),
            Quantity::new(1).unwrap(),
            Price::parse("4.00").unwrap(),
        );

        let view = CartView::expand(&cart, |_| None);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.subtotal, Price::parse("9.00").unwrap());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["items"][0]["productId"], 1);
        assert_eq!(json["items"][0]["lineTotal"], "5.00");
        assert!(json["items"][0]["product"].is_null());
        assert_eq!(json["subtotal"], "9.00");
    }

    #[test]
    fn test_profile_flattens_public_fields() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(7),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            profile_image: None,
            addresses: Vec::new(),
            cart: Cart::new(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["profileImage"].is_null());
        assert!(json["addresses"].as_array().unwrap().is_empty());
        assert!(json.get("passwordHash").is_none());
    }
}
