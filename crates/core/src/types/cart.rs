//! The account's embedded shopping cart.
//!
//! A cart holds at most one line per product. Adding a product that is
//! already present overwrites the line's quantity and price instead of
//! summing: adding P1 x2 and then P1 x5 leaves a single P1 x5 line.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors for an out-of-range [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity below one.
    #[error("quantity must be at least 1")]
    TooSmall,
    /// Quantity larger than the order table can store.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Largest accepted quantity.
        max: u32,
    },
}

/// A line quantity, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest accepted quantity (fits the `INTEGER` order column).
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Validate a requested quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooSmall` below 1 and `QuantityError::TooLarge`
    /// above [`Quantity::MAX`].
    pub fn new(n: i64) -> Result<Self, QuantityError> {
        if n < 1 {
            return Err(QuantityError::TooSmall);
        }
        u32::try_from(n)
            .ok()
            .filter(|q| *q <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        // MAX keeps every quantity inside i32
        Self::try_from(q.0).unwrap_or(Self::MAX)
    }
}

/// Errors from cart operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    /// No line exists for the product.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
    /// Checkout attempted with nothing to order.
    #[error("cart is empty")]
    Empty,
}

/// One product in the cart, with the unit price captured when it was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.price.times(self.quantity.get())
    }
}

/// The cart: an ordered list of lines, unique by product.
///
/// Serialized as a bare JSON array so it can live in a JSONB column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `product`, if any.
    #[must_use]
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product == product)
    }

    /// Add a product, or overwrite quantity and price if already present.
    pub fn put(&mut self, product: ProductId, quantity: Quantity, price: Price) -> CartLine {
        let line = CartLine {
            product,
            quantity,
            price,
        };
        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
        line
    }

    /// Change the quantity of an existing line, keeping its price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart.
    pub fn set_quantity(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product == product)
            .ok_or(CartError::LineNotFound(product))?;
        line.quantity = quantity;
        Ok(*line)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Product IDs in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product).collect()
    }

    /// Lines to order at checkout.
    ///
    /// With no selection every line is ordered. With a selection each named
    /// product must be in the cart; duplicates in the selection are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Empty` when nothing would be ordered and
    /// `CartError::LineNotFound` for a selected product missing from the cart.
    pub fn checkout_lines(
        &self,
        selection: Option<&[ProductId]>,
    ) -> Result<Vec<CartLine>, CartError> {
        let lines = match selection {
            None => self.lines.clone(),
            Some(wanted) => {
                let mut picked: Vec<CartLine> = Vec::with_capacity(wanted.len());
                for product in wanted {
                    if picked.iter().any(|l| l.product == *product) {
                        continue;
                    }
                    let line = self.line(*product).ok_or(CartError::LineNotFound(*product))?;
                    picked.push(*line);
                }
                picked
            }
        };

        if lines.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(lines)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Builds a cart, keeping the last line seen for each product.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.put(line.product, line.quantity, line.price);
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
