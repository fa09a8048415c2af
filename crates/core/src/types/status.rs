//! Order lifecycle status.
//!
//! ```text
//! pending -> confirmed -> shipped -> delivered
//!    \
//!     -> cancelled
//! ```
//!
//! Fulfillment transitions belong to back-office tooling; the storefront only
//! performs `pending -> cancelled`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error for a disallowed status transition.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusError {
    /// Cancellation requested for an order that already left `pending`.
    #[error("only pending orders can be cancelled (order is {0})")]
    NotCancellable(OrderStatus),
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, not yet confirmed.
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    /// Cancelled by the customer while still pending.
    Cancelled,
}

impl OrderStatus {
    /// Whether the customer may still cancel.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The status after a cancellation request.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::NotCancellable` unless the order is `Pending`.
    pub const fn cancel(self) -> Result<Self, StatusError> {
        if self.is_cancellable() {
            Ok(Self::Cancelled)
        } else {
            Err(StatusError::NotCancellable(self))
        }
    }

    /// The stored (`snake_case`) name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
