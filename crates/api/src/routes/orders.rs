//! Order route handlers: checkout, order history, cancellation.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{Address, OrderId, ProductId};

use super::extract::{ApiJson, ApiPath};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::OrderView;
use crate::response::ApiResponse;
use crate::services::OrderService;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Legacy field; must name the logged-in user when present.
    pub email: Option<String>,
    pub address: Address,
    /// Cart lines to order; omitted means the whole cart.
    pub items: Option<Vec<CheckoutItem>>,
}

/// One selected cart line.
///
/// Clients echo lines from the cart view, so the product may be given as
/// `productId`, as a bare `product` id, or as an expanded `product` object.
/// Only the product id is read; quantity and price always come from the
/// stored cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: Option<ProductId>,
    pub product: Option<ProductRef>,
}

/// A product named by id or by an object carrying its id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(ProductId),
    Expanded {
        #[serde(alias = "_id")]
        id: ProductId,
    },
}

impl CheckoutItem {
    fn product_id(&self) -> Option<ProductId> {
        self.product_id.or(match self.product {
            Some(ProductRef::Id(id) | ProductRef::Expanded { id }) => Some(id),
            None => None,
        })
    }
}

/// Turn the request selection into product ids.
fn selection(
    items: Option<Vec<CheckoutItem>>,
) -> std::result::Result<Option<Vec<ProductId>>, AppError> {
    items
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.product_id().ok_or_else(|| {
                        AppError::BadRequest("Each item must name a product".to_string())
                    })
                })
                .collect()
        })
        .transpose()
}

/// Place one order per cart line and empty the cart.
#[instrument(skip(state, auth, req), fields(user_id = %auth.0.id))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    auth.ensure_email(req.email.as_deref())?;
    let selection = selection(req.items)?;

    let orders = OrderService::new(state.pool())
        .checkout(&auth.0, req.address, selection)
        .await?;

    let count = orders.len().to_string();
    let data = [("orders", count.as_str())];
    add_breadcrumb("checkout", "Orders placed", Some(data.as_slice()));

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(orders, "Order placed successfully"),
    ))
}

/// The logged-in user's orders, newest first.
#[instrument(skip(state, auth, email), fields(user_id = %auth.0.id))]
pub async fn index(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(email): ApiPath<String>,
) -> Result<ApiResponse<Vec<OrderView>>> {
    auth.ensure_email(Some(email.as_str()))?;

    let orders = OrderService::new(state.pool()).list(&auth.0).await?;
    Ok(ApiResponse::ok(orders))
}

/// Cancel a pending order.
#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn cancel(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiResponse<OrderView>> {
    let order = OrderService::new(state.pool()).cancel(&auth.0, id).await?;
    Ok(ApiResponse::ok_with_message(
        order,
        "Order cancelled successfully",
    ))
}
