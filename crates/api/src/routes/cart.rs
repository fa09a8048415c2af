//! Cart route handlers.
//!
//! The cart lives on the account record; every handler acts on the session
//! user and returns the expanded cart.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::ProductId;

use super::extract::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::response::ApiResponse;
use crate::services::CartService;
use crate::state::AppState;

/// Body of add-to-cart and quantity updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    /// Legacy field; must name the logged-in user when present.
    pub email: Option<String>,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Add a product, or overwrite its line with the new quantity.
#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn add(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<CartItemRequest>,
) -> Result<ApiResponse<CartView>> {
    auth.ensure_email(req.email.as_deref())?;

    let cart = CartService::new(state.pool())
        .add_item(&auth.0, req.product_id, req.quantity)
        .await?;

    Ok(ApiResponse::ok_with_message(cart, "Added to cart"))
}

/// Change the quantity of an existing line.
#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<CartItemRequest>,
) -> Result<ApiResponse<CartView>> {
    auth.ensure_email(req.email.as_deref())?;

    let cart = CartService::new(state.pool())
        .update_quantity(&auth.0, req.product_id, req.quantity)
        .await?;

    Ok(ApiResponse::ok_with_message(cart, "Cart updated"))
}

/// The logged-in user's cart.
#[instrument(skip(state, auth, email), fields(user_id = %auth.0.id))]
pub async fn show(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(email): ApiPath<String>,
) -> Result<ApiResponse<CartView>> {
    auth.ensure_email(Some(email.as_str()))?;

    let cart = CartService::new(state.pool()).get(&auth.0).await?;
    Ok(ApiResponse::ok(cart))
}
