//! Product route handlers.
//!
//! Reads are public. Create, update and delete need a session; update and
//! delete are limited to the product's owner.

use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::{http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::ProductId;

use super::extract::{ApiPath, ApiQuery};
use super::multipart::read_form;
use super::users::path_email;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::response::ApiResponse;
use crate::services::{CatalogService, CommerceError, NewProductInput, ProductChanges};
use crate::state::AppState;

/// Multipart field carrying the product image.
const IMAGE_FIELD: &str = "image";

/// Query of the delete endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub user_email: Option<String>,
}

/// All products, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Product>>> {
    let products = CatalogService::new(state.pool(), state.media())
        .list_all()
        .await?;
    Ok(ApiResponse::ok(products))
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<ApiResponse<Product>> {
    let product = CatalogService::new(state.pool(), state.media())
        .get(id)
        .await?;
    Ok(ApiResponse::ok(product))
}

/// Products listed by one seller.
#[instrument(skip(state))]
pub async fn by_owner(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> Result<ApiResponse<Vec<Product>>> {
    let owner = path_email(&email)?;
    let products = CatalogService::new(state.pool(), state.media())
        .list_by_owner(&owner)
        .await?;
    Ok(ApiResponse::ok(products))
}

/// Create a product from a multipart form.
///
/// Fields: `name`, `price`, optional `description`, `category`, `userEmail`
/// and `image` file.
#[instrument(skip(state, auth, multipart), fields(user_id = %auth.0.id))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut form = read_form(multipart?, IMAGE_FIELD).await?;
    auth.ensure_email(form.take("userEmail").as_deref())?;

    let input = NewProductInput {
        name: form.take("name").unwrap_or_default(),
        description: form.take("description"),
        price: form
            .take_non_blank("price")
            .ok_or(CommerceError::MissingField("price"))?,
        category: form.take("category"),
    };

    let product = CatalogService::new(state.pool(), state.media())
        .create(&auth.0, input, form.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(product, "Product created successfully"),
    ))
}

/// Update a product from a multipart form; absent fields stay unchanged.
#[instrument(skip(state, auth, multipart), fields(user_id = %auth.0.id))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Product>> {
    let mut form = read_form(multipart?, IMAGE_FIELD).await?;
    auth.ensure_email(form.take("userEmail").as_deref())?;

    let changes = ProductChanges {
        name: form.take("name"),
        description: form.take("description"),
        price: form.take_non_blank("price"),
        category: form.take_non_blank("category"),
    };

    let product = CatalogService::new(state.pool(), state.media())
        .update(&auth.0, id, changes, form.file)
        .await?;

    Ok(ApiResponse::ok_with_message(
        product,
        "Product updated successfully",
    ))
}

/// Delete a product owned by the session user.
#[instrument(skip(state, auth, query), fields(user_id = %auth.0.id))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<ApiResponse<()>> {
    auth.ensure_email(query.user_email.as_deref())?;

    CatalogService::new(state.pool(), state.media())
        .delete(&auth.0, id)
        .await?;

    Ok(ApiResponse::message("Product deleted successfully"))
}
