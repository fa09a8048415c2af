//! HTTP routes for the Bazaar REST API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//! GET    /health/ready                - Readiness check (database)
//!
//! # Users
//! POST   /api/users/register          - Register (multipart, rate limited)
//! POST   /api/users/login             - Login (rate limited)
//! POST   /api/users/logout            - Logout
//! GET    /api/users/profile/{email}   - Profile (auth)
//! POST   /api/users/address           - Add address (auth)
//!
//! # Cart (auth)
//! POST   /api/users/cart              - Add or overwrite a line
//! PUT    /api/users/cart              - Update a line's quantity
//! GET    /api/users/cart/{email}      - Expanded cart
//!
//! # Products
//! GET    /api/products                - All products
//! POST   /api/products                - Create (multipart, auth)
//! GET    /api/products/{id}           - One product
//! PUT    /api/products/{id}           - Update (multipart, owner)
//! DELETE /api/products/{id}           - Delete (owner)
//! GET    /api/products/user/{email}   - Products by seller
//!
//! # Orders (auth)
//! POST   /api/orders                  - Checkout
//! GET    /api/orders/{email}          - Order history
//! PUT    /api/orders/{id}/cancel      - Cancel a pending order
//!
//! # Local image backend only
//! GET    /uploads/...                 - Stored images
//! ```

pub mod cart;
pub mod extract;
pub mod multipart;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::ApiConfig;
use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id::REQUEST_ID_HEADER,
    request_id_middleware,
};
use crate::services::media::{MAX_IMAGE_BYTES, UPLOADS_ROUTE};
use crate::state::AppState;

/// Body limit for multipart routes: one image plus the text fields.
///
/// Kept above the image limit so oversized files reach the image check and
/// get its message.
const MULTIPART_BODY_LIMIT: usize = 2 * MAX_IMAGE_BYTES;

/// Registration carries a profile image, so it gets the multipart limit.
fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register).layer(auth_rate_limiter()))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .merge(register_routes())
        .route("/login", post(users::login).layer(auth_rate_limiter()))
        .route("/logout", post(users::logout))
        .route("/profile/{email}", get(users::profile))
        .route("/address", post(users::add_address))
        .route("/cart", post(cart::add).put(cart::update))
        .route("/cart/{email}", get(cart::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/user/{email}", get(products::by_owner))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{email}", get(orders::index))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
}

/// Build the complete application: routes, health checks, uploads, and the
/// middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// auth rate limiter falls back to the peer address when no proxy header is
/// present.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let cors = cors_layer(state.config());

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes());

    if let Some(local) = state.media().local_uploads() {
        router = router.nest_service(UPLOADS_ROUTE, uploads_service(local.dir()));
    }

    router
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Static uploads. Stored files are user content, so browsers must neither
/// sniff them into another type nor run them as a document.
fn uploads_service(
    dir: &std::path::Path,
) -> SetResponseHeader<SetResponseHeader<ServeDir, HeaderValue>, HeaderValue> {
    SetResponseHeader::overriding(
        SetResponseHeader::overriding(
            ServeDir::new(dir),
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("sandbox"),
    )
}

/// CORS for the browser frontend; cookies require credentials.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
