//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! # Database with migrations applied
//! cargo run -p bazaar-cli -- migrate
//!
//! # API with the local image backend
//! MEDIA_BACKEND=local cargo run -p bazaar-api
//!
//! # Run integration tests
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_TEST_URL` - API base URL (default `http://localhost:5001`)
//! - `BAZAAR_DATABASE_URL` - only for tests that move orders through
//!   fulfilment states directly in the database
//!
//! Every test registers fresh accounts with random emails, so runs do not
//! interfere with each other or with existing data.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("BAZAAR_TEST_URL").unwrap_or_else(|_| "http://localhost:5001".to_string())
}

/// Absolute URL for an API path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// Client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh, unique email address.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Parse the JSON envelope of a response.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn envelope(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.expect("Response body is not JSON");
    (status, body)
}

/// Register an account through the multipart form.
///
/// # Panics
///
/// Panics if the request cannot be sent.
pub async fn register_as(client: &Client, name: &str, email: &str, password: &str) -> Response {
    let form = Form::new()
        .text("name", name.to_owned())
        .text("email", email.to_owned())
        .text("password", password.to_owned());

    client
        .post(url("/api/users/register"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send registration")
}

/// A logged-in client for a new account, with its email.
///
/// # Panics
///
/// Panics if registration does not succeed.
pub async fn new_user() -> (Client, String) {
    let client = client();
    let email = unique_email();
    let resp = register_as(&client, "Test User", &email, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");
    (client, email)
}

/// Log in with JSON credentials.
///
/// # Panics
///
/// Panics if the request cannot be sent.
pub async fn login(client: &Client, email: &str, password: &str) -> Response {
    client
        .post(url("/api/users/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login")
}

/// Create a product without an image and return its JSON.
///
/// # Panics
///
/// Panics unless the product is created.
pub async fn create_product(client: &Client, name: &str, price: &str) -> Value {
    let form = Form::new()
        .text("name", name.to_owned())
        .text("description", "Created by integration tests")
        .text("price", price.to_owned())
        .text("category", "home");

    let resp = client
        .post(url("/api/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create product");
    let (status, body) = envelope(resp).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

/// Multipart part holding a small file with the given content type.
///
/// # Panics
///
/// Panics if the content type is not a valid MIME type.
#[must_use]
pub fn file_part(bytes: &'static [u8], content_type: &str) -> Part {
    Part::bytes(bytes)
        .file_name("upload.bin")
        .mime_str(content_type)
        .expect("Invalid MIME type")
}

/// Add a product to the session user's cart.
///
/// # Panics
///
/// Panics if the request cannot be sent.
pub async fn add_to_cart(client: &Client, product_id: &Value, quantity: i64) -> Response {
    client
        .post(url("/api/users/cart"))
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart")
}

/// A shipping address accepted by checkout.
#[must_use]
pub fn address() -> Value {
    json!({
        "country": "US",
        "city": "Springfield",
        "address1": "1 Market Street",
        "zipCode": "62701",
        "addressType": "home"
    })
}

/// Direct database access for states the API cannot produce.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
pub async fn db_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("BAZAAR_DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}
