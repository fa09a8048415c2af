//! Integration tests for the catalog.
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

use bazaar_integration_tests::{client, create_product, envelope, file_part, new_user, url};
use reqwest::StatusCode;
use reqwest::multipart::Form;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_create_without_image_uses_placeholder() {
    let (client, email) = new_user().await;

    let product = create_product(&client, "Stool", "45.00").await;

    assert_eq!(product["userEmail"], email.as_str());
    assert_eq!(product["price"], "45.00");
    assert_eq!(product["category"], "home");
    assert!(product["imageUrl"].as_str().is_some_and(|u| !u.is_empty()));

    // Public reads
    let anonymous = self::client();
    let (status, body) = envelope(
        anonymous
            .get(url(&format!("/api/products/{}", product["id"])))
            .send()
            .await
            .expect("Failed to get product"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Stool");

    let (_, body) = envelope(
        anonymous
            .get(url(&format!("/api/products/user/{email}")))
            .send()
            .await
            .expect("Failed to list products"),
    )
    .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_create_validation() {
    let (client, _) = new_user().await;

    let resp = client
        .post(url("/api/products"))
        .multipart(Form::new().text("name", "Chair").text("price", "cheap"))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(url("/api/products"))
        .multipart(
            Form::new()
                .text("name", "Chair")
                .text("price", "10")
                .text("category", "weapons"),
        )
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, body) = envelope(
        client
            .post(url("/api/products"))
            .multipart(
                Form::new()
                    .text("name", "Chair")
                    .text("price", "10")
                    .part("image", file_part(b"%PDF-1.4", "application/pdf")),
            )
            .send()
            .await
            .expect("Failed to create product"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only image files are allowed!");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_non_owner_cannot_modify() {
    let (owner, _) = new_user().await;
    let product = create_product(&owner, "Bench", "120.00").await;
    let (intruder, _) = new_user().await;

    let resp = intruder
        .put(url(&format!("/api/products/{}", product["id"])))
        .multipart(Form::new().text("price", "1.00"))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = intruder
        .delete(url(&format!("/api/products/{}", product["id"])))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Record unchanged
    let (status, body) = envelope(
        client()
            .get(url(&format!("/api/products/{}", product["id"])))
            .send()
            .await
            .expect("Failed to get product"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], "120.00");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_owner_updates_and_deletes() {
    let (owner, email) = new_user().await;
    let product = create_product(&owner, "Shelf", "60.00").await;

    let (status, body) = envelope(
        owner
            .put(url(&format!("/api/products/{}", product["id"])))
            .multipart(
                Form::new()
                    .text("name", "Tall Shelf")
                    .text("userEmail", email.clone()),
            )
            .send()
            .await
            .expect("Failed to update product"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Tall Shelf");
    assert_eq!(body["data"]["price"], "60.00");

    let resp = owner
        .delete(url(&format!(
            "/api/products/{}?userEmail={email}",
            product["id"]
        )))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client()
        .get(url(&format!("/api/products/{}", product["id"])))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_create_requires_session() {
    let resp = client()
        .post(url("/api/products"))
        .multipart(Form::new().text("name", "Ghost").text("price", "1"))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
