//! Integration tests for the cart.
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

use bazaar_integration_tests::{add_to_cart, create_product, envelope, new_user, url};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_re_adding_overwrites_quantity() {
    let (client, email) = new_user().await;
    let product = create_product(&client, "Teapot", "24.00").await;

    let resp = add_to_cart(&client, &product["id"], 2).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let (status, body) = envelope(add_to_cart(&client, &product["id"], 5).await).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["productId"], product["id"]);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(body["data"]["subtotal"], "120.00");

    // The read endpoint agrees
    let (_, body) = envelope(
        client
            .get(url(&format!("/api/users/cart/{email}")))
            .send()
            .await
            .expect("Failed to read cart"),
    )
    .await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["items"][0]["product"]["name"], "Teapot");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_distinct_products_get_distinct_lines() {
    let (client, _) = new_user().await;
    let cup = create_product(&client, "Cup", "3.50").await;
    let saucer = create_product(&client, "Saucer", "2.00").await;

    add_to_cart(&client, &cup["id"], 1).await;
    let (_, body) = envelope(add_to_cart(&client, &saucer["id"], 2).await).await;

    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["subtotal"], "7.50");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_invalid_quantities_rejected() {
    let (client, _) = new_user().await;
    let product = create_product(&client, "Spoon", "1.00").await;

    let resp = add_to_cart(&client, &product["id"], 0).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = add_to_cart(&client, &product["id"], -3).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_update_quantity() {
    let (client, _) = new_user().await;
    let product = create_product(&client, "Kettle", "30.00").await;

    // Not in the cart yet
    let resp = client
        .put(url("/api/users/cart"))
        .json(&json!({ "productId": product["id"], "quantity": 2 }))
        .send()
        .await
        .expect("Failed to update cart");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    add_to_cart(&client, &product["id"], 1).await;
    let (status, body) = envelope(
        client
            .put(url("/api/users/cart"))
            .json(&json!({ "productId": product["id"], "quantity": 3 }))
            .send()
            .await
            .expect("Failed to update cart"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 3);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_unknown_product_not_found() {
    let (client, _) = new_user().await;

    let resp = add_to_cart(&client, &json!(i64::MAX), 1).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_of_other_user_forbidden() {
    let (client, _) = new_user().await;
    let (_, other_email) = new_user().await;

    let resp = client
        .get(url(&format!("/api/users/cart/{other_email}")))
        .send()
        .await
        .expect("Failed to read cart");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
