//! Integration tests for registration, login and profiles.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (bazaar-cli migrate)
//! - The API running (cargo run -p bazaar-api)
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

use bazaar_integration_tests::{
    PASSWORD, address, client, envelope, login, new_user, register_as, unique_email, url,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_returns_public_fields() {
    let client = client();
    let email = unique_email();

    let (status, body) = envelope(register_as(&client, "Ada", &email, PASSWORD).await).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["data"]["email"], email.as_str());
    assert_eq!(body["data"]["name"], "Ada");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());

    // Registration logs the user in
    let resp = client
        .get(url(&format!("/api/users/profile/{email}")))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration_conflicts() {
    let (first, email) = new_user().await;

    let other = client();
    let (status, body) =
        envelope(register_as(&other, "Impostor", &email, "another password").await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    // Existing account untouched: old password still works, name unchanged
    let resp = login(&other, &email, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, profile) = envelope(
        first
            .get(url(&format!("/api/users/profile/{email}")))
            .send()
            .await
            .expect("Failed to get profile"),
    )
    .await;
    assert_eq!(profile["data"]["name"], "Test User");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_registration_validation() {
    let client = client();

    let resp = register_as(&client, "Short", &unique_email(), "short").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register_as(&client, "Bad Email", "not-an-email", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register_as(&client, "   ", &unique_email(), PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_unauthorized_without_fields() {
    let (_, email) = new_user().await;

    let (status, body) = envelope(login(&client(), &email, "wrong password!").await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
    assert_eq!(body["message"], "Invalid email or password");

    // Unknown accounts look the same
    let (status, body) = envelope(login(&client(), &unique_email(), PASSWORD).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("data").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_of_other_user_forbidden() {
    let (client, _) = new_user().await;
    let (_, other_email) = new_user().await;

    let resp = client
        .get(url(&format!("/api/users/profile/{other_email}")))
        .send()
        .await
        .expect("Failed to get profile");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_add_address_appends() {
    let (client, email) = new_user().await;

    for _ in 0..2 {
        let (status, body) = envelope(
            client
                .post(url("/api/users/address"))
                .json(&json!({ "email": email, "address": address() }))
                .send()
                .await
                .expect("Failed to add address"),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (_, profile) = envelope(
        client
            .get(url(&format!("/api/users/profile/{email}")))
            .send()
            .await
            .expect("Failed to get profile"),
    )
    .await;
    assert_eq!(profile["data"]["addresses"].as_array().map(Vec::len), Some(2));

    let resp = client
        .post(url("/api/users/address"))
        .json(&json!({
            "address": { "country": "", "city": "x", "address1": "y", "zipCode": "z" }
        }))
        .send()
        .await
        .expect("Failed to add address");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_logout_ends_session() {
    let (client, email) = new_user().await;

    let resp = client
        .post(url("/api/users/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(url(&format!("/api/users/profile/{email}")))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
