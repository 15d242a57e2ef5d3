//! Integration tests for registration, login, and the session lifecycle.

use axum::http::StatusCode;
use chrono::Duration;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_creates_organization_and_admin() {
    let app = TestApp::new();
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    assert!(auth["accessToken"].as_str().is_some());
    assert!(auth["refreshToken"].as_str().is_some());
    assert_eq!(auth["user"]["email"], "olga@example.com");

    let token = auth["accessToken"].as_str().unwrap();
    let me = app.request("GET", "/api/auth/me", None, Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);

    let memberships = me.body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0]["role"], "admin");
    assert_eq!(memberships[0]["isPrimary"], true);
    assert_eq!(
        me.body["data"]["organizationId"],
        memberships[0]["organizationId"]
    );
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "organizationName": "Harbor Lofts",
                // Same address, different case.
                "email": "Olga@Example.com",
                "password": "Velvet-Compass-77",
                "firstName": "Olga",
                "lastName": "Marin",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_register_validates_the_payload() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "organizationName": "Cedar Grove Estates",
                "email": "not-an-email",
                "password": "Quartz-Lantern-42",
                "firstName": "Olga",
                "lastName": "Marin",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Weak passwords are caught by the policy, not just the DTO.
    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "organizationName": "Cedar Grove Estates",
                "email": "olga@example.com",
                "password": "password1A",
                "firstName": "Olga",
                "lastName": "Marin",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "olga@example.com",
                "password": "wrong-password",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Unknown accounts answer identically.
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "nobody@example.com",
                "password": "wrong-password",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    for _ in 0..5 {
        let response = app
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "email": "olga@example.com",
                    "password": "wrong-password",
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // Locked now; even the correct password fails.
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "olga@example.com",
                "password": "Quartz-Lantern-42",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // The lock expires on its own.
    app.clock.advance(Duration::minutes(16));
    app.login("olga@example.com", "Quartz-Lantern-42").await;
}

#[tokio::test]
async fn test_me_requires_a_valid_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_replay_burns_the_family() {
    let app = TestApp::new();
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let first = auth["refreshToken"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": first })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let second = response.body["data"]["refreshToken"].as_str().unwrap();
    assert_ne!(second, first);

    // Replaying the rotated token is treated as theft.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": first })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // The whole family is dead, successor included.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": second })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_the_refresh_token_only() {
    let app = TestApp::new();
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let access = auth["accessToken"].as_str().unwrap();
    let refresh = auth["refreshToken"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/logout",
            Some(serde_json::json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Access tokens are stateless; the one in hand rides out its TTL.
    let response = app.request("GET", "/api/auth/me", None, Some(access)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_burns_every_session() {
    let app = TestApp::new();
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let access = auth["accessToken"].as_str().unwrap();
    let refresh = auth["refreshToken"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "currentPassword": "Quartz-Lantern-42",
                "newPassword": "Velvet-Compass-77",
            })),
            Some(access),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The pre-change refresh token no longer works.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Only the new password signs in.
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "olga@example.com",
                "password": "Quartz-Lantern-42",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    app.login("olga@example.com", "Velvet-Compass-77").await;
}

#[tokio::test]
async fn test_change_password_checks_the_current_one() {
    let app = TestApp::new();
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let access = auth["accessToken"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(serde_json::json!({
                "currentPassword": "not-the-password",
                "newPassword": "Velvet-Compass-77",
            })),
            Some(access),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(serde_json::json!({ "email": "olga@example.com" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let code = app.last_emailed_reset_code();

    // The code alone cannot set a weak password.
    let response = app
        .request(
            "POST",
            "/api/auth/reset-password",
            Some(serde_json::json!({ "token": code, "newPassword": "short" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/auth/reset-password",
            Some(serde_json::json!({ "token": code, "newPassword": "Velvet-Compass-77" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Single use.
    let response = app
        .request(
            "POST",
            "/api/auth/reset-password",
            Some(serde_json::json!({ "token": code, "newPassword": "Copper-Meadow-19" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    app.login("olga@example.com", "Velvet-Compass-77").await;
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(serde_json::json!({ "email": "nobody@example.com" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_expired_reset_codes_are_rejected() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    app.request(
        "POST",
        "/api/auth/forgot-password",
        Some(serde_json::json!({ "email": "olga@example.com" })),
        None,
    )
    .await;
    let code = app.last_emailed_reset_code();

    app.clock.advance(Duration::minutes(61));
    let response = app
        .request(
            "POST",
            "/api/auth/reset-password",
            Some(serde_json::json!({ "token": code, "newPassword": "Velvet-Compass-77" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_listing_and_device_revocation() {
    let app = TestApp::new();
    app.register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;

    let phone = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "olga@example.com",
                "password": "Quartz-Lantern-42",
                "deviceId": "phone-1",
            })),
            None,
        )
        .await;
    assert_eq!(phone.status, StatusCode::OK);
    let phone_refresh = phone.body["data"]["refreshToken"].as_str().unwrap();
    let laptop = app.login("olga@example.com", "Quartz-Lantern-42").await;
    let access = laptop["accessToken"].as_str().unwrap();

    // Registration, the phone login, and this login.
    let response = app
        .request("GET", "/api/auth/sessions", None, Some(access))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let sessions = response.body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 3);
    assert!(
        sessions
            .iter()
            .any(|session| session["deviceId"] == "phone-1")
    );
    // Refresh tokens themselves never appear in the listing.
    assert!(sessions.iter().all(|session| session.get("token").is_none()));

    let response = app
        .request("DELETE", "/api/auth/sessions/phone-1", None, Some(access))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/auth/sessions", None, Some(access))
        .await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);

    // The phone's refresh token died with its device.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({
                "refreshToken": phone_refresh,
                "deviceId": "phone-1",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
