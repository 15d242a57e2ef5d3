//! Integration tests for the invitation lifecycle.

use axum::http::StatusCode;
use chrono::Duration;

use crate::helpers::TestApp;

async fn org_with_admin(app: &TestApp) -> (String, String) {
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let token = auth["accessToken"].as_str().unwrap().to_string();
    let org_id = app.primary_org(&token).await;
    (org_id, token)
}

#[tokio::test]
async fn test_invitation_lifecycle_for_a_new_member() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "pending");
    // The acceptance token never leaves the email.
    assert!(response.body["data"].get("token").is_none());

    let emailed = app.mailer.sent();
    assert_eq!(emailed.len(), 1);
    assert_eq!(emailed[0].to, "renat@example.com");

    let invite_token = app.last_emailed_invitation_token();
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": invite_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let member_access = response.body["data"]["accessToken"].as_str().unwrap();

    let me = app
        .request("GET", "/api/auth/me", None, Some(member_access))
        .await;
    let memberships = me.body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0]["role"], "tenant");
    assert_eq!(memberships[0]["organizationId"], org_id);
    assert_eq!(memberships[0]["isPrimary"], true);

    // The invitation is spent.
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": invite_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inviting_needs_permission_and_respects_rank() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    // Anonymous callers cannot invite.
    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let manager = app
        .invite_and_accept(&org_id, &admin_token, "mark@example.com", "manager")
        .await;
    let manager_token = manager["accessToken"].as_str().unwrap();

    // A manager cannot offer a role above their own.
    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "propertyOwner" })),
            Some(manager_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // At their own level is fine.
    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "manager" })),
            Some(manager_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let tenant = app.invite_and_accept(&org_id, &admin_token, "tina@example.com", "tenant").await;
    let tenant_token = tenant["accessToken"].as_str().unwrap();

    // Tenants hold no invite permission at all.
    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "another@example.com", "role": "tenant" })),
            Some(tenant_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_pending_invitation_conflicts() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let response = app
            .request(
                "POST",
                &format!("/api/organizations/{org_id}/invitations"),
                Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
                Some(&admin_token),
            )
            .await;
        assert_eq!(response.status, expected);
    }
}

#[tokio::test]
async fn test_listing_invitations_requires_invite_permission() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;
    let tenant = app.invite_and_accept(&org_id, &admin_token, "tina@example.com", "tenant").await;

    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{org_id}/invitations"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{org_id}/invitations"),
            None,
            Some(tenant["accessToken"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_declined_invitations_cannot_be_accepted() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    app.request(
        "POST",
        &format!("/api/organizations/{org_id}/invitations"),
        Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
        Some(&admin_token),
    )
    .await;
    let invite_token = app.last_emailed_invitation_token();

    let response = app
        .request(
            "POST",
            "/api/invitations/decline",
            Some(serde_json::json!({ "token": invite_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": invite_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoking_is_gated_and_final() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
            Some(&admin_token),
        )
        .await;
    let invitation_id = response.body["data"]["id"].as_str().unwrap().to_string();
    let invite_token = app.last_emailed_invitation_token();

    // An admin of some other organization has no say here.
    let outsider = app
        .register_org("Harbor Lofts", "maria@example.com", "Copper-Meadow-19")
        .await;
    let response = app
        .request(
            "DELETE",
            &format!("/api/invitations/{invitation_id}"),
            None,
            Some(outsider["accessToken"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "DELETE",
            &format!("/api/invitations/{invitation_id}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Revoked means revoked: no acceptance, no second revoke.
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": invite_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "DELETE",
            &format!("/api/invitations/{invitation_id}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_resending_rotates_the_emailed_token() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
            Some(&admin_token),
        )
        .await;
    let invitation_id = response.body["data"]["id"].as_str().unwrap().to_string();
    let old_token = app.last_emailed_invitation_token();

    let response = app
        .request(
            "POST",
            &format!("/api/invitations/{invitation_id}/resend"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.mailer.sent().len(), 2);

    let new_token = app.last_emailed_invitation_token();
    assert_ne!(new_token, old_token);

    // The superseded token is gone entirely.
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": old_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": new_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_accepting_as_an_existing_account_verifies_their_password() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    // Maria runs her own organization already.
    app.register_org("Harbor Lofts", "maria@example.com", "Copper-Meadow-19")
        .await;

    app.request(
        "POST",
        &format!("/api/organizations/{org_id}/invitations"),
        Some(serde_json::json!({ "email": "maria@example.com", "role": "manager" })),
        Some(&admin_token),
    )
    .await;
    let invite_token = app.last_emailed_invitation_token();

    // No password, then a wrong one.
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({ "token": invite_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({ "token": invite_token, "password": "not-her-password" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({ "token": invite_token, "password": "Copper-Meadow-19" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Two memberships now; her original admin seat stays primary.
    let access = response.body["data"]["accessToken"].as_str().unwrap();
    let me = app.request("GET", "/api/auth/me", None, Some(access)).await;
    let memberships = me.body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);
    let joined = memberships
        .iter()
        .find(|m| m["organizationId"] == org_id)
        .unwrap();
    assert_eq!(joined["role"], "manager");
    assert_eq!(joined["isPrimary"], false);
}

#[tokio::test]
async fn test_expired_invitations_cannot_be_accepted() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    app.request(
        "POST",
        &format!("/api/organizations/{org_id}/invitations"),
        Some(serde_json::json!({ "email": "renat@example.com", "role": "tenant" })),
        Some(&admin_token),
    )
    .await;
    let invite_token = app.last_emailed_invitation_token();

    app.clock.advance(Duration::days(8));
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({
                "token": invite_token,
                "password": "Velvet-Compass-77",
                "firstName": "Renat",
                "lastName": "Ibragimov",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
