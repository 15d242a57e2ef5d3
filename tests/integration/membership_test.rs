//! Integration tests for organization membership management.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use haven_core::types::{AssignmentId, UserId};
use haven_entity::{PermissionOverrides, Role, RoleAssignment};
use haven_store::AssignmentStore;

use crate::helpers::TestApp;

async fn org_with_admin(app: &TestApp) -> (String, String) {
    let auth = app
        .register_org("Cedar Grove Estates", "olga@example.com", "Quartz-Lantern-42")
        .await;
    let token = auth["accessToken"].as_str().unwrap().to_string();
    let org_id = app.primary_org(&token).await;
    (org_id, token)
}

async fn members(app: &TestApp, org_id: &str, token: &str) -> Vec<Value> {
    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{org_id}/members"),
            None,
            Some(token),
        )
        .await;
    assert_eq!(
        response.status,
        StatusCode::OK,
        "Listing failed: {:?}",
        response.body
    );
    response.body["data"].as_array().unwrap().clone()
}

fn entry_for<'a>(members: &'a [Value], email: &str) -> &'a Value {
    members
        .iter()
        .find(|m| m["user"]["email"] == email)
        .expect("member not listed")
}

fn assignment_id_of(members: &[Value], email: &str) -> String {
    entry_for(members, email)["assignmentId"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_members_listing_is_scoped_to_the_organization() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;
    let tina = app
        .invite_and_accept(&org_id, &admin_token, "tina@example.com", "tenant")
        .await;

    // Any member may view the roster, whatever their role.
    let listed = members(&app, &org_id, tina["accessToken"].as_str().unwrap()).await;
    assert_eq!(listed.len(), 2);
    let admin_entry = entry_for(&listed, "olga@example.com");
    assert_eq!(admin_entry["role"], "admin");
    assert_eq!(admin_entry["isPrimary"], true);

    // An admin of some other organization is not a member here.
    let outsider = app
        .register_org("Harbor Lofts", "maria@example.com", "Copper-Meadow-19")
        .await;
    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{org_id}/members"),
            None,
            Some(outsider["accessToken"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Unknown organizations are not found, even for authenticated callers.
    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{}/members", Uuid::new_v4()),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "GET",
            &format!("/api/organizations/{org_id}/members"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_changing_a_role_respects_the_hierarchy() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;
    app.invite_and_accept(&org_id, &admin_token, "renat@example.com", "tenant")
        .await;
    let mark = app
        .invite_and_accept(&org_id, &admin_token, "mark@example.com", "manager")
        .await;

    let listed = members(&app, &org_id, &admin_token).await;
    let renat_assignment = assignment_id_of(&listed, "renat@example.com");
    let own_assignment = assignment_id_of(&listed, "olga@example.com");

    // Managers hold no manage_roles permission.
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{renat_assignment}/role"),
            Some(serde_json::json!({ "role": "caretaker" })),
            Some(mark["accessToken"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // The admin cannot grant their own level.
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{renat_assignment}/role"),
            Some(serde_json::json!({ "role": "admin" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Nor change their own assignment.
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{own_assignment}/role"),
            Some(serde_json::json!({ "role": "manager" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    // Promoting the tenant to caretaker is within the admin's reach.
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{renat_assignment}/role"),
            Some(serde_json::json!({ "role": "caretaker" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], renat_assignment);
    assert_eq!(response.body["data"]["role"], "caretaker");

    let listed = members(&app, &org_id, &admin_token).await;
    assert_eq!(entry_for(&listed, "renat@example.com")["role"], "caretaker");
}

#[tokio::test]
async fn test_admins_cannot_manage_each_other() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;
    app.invite_and_accept(&org_id, &admin_token, "boris@example.com", "admin")
        .await;

    let listed = members(&app, &org_id, &admin_token).await;
    let boris_assignment = assignment_id_of(&listed, "boris@example.com");

    // Equal rank blocks both demotion and removal.
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{boris_assignment}/role"),
            Some(serde_json::json!({ "role": "tenant" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "DELETE",
            &format!("/api/members/{boris_assignment}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_members_pick_their_own_primary_organization() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    // Maria runs Harbor Lofts, then joins Cedar Grove as a manager.
    let maria = app
        .register_org("Harbor Lofts", "maria@example.com", "Copper-Meadow-19")
        .await;
    let home_org = app.primary_org(maria["accessToken"].as_str().unwrap()).await;

    let response = app
        .request(
            "POST",
            &format!("/api/organizations/{org_id}/invitations"),
            Some(serde_json::json!({ "email": "maria@example.com", "role": "manager" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let invite_token = app.last_emailed_invitation_token();
    let response = app
        .request(
            "POST",
            "/api/invitations/accept",
            Some(serde_json::json!({ "token": invite_token, "password": "Copper-Meadow-19" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let maria_token = response.body["data"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    // Joining did not move her primary.
    assert_eq!(app.primary_org(&maria_token).await, home_org);

    let listed = members(&app, &org_id, &maria_token).await;
    let her_assignment = assignment_id_of(&listed, "maria@example.com");
    let response = app
        .request(
            "POST",
            &format!("/api/members/{her_assignment}/primary"),
            None,
            Some(&maria_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.primary_org(&maria_token).await, org_id);

    // Exactly one of her memberships is primary.
    let me = app
        .request("GET", "/api/auth/me", None, Some(&maria_token))
        .await;
    let memberships = me.body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);
    for membership in memberships {
        let expect_primary = membership["organizationId"] == org_id.as_str();
        assert_eq!(membership["isPrimary"], expect_primary);
    }
}

#[tokio::test]
async fn test_removing_a_member_ends_their_sessions() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;
    let renat = app
        .invite_and_accept(&org_id, &admin_token, "renat@example.com", "tenant")
        .await;
    let renat_access = renat["accessToken"].as_str().unwrap();
    let renat_refresh = renat["refreshToken"].as_str().unwrap();

    let listed = members(&app, &org_id, &admin_token).await;
    let renat_assignment = assignment_id_of(&listed, "renat@example.com");
    let admin_assignment = assignment_id_of(&listed, "olga@example.com");

    // A tenant cannot remove anyone.
    let response = app
        .request(
            "DELETE",
            &format!("/api/members/{admin_assignment}"),
            None,
            Some(renat_access),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "DELETE",
            &format!("/api/members/{renat_assignment}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(members(&app, &org_id, &admin_token).await.len(), 1);

    // That was their only membership, so their refresh sessions die too.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": renat_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // The access token rides out its TTL but carries no memberships.
    let me = app
        .request("GET", "/api/auth/me", None, Some(renat_access))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["organizationId"], Value::Null);
    assert!(me.body["data"]["memberships"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_a_seated_super_admin_outranks_the_admin() {
    let app = TestApp::new();
    let (org_id, admin_token) = org_with_admin(&app).await;

    // No HTTP surface grants superAdmin, so the operator seat is seeded
    // straight into the store.
    let root = app
        .register_org("Haven Platform Operations", "root@example.com", "Quartz-Lantern-42")
        .await;
    let root_token = root["accessToken"].as_str().unwrap();
    let root_id: UserId = root["user"]["id"].as_str().unwrap().parse().unwrap();

    let now = Utc::now();
    let seat = RoleAssignment {
        id: AssignmentId::new(),
        user_id: root_id,
        organization_id: org_id.parse().unwrap(),
        role: Role::SuperAdmin,
        property_id: None,
        unit_id: None,
        permission_overrides: PermissionOverrides::new(),
        is_primary: false,
        created_at: now,
        updated_at: now,
    };
    app.store.insert_assignment(&seat).await.unwrap();

    // Even the organization's own admin sits below the operator; the org
    // keeps an administrator because the operator seat counts as one.
    let listed = members(&app, &org_id, root_token).await;
    let olga_assignment = assignment_id_of(&listed, "olga@example.com");
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{olga_assignment}/role"),
            Some(serde_json::json!({ "role": "manager" })),
            Some(root_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["role"], "manager");

    // The demoted admin has no reach over the operator's seat.
    let seat_id = seat.id.to_string();
    let response = app
        .request(
            "PATCH",
            &format!("/api/members/{seat_id}/role"),
            Some(serde_json::json!({ "role": "tenant" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
