/// Integration tests for the maktab API
///
/// These tests verify the full system works end-to-end:
/// - Public registration with validation and capacity enforcement
/// - Concurrent submissions for the last seat
/// - Authentication and slot-admin scoping
/// - Attendance recording with count and attachment validation
/// - The public form's availability view

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use maktab_shared::auth::password::hash_password;
use maktab_shared::models::admin::{Admin, AdminRole, CreateAdmin};
use maktab_shared::models::class::{Class, CreateClass};
use serde_json::json;
use tower::Service as _;

/// Test the public registration happy path and the duplicate-mobile rejection
#[tokio::test]
async fn test_public_registration_flow() {
    let ctx = TestContext::new().await.unwrap();
    let mobile = common::unique_mobile();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(
            common::registration_body(ctx.slot.id, &mobile).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let response_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(response_json["id"].is_string());
    assert_eq!(response_json["whatsapp_mobile"], mobile);

    // Same mobile number again is a conflict
    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(
            common::registration_body(ctx.slot.id, &mobile).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
}

/// Test that field validation rejects bad input before any write
#[tokio::test]
async fn test_registration_validation() {
    let ctx = TestContext::new().await.unwrap();

    let mut body = common::registration_body(ctx.slot.id, &common::unique_mobile());
    body["email"] = json!("not-an-email");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let response_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response_json["error"], "validation_error");

    ctx.cleanup().await.unwrap();
}

/// Test that a submission to an unknown slot is a 404, not a silent failure
#[tokio::test]
async fn test_registration_unknown_slot() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(
            common::registration_body(uuid::Uuid::new_v4(), &common::unique_mobile()).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

/// Test that concurrent submissions for the last seat admit exactly one
///
/// Five applicants race for a one-seat slot. The capacity check locks the
/// slot row before counting, so exactly one submission may win; the rest
/// get a `slot_full` conflict.
#[tokio::test]
async fn test_concurrent_submissions_respect_capacity() {
    let ctx = TestContext::with_capacity(1).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let mut app = ctx.app.clone();
        let body = common::registration_body(ctx.slot.id, &common::unique_mobile());

        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/v1/register")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();

            app.call(request).await.unwrap().status()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("Unexpected status: {}", other),
        }
    }

    assert_eq!(created, 1, "Exactly one submission should win the last seat");
    assert_eq!(conflicts, 4);

    ctx.cleanup().await.unwrap();
}

/// Test that admin routes reject missing and garbage tokens
#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    // No Authorization header
    let request = Request::builder()
        .method("GET")
        .uri("/v1/registrations")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage token
    let request = Request::builder()
        .method("GET")
        .uri("/v1/registrations")
        .header("authorization", "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Test that a slot admin only sees and touches their own slot's data
#[tokio::test]
async fn test_slot_admin_scoped_to_own_slot() {
    let ctx = TestContext::new().await.unwrap();
    let other_slot = ctx.create_slot(15).await.unwrap();

    // One registration in each slot
    for slot_id in [ctx.slot.id, other_slot.id] {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/register")
            .header("content-type", "application/json")
            .body(Body::from(
                common::registration_body(slot_id, &common::unique_mobile()).to_string(),
            ))
            .unwrap();
        let response = ctx.app.clone().call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // The slot admin's listing only covers their assigned slot
    let request = Request::builder()
        .method("GET")
        .uri("/v1/registrations")
        .header("authorization", ctx.slot_admin_header(ctx.slot.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["slot_id"], ctx.slot.id.to_string());

    // Deleting a registration in another slot is forbidden
    let other_registration_id = {
        let rows =
            maktab_shared::models::registration::Registration::list_by_slot(&ctx.db, other_slot.id)
                .await
                .unwrap();
        rows[0].id
    };

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/registrations/{}", other_registration_id))
        .header("authorization", ctx.slot_admin_header(ctx.slot.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup_slot(other_slot.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test that a slot admin with no slot on their token sees no rows
///
/// The account state is unreachable through the admin endpoints, but the
/// listing scope must not widen if a token ever carries it.
#[tokio::test]
async fn test_slot_admin_without_assignment_sees_nothing() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(
            common::registration_body(ctx.slot.id, &common::unique_mobile()).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for uri in ["/v1/registrations", "/v1/attendance"] {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", ctx.unassigned_slot_admin_header())
            .body(Body::empty())
            .unwrap();

        let response = ctx.app.clone().call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let listed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 0, "{} leaked rows", uri);
    }

    ctx.cleanup().await.unwrap();
}

/// Test the admin list views' search and sort parameters
///
/// Slots, admins, and classes go through the same search/sort helpers as
/// registrations; each list is narrowed by a unique marker and the class
/// list is additionally sorted both ways.
#[tokio::test]
async fn test_admin_list_views_search_and_sort() {
    let ctx = TestContext::new().await.unwrap();
    let marker = uuid::Uuid::new_v4().simple().to_string();

    let mut classes = Vec::new();
    for name in ["beta", "alpha"] {
        classes.push(
            Class::create(
                &ctx.db,
                CreateClass {
                    name: format!("{} {}", marker, name),
                    description: "Morning recitation".to_string(),
                    duration_minutes: 45,
                },
            )
            .await
            .unwrap(),
        );
    }

    let list = |uri: String| {
        let mut app = ctx.app.clone();
        let auth = ctx.auth_header();
        async move {
            let request = Request::builder()
                .method("GET")
                .uri(uri)
                .header("authorization", auth)
                .body(Body::empty())
                .unwrap();
            let response = app.call(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            json.as_array().unwrap().clone()
        }
    };

    // Search narrows the class list to the marked pair; the name sort
    // orders them in either direction.
    let ascending = list(format!("/v1/classes?search={}&sort=name", marker)).await;
    assert_eq!(ascending.len(), 2);
    assert_eq!(ascending[0]["name"], format!("{} alpha", marker));

    let descending = list(format!(
        "/v1/classes?search={}&sort=name&direction=desc",
        marker
    ))
    .await;
    assert_eq!(descending[0]["name"], format!("{} beta", marker));

    // The slot list narrows by display name (the name's unique suffix
    // keeps the query URI-safe)
    let slot_needle = ctx.slot.display_name.split_whitespace().last().unwrap();
    let slots = list(format!("/v1/slots?search={}&sort=name", slot_needle)).await;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["id"], ctx.slot.id.to_string());

    // The admin list narrows by username
    let admins = list(format!("/v1/admins?search={}", ctx.admin.username)).await;
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["username"], ctx.admin.username);

    // The attendance list accepts the same parameters
    let records = list("/v1/attendance?search=no-such-record&sort=total_students".to_string()).await;
    assert_eq!(records.len(), 0);

    for class in classes {
        Class::delete(&ctx.db, class.id).await.unwrap();
    }
    ctx.cleanup().await.unwrap();
}

/// Test attendance creation: validation failures, success, and duplicates
#[tokio::test]
async fn test_attendance_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let class = Class::create(
        &ctx.db,
        CreateClass {
            name: format!("Test Class {}", uuid::Uuid::new_v4()),
            description: "Evening tajweed group".to_string(),
            duration_minutes: 60,
        },
    )
    .await
    .unwrap();

    let auth = ctx.slot_admin_header(ctx.slot.id);
    let record = |present: i32, attachments: serde_json::Value| {
        json!({
            "class_id": class.id,
            "slot_id": ctx.slot.id,
            "attendance_date": "2026-08-20",
            "students_present": present,
            "students_absent": 3,
            "students_on_leave": 1,
            "total_students": 10,
            "attachments": attachments,
        })
    };

    // Counts that do not sum are rejected before any write
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(
            record(5, json!([common::attachment_body("a.jpg")])).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A record without attachments is rejected too
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(record(6, json!([])).to_string()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Valid record succeeds
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(
            record(6, json!([common::attachment_body("a.jpg")])).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same (class, slot, date) again is a conflict
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(
            record(6, json!([common::attachment_body("a.jpg")])).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
    Class::delete(&ctx.db, class.id).await.unwrap();
}

/// Test that the public form hides a slot once it fills up
#[tokio::test]
async fn test_form_hides_full_slot() {
    let ctx = TestContext::with_capacity(1).await.unwrap();

    let slot_listed = |body: &serde_json::Value| {
        body["available_slots"]
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry["slot"]["id"] == ctx.slot.id.to_string())
    };

    // Open slot appears on the form
    let request = Request::builder()
        .method("GET")
        .uri("/v1/form?refresh=true")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let form: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(slot_listed(&form));

    // Fill the only seat
    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("content-type", "application/json")
        .body(Body::from(
            common::registration_body(ctx.slot.id, &common::unique_mobile()).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A forced refresh no longer lists the slot
    let request = Request::builder()
        .method("GET")
        .uri("/v1/form?refresh=true")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let form: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(!slot_listed(&form));

    ctx.cleanup().await.unwrap();
}

/// Test login with real credentials and the refresh-token exchange
#[tokio::test]
async fn test_login_and_refresh() {
    let ctx = TestContext::new().await.unwrap();

    let username = format!("login-test-{}", uuid::Uuid::new_v4());
    let password = "correct-horse-battery";
    let admin = Admin::create(
        &ctx.db,
        CreateAdmin {
            username: username.clone(),
            password_hash: hash_password(password).unwrap(),
            role: AdminRole::SuperAdmin,
            assigned_slot_id: None,
            tajweed_levels: None,
        },
    )
    .await
    .unwrap();

    // Wrong password is rejected
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "username": username, "password": "wrong" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password yields both tokens
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let login: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(login["role"], "super_admin");
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    // The refresh token exchanges for a working access token
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/refresh")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "refresh_token": refresh_token }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let refreshed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let access_token = refreshed["access_token"].as_str().unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/registrations")
        .header("authorization", format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    Admin::delete(&ctx.db, admin.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test that report downloads are super-admin only and validate the format
#[tokio::test]
async fn test_report_download_authorization() {
    let ctx = TestContext::new().await.unwrap();

    // Slot admins cannot bulk-export attachments
    let request = Request::builder()
        .method("GET")
        .uri("/v1/reports/pdf")
        .header("authorization", ctx.slot_admin_header(ctx.slot.id))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown format is rejected
    let request = Request::builder()
        .method("GET")
        .uri("/v1/reports/xlsx")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}
