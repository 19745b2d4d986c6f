//! HTTP-level integration tests for the reservation workflow.
//!
//! Covers the state machine (pending, approved, rejected, cancelled),
//! half-open overlap detection, cancellation authorization, and the
//! availability listing.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, post_json_auth, put_json_auth, seed_car, seed_user,
    token_for,
};
use sqlx::PgPool;

use motorpool_core::roles::{ROLE_ADMIN, ROLE_MANAGER, ROLE_USER};

const WINDOW_A_START: &str = "2026-09-10T00:00:00Z";
const WINDOW_A_END: &str = "2026-09-15T00:00:00Z";

/// Create a reservation through the API and return the parsed body.
async fn create_reservation(
    pool: &PgPool,
    token: &str,
    car_id: i64,
    starts_at: &str,
    ends_at: &str,
) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({
        "car_id": car_id,
        "starts_at": starts_at,
        "ends_at": ends_at,
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/reservations",
        token,
        body,
    )
    .await;
    let status = response.status();
    let json = body_json(response).await;
    (status, json)
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// A plain user's reservation is created as pending with no approver.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_user_creates_pending_reservation(pool: PgPool) {
    let user = seed_user(&pool, "driver@test.com", true, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-001").await;
    let token = token_for(user.id, &["user"]);

    let (status, json) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["user_id"], user.id);
    assert_eq!(json["car_id"], car.id);
    assert!(json["approved_by"].is_null());
    assert!(json["approved_at"].is_null());
}

/// A manager's own reservation is approved immediately, with the manager
/// recorded as approver.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_manager_reservation_auto_approved(pool: PgPool) {
    let manager = seed_user(&pool, "mgr@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-002").await;
    let token = token_for(manager.id, &["manager"]);

    let (status, json) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "approved");
    assert_eq!(json["approved_by"], manager.id);
    assert!(json["approved_at"].is_string());
}

/// A user with `can_reserve = false` is rejected with 403.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_unentitled_user_cannot_reserve(pool: PgPool) {
    let user = seed_user(&pool, "norights@test.com", false, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-003").await;
    let token = token_for(user.id, &["user"]);

    let (status, _json) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// An interval whose start is not strictly before its end returns 400.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_degenerate_interval_rejected(pool: PgPool) {
    let user = seed_user(&pool, "zero@test.com", true, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-004").await;
    let token = token_for(user.id, &["user"]);

    let (status, _json) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_START).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Reservation for a nonexistent car returns 404.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_car_returns_404(pool: PgPool) {
    let user = seed_user(&pool, "nocar@test.com", true, &[ROLE_USER]).await;
    let token = token_for(user.id, &["user"]);

    let (status, _json) =
        create_reservation(&pool, &token, 999_999, WINDOW_A_START, WINDOW_A_END).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// A manager can reserve on behalf of another user; a plain user cannot.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_reserve_for_another_user(pool: PgPool) {
    let manager = seed_user(&pool, "booker@test.com", true, &[ROLE_MANAGER]).await;
    let driver = seed_user(&pool, "passenger@test.com", true, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-005").await;

    let body = serde_json::json!({
        "car_id": car.id,
        "user_id": driver.id,
        "starts_at": WINDOW_A_START,
        "ends_at": WINDOW_A_END,
    });

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/reservations",
        &token_for(manager.id, &["manager"]),
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["user_id"], driver.id);
    assert_eq!(json["approved_by"], manager.id);

    // A plain user targeting someone else is forbidden.
    let other = seed_user(&pool, "sneaky@test.com", true, &[ROLE_USER]).await;
    let body = serde_json::json!({
        "car_id": car.id,
        "user_id": driver.id,
        "starts_at": "2026-10-01T00:00:00Z",
        "ends_at": "2026-10-02T00:00:00Z",
    });
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/reservations",
        &token_for(other.id, &["user"]),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Overlap detection
// ---------------------------------------------------------------------------

/// An interval overlapping an approved reservation is rejected with 409;
/// pending reservations do not block.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_overlap_with_approved_conflicts(pool: PgPool) {
    let manager = seed_user(&pool, "approver@test.com", true, &[ROLE_MANAGER]).await;
    let user = seed_user(&pool, "late@test.com", true, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-010").await;
    let manager_token = token_for(manager.id, &["manager"]);
    let user_token = token_for(user.id, &["user"]);

    // Approved Sep 10-15 (manager auto-approval).
    let (status, _) =
        create_reservation(&pool, &manager_token, car.id, WINDOW_A_START, WINDOW_A_END).await;
    assert_eq!(status, StatusCode::CREATED);

    // Sep 12-18 intersects the approved window.
    let (status, json) = create_reservation(
        &pool,
        &user_token,
        car.id,
        "2026-09-12T00:00:00Z",
        "2026-09-18T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

/// Back-to-back intervals do not conflict: one ending exactly when the
/// other starts is allowed (half-open windows).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_boundary_touch_is_not_a_conflict(pool: PgPool) {
    let manager = seed_user(&pool, "backtoback@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-011").await;
    let token = token_for(manager.id, &["manager"]);

    let (status, _) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;
    assert_eq!(status, StatusCode::CREATED);

    // Starts exactly at the previous end.
    let (status, json) = create_reservation(
        &pool,
        &token,
        car.id,
        WINDOW_A_END,
        "2026-09-20T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "approved");
}

/// A pending reservation in the same window does not block creation.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_pending_does_not_block(pool: PgPool) {
    let alice = seed_user(&pool, "alice@test.com", true, &[ROLE_USER]).await;
    let bob = seed_user(&pool, "bob@test.com", true, &[ROLE_USER]).await;
    let car = seed_car(&pool, "KR-012").await;

    let (status, _) = create_reservation(
        &pool,
        &token_for(alice.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = create_reservation(
        &pool,
        &token_for(bob.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Approval / rejection
// ---------------------------------------------------------------------------

/// A manager approves a pending reservation; a second decision on the same
/// reservation returns 409.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_approve_then_terminal_guard(pool: PgPool) {
    let user = seed_user(&pool, "requester@test.com", true, &[ROLE_USER]).await;
    let manager = seed_user(&pool, "decider@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-020").await;

    let (_, created) = create_reservation(
        &pool,
        &token_for(user.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let manager_token = token_for(manager.id, &["manager"]);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/approve"),
        &manager_token,
        serde_json::json!({ "notes": "enjoy" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "approved");
    assert_eq!(json["approved_by"], manager.id);
    assert_eq!(json["approver_notes"], "enjoy");

    // Approving again must fail the pending guard.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/approve"),
        &manager_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE");

    // Rejecting an approved reservation fails the same way.
    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/reservations/{id}/reject"),
        &manager_token,
        serde_json::json!({ "reason": "too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Approval re-checks the window: if a conflicting reservation was approved
/// in the meantime, approval fails with 409.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_approve_recheck_conflict(pool: PgPool) {
    let user = seed_user(&pool, "early@test.com", true, &[ROLE_USER]).await;
    let manager = seed_user(&pool, "racer@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-021").await;
    let manager_token = token_for(manager.id, &["manager"]);

    // Pending request first.
    let (_, pending) = create_reservation(
        &pool,
        &token_for(user.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    let pending_id = pending["id"].as_i64().unwrap();

    // Manager then books (and auto-approves) an overlapping window.
    let (status, _) = create_reservation(
        &pool,
        &manager_token,
        car.id,
        "2026-09-12T00:00:00Z",
        "2026-09-18T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The stale pending request can no longer be approved.
    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/reservations/{pending_id}/approve"),
        &manager_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Rejection stores the reason and a plain user cannot decide at all.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_reject_stores_reason(pool: PgPool) {
    let user = seed_user(&pool, "hopeful@test.com", true, &[ROLE_USER]).await;
    let manager = seed_user(&pool, "strict@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-022").await;

    let (_, created) = create_reservation(
        &pool,
        &token_for(user.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    // A plain user cannot approve or reject.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/reject"),
        &token_for(user.id, &["user"]),
        serde_json::json!({ "reason": "self-reject" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/reservations/{id}/reject"),
        &token_for(manager.id, &["manager"]),
        serde_json::json!({ "reason": "car in service" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["approver_notes"], "car in service");
    assert!(json["approved_by"].is_null());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Owners cancel their own pending reservation; they cannot cancel once it
/// is approved, but an admin can.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_authorization(pool: PgPool) {
    let user = seed_user(&pool, "owner@test.com", true, &[ROLE_USER]).await;
    let admin = seed_user(&pool, "boss@test.com", true, &[ROLE_ADMIN]).await;
    let car = seed_car(&pool, "KR-030").await;
    let user_token = token_for(user.id, &["user"]);
    let admin_token = token_for(admin.id, &["admin"]);

    // Own pending reservation: cancellable.
    let (_, created) =
        create_reservation(&pool, &user_token, car.id, WINDOW_A_START, WINDOW_A_END).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/cancel"),
        &user_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "cancelled");

    // New reservation, approved by the admin.
    let (_, created) = create_reservation(
        &pool,
        &user_token,
        car.id,
        "2026-10-01T00:00:00Z",
        "2026-10-05T00:00:00Z",
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/approve"),
        &admin_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Owner may not cancel an approved reservation.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/cancel"),
        &user_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The admin may.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/cancel"),
        &admin_token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Another user may not touch someone else's reservation at all.
    let stranger = seed_user(&pool, "stranger@test.com", true, &[ROLE_USER]).await;
    let (_, created) = create_reservation(
        &pool,
        &user_token,
        car.id,
        "2026-11-01T00:00:00Z",
        "2026-11-02T00:00:00Z",
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/reservations/{id}/cancel"),
        &token_for(stranger.id, &["user"]),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// A cancelled window frees the car for new approved bookings.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_frees_window(pool: PgPool) {
    let manager = seed_user(&pool, "freeing@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-031").await;
    let token = token_for(manager.id, &["manager"]);

    let (_, created) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}/cancel"),
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) =
        create_reservation(&pool, &token, car.id, WINDOW_A_START, WINDOW_A_END).await;
    assert_eq!(status, StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Deletion and listings
// ---------------------------------------------------------------------------

/// Hard delete is admin only.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_requires_admin(pool: PgPool) {
    let user = seed_user(&pool, "deleter@test.com", true, &[ROLE_USER]).await;
    let admin = seed_user(&pool, "janitor@test.com", true, &[ROLE_ADMIN]).await;
    let car = seed_car(&pool, "KR-040").await;

    let (_, created) = create_reservation(
        &pool,
        &token_for(user.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}"),
        &token_for(user.id, &["user"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/{id}"),
        &token_for(admin.id, &["admin"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/reservations/{id}"),
        &token_for(admin.id, &["admin"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Users list their own reservations; listing someone else's requires
/// privilege, and the global listing is privileged only.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_listing_authorization(pool: PgPool) {
    let user = seed_user(&pool, "lister@test.com", true, &[ROLE_USER]).await;
    let other = seed_user(&pool, "nosy@test.com", true, &[ROLE_USER]).await;
    let manager = seed_user(&pool, "overseer@test.com", true, &[ROLE_MANAGER]).await;
    let car = seed_car(&pool, "KR-041").await;

    create_reservation(
        &pool,
        &token_for(user.id, &["user"]),
        car.id,
        WINDOW_A_START,
        WINDOW_A_END,
    )
    .await;

    // Own listing works.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/user/{}", user.id),
        &token_for(user.id, &["user"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // Someone else's listing is forbidden for a plain user.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/reservations/user/{}", user.id),
        &token_for(other.id, &["user"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A manager sees the pending queue.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/reservations/pending",
        &token_for(manager.id, &["manager"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // The global listing is forbidden for a plain user.
    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/reservations",
        &token_for(user.id, &["user"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// `/cars/available` hides cars with an approved reservation intersecting
/// the requested window and shows them for disjoint windows.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_available_cars_excludes_booked(pool: PgPool) {
    let manager = seed_user(&pool, "fleet@test.com", true, &[ROLE_MANAGER]).await;
    let booked = seed_car(&pool, "KR-050").await;
    let free = seed_car(&pool, "KR-051").await;
    let token = token_for(manager.id, &["manager"]);

    let (status, _) =
        create_reservation(&pool, &token, booked.id, WINDOW_A_START, WINDOW_A_END).await;
    assert_eq!(status, StatusCode::CREATED);

    // Window intersecting the booking: only the free car remains.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/cars/available?starts_at=2026-09-12T00:00:00Z&ends_at=2026-09-13T00:00:00Z",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&booked.id));
    assert!(ids.contains(&free.id));

    // Disjoint window: both cars are available again.
    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/cars/available?starts_at=2026-09-15T00:00:00Z&ends_at=2026-09-16T00:00:00Z",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}
