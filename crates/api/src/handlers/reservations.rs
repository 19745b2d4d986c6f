//! Handlers for the `/reservations` resource.
//!
//! Each mutation runs its read-check-write sequence (existence check,
//! conflict/state check, mutation) inside a single database transaction.
//! The overlap pre-check reports a conflict before touching the table;
//! the authoritative guard is the `ex_reservations_no_overlap` exclusion
//! constraint, which stops two concurrent requests that both pass the
//! pre-check and surfaces as 409 via the error classifier. The rule
//! decisions themselves live in `motorpool_core::reservation`; this
//! module only orchestrates.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use motorpool_core::error::CoreError;
use motorpool_core::reservation::{
    cancel_allowed, effective_status, ensure_can_reserve, ensure_pending, initial_status,
    validate_interval, ReservationStatus,
};
use motorpool_core::types::{DbId, Timestamp};
use motorpool_db::models::reservation::{CreateReservation, Reservation};
use motorpool_db::repositories::{CarRepo, ReservationRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequirePrivileged};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /reservations`.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub car_id: DbId,
    /// Reserve on behalf of another user (privileged callers only).
    pub user_id: Option<DbId>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub notes: Option<String>,
}

/// Request body for `PUT /reservations/{id}/approve`.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub notes: Option<String>,
}

/// Request body for `PUT /reservations/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/reservations
///
/// Create a reservation. Privileged callers (admin/manager) get an
/// immediately approved reservation; everyone else starts pending.
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<CreateReservationRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    validate_interval(input.starts_at, input.ends_at)?;

    // Only privileged callers may reserve on behalf of another user.
    let target_user_id = match input.user_id {
        Some(id) if id != caller.user_id => {
            if !caller.is_privileged() {
                return Err(AppError::Core(CoreError::Forbidden(
                    "only a privileged caller may reserve for another user".into(),
                )));
            }
            id
        }
        _ => caller.user_id,
    };

    let mut tx = state.pool.begin().await?;

    let user = UserRepo::find_by_id(&mut *tx, target_user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: target_user_id,
        }))?;
    ensure_can_reserve(user.can_reserve)?;

    let car = CarRepo::find_by_id(&mut *tx, input.car_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Car",
            id: input.car_id,
        }))?;

    // Conflict pre-check against approved reservations only. A concurrent
    // request that slips past this still hits the exclusion constraint.
    let conflicts = ReservationRepo::find_overlapping(
        &mut *tx,
        car.id,
        input.starts_at,
        input.ends_at,
        ReservationStatus::Approved,
    )
    .await?;
    if !conflicts.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(
            "car already has an approved reservation in this window".into(),
        )));
    }

    let privileged = caller.is_privileged();
    let status = initial_status(privileged);
    let now = Utc::now();

    let create_dto = CreateReservation {
        car_id: car.id,
        user_id: target_user_id,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        status,
        requester_notes: input.notes.unwrap_or_default(),
        approved_by: privileged.then_some(caller.user_id),
        approved_at: privileged.then_some(now),
    };
    let reservation = ReservationRepo::create(&mut *tx, &create_dto).await?;

    tx.commit().await?;

    tracing::info!(
        reservation_id = reservation.id,
        car_id = reservation.car_id,
        user_id = reservation.user_id,
        status = %reservation.status,
        "reservation created"
    );

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// GET /api/v1/reservations
///
/// All reservations, newest first. Privileged callers only.
pub async fn list(
    State(state): State<AppState>,
    RequirePrivileged(_caller): RequirePrivileged,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = ReservationRepo::list(&state.pool).await?;
    Ok(Json(with_effective_status(reservations)))
}

/// GET /api/v1/reservations/pending
///
/// Pending reservations, oldest first (approval queue).
pub async fn list_pending(
    State(state): State<AppState>,
    RequirePrivileged(_caller): RequirePrivileged,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = ReservationRepo::list_pending(&state.pool).await?;
    Ok(Json(reservations))
}

/// GET /api/v1/reservations/user/{id}
///
/// A user's reservations. Callers may list their own; privileged callers
/// may list anyone's.
pub async fn list_for_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<Vec<Reservation>>> {
    if user_id != caller.user_id && !caller.is_privileged() {
        return Err(AppError::Core(CoreError::Forbidden(
            "cannot list another user's reservations".into(),
        )));
    }
    let reservations = ReservationRepo::list_for_user(&state.pool, user_id).await?;
    Ok(Json(with_effective_status(reservations)))
}

/// GET /api/v1/reservations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Reservation>> {
    let mut reservation = ReservationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))?;

    if reservation.user_id != caller.user_id && !caller.is_privileged() {
        return Err(AppError::Core(CoreError::Forbidden(
            "cannot view another user's reservation".into(),
        )));
    }

    reservation.status = effective_status(reservation.status, reservation.ends_at, Utc::now());
    Ok(Json(reservation))
}

/// PUT /api/v1/reservations/{id}/approve
///
/// Approve a pending reservation. Privileged callers only.
pub async fn approve(
    State(state): State<AppState>,
    RequirePrivileged(caller): RequirePrivileged,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveRequest>,
) -> AppResult<Json<Reservation>> {
    let mut tx = state.pool.begin().await?;

    let reservation = ReservationRepo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))?;
    ensure_pending(reservation.status)?;

    // The reservation may have been created before a conflicting one was
    // approved; re-check the window before committing to approval.
    let conflicts = ReservationRepo::find_overlapping(
        &mut *tx,
        reservation.car_id,
        reservation.starts_at,
        reservation.ends_at,
        ReservationStatus::Approved,
    )
    .await?;
    if conflicts.iter().any(|r| r.id != id) {
        return Err(AppError::Core(CoreError::Conflict(
            "car already has an approved reservation in this window".into(),
        )));
    }

    let updated = ReservationRepo::set_decision(
        &mut *tx,
        id,
        ReservationStatus::Approved,
        Some(caller.user_id),
        Some(Utc::now()),
        input.notes.as_deref().unwrap_or(""),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Reservation",
        id,
    }))?;

    tx.commit().await?;

    tracing::info!(reservation_id = id, approver_id = caller.user_id, "reservation approved");
    Ok(Json(updated))
}

/// PUT /api/v1/reservations/{id}/reject
///
/// Reject a pending reservation, storing the reason in the approver notes.
pub async fn reject(
    State(state): State<AppState>,
    RequirePrivileged(caller): RequirePrivileged,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<Json<Reservation>> {
    let mut tx = state.pool.begin().await?;

    let reservation = ReservationRepo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))?;
    ensure_pending(reservation.status)?;

    let updated = ReservationRepo::set_decision(
        &mut *tx,
        id,
        ReservationStatus::Rejected,
        None,
        None,
        input.reason.as_deref().unwrap_or(""),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Reservation",
        id,
    }))?;

    tx.commit().await?;

    tracing::info!(reservation_id = id, rejecter_id = caller.user_id, "reservation rejected");
    Ok(Json(updated))
}

/// PUT /api/v1/reservations/{id}/cancel
///
/// Cancel a reservation. Owners may cancel their own pending reservation;
/// privileged callers may cancel any.
pub async fn cancel(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Reservation>> {
    let mut tx = state.pool.begin().await?;

    let reservation = ReservationRepo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))?;

    let is_owner = reservation.user_id == caller.user_id;
    cancel_allowed(reservation.status, is_owner, caller.is_privileged())?;

    let updated = ReservationRepo::set_status(&mut *tx, id, ReservationStatus::Cancelled)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))?;

    tx.commit().await?;

    tracing::info!(reservation_id = id, caller_id = caller.user_id, "reservation cancelled");
    Ok(Json(updated))
}

/// DELETE /api/v1/reservations/{id}
///
/// Permanently remove a reservation. Admin only.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ReservationRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Reservation",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Apply the lazy approved-past-end => completed mapping to a listing.
fn with_effective_status(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    let now = Utc::now();
    for r in &mut reservations {
        r.status = effective_status(r.status, r.ends_at, now);
    }
    reservations
}
