//! Reservation entity model and DTOs.

use motorpool_core::reservation::ReservationStatus;
use motorpool_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A reservation row from the `reservations` table.
///
/// The status column is TEXT in the database but decodes into the closed
/// [`ReservationStatus`] variant set, so an invalid stored value fails at
/// the row boundary instead of leaking into the domain.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub car_id: DbId,
    pub user_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    #[sqlx(try_from = "String")]
    pub status: ReservationStatus,
    pub requester_notes: String,
    pub approver_notes: String,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new reservation.
///
/// Built by the reservations handler after all workflow guards have
/// passed; never deserialized straight from a request body.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub car_id: DbId,
    pub user_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub status: ReservationStatus,
    pub requester_notes: String,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
}
