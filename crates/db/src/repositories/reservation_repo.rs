//! Repository for the `reservations` table.
//!
//! Every mutation here is part of a read-check-write sequence owned by the
//! reservations handler, so all methods accept a generic `PgExecutor` and
//! the handler passes in its open transaction. The overlap pre-check is
//! advisory; the `ex_reservations_no_overlap` exclusion constraint rejects
//! any write that would leave two approved reservations overlapping on the
//! same car, whatever the interleaving.

use motorpool_core::reservation::ReservationStatus;
use motorpool_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::reservation::{CreateReservation, Reservation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, car_id, user_id, starts_at, ends_at, status, requester_notes, \
                        approver_notes, approved_by, approved_at, created_at, updated_at";

/// Provides CRUD operations for reservations.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Insert a new reservation, returning the created row.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations
                (car_id, user_id, starts_at, ends_at, status, requester_notes, approved_by, approved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(input.car_id)
            .bind(input.user_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.status.as_str())
            .bind(&input.requester_notes)
            .bind(input.approved_by)
            .bind(input.approved_at)
            .fetch_one(executor)
            .await
    }

    /// Find a reservation by internal ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a reservation by ID with a row lock (`FOR UPDATE`).
    ///
    /// Used by the transition endpoints so two concurrent decisions on the
    /// same reservation serialize instead of both reading `pending`.
    pub async fn find_by_id_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all reservations, most recently created first.
    pub async fn list(executor: impl PgExecutor<'_>) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations ORDER BY created_at DESC");
        sqlx::query_as::<_, Reservation>(&query)
            .fetch_all(executor)
            .await
    }

    /// List reservations belonging to a user, most recently created first.
    pub async fn list_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// List pending reservations, oldest first (approval queue order).
    pub async fn list_pending(executor: impl PgExecutor<'_>) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE status = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(ReservationStatus::Pending.as_str())
            .fetch_all(executor)
            .await
    }

    /// Find reservations of the given status for a car that intersect
    /// `[starts_at, ends_at)` (half-open).
    pub async fn find_overlapping(
        executor: impl PgExecutor<'_>,
        car_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations
             WHERE car_id = $1
               AND status = $4
               AND starts_at < $3
               AND ends_at > $2"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(car_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(status.as_str())
            .fetch_all(executor)
            .await
    }

    /// Set a reservation's status, stamping approver fields.
    ///
    /// Used for approve (approver + timestamp + notes) and reject
    /// (notes hold the reason; approver fields stay NULL).
    pub async fn set_decision(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: ReservationStatus,
        approved_by: Option<DbId>,
        approved_at: Option<Timestamp>,
        approver_notes: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET
                status = $2,
                approved_by = $3,
                approved_at = $4,
                approver_notes = $5,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(approved_by)
            .bind(approved_at)
            .bind(approver_notes)
            .fetch_optional(executor)
            .await
    }

    /// Set a reservation's status only (used for cancel).
    pub async fn set_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(executor)
            .await
    }

    /// Permanently delete a reservation. Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
