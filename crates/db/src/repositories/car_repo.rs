//! Repository for the `cars` table.

use motorpool_core::reservation::ReservationStatus;
use motorpool_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::car::{Car, CreateCar, UpdateCar};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, make, model, plate, year, is_available, created_at, updated_at";

/// Sortable columns accepted by [`CarRepo::list`].
const SORTABLE: &[&str] = &["id", "make", "model", "plate", "year", "created_at"];

/// Provides CRUD operations for cars.
pub struct CarRepo;

impl CarRepo {
    /// Insert a new car, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCar) -> Result<Car, sqlx::Error> {
        let query = format!(
            "INSERT INTO cars (make, model, plate, year, is_available)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(&input.make)
            .bind(&input.model)
            .bind(&input.plate)
            .bind(input.year)
            .bind(input.is_available.unwrap_or(true))
            .fetch_one(pool)
            .await
    }

    /// Find a car by internal ID. Works inside or outside a transaction.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Car>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cars WHERE id = $1");
        sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all cars, sorted by a whitelisted column.
    ///
    /// Unknown sort columns fall back to `id`; `descending` flips the order.
    pub async fn list(
        pool: &PgPool,
        sort_by: &str,
        descending: bool,
    ) -> Result<Vec<Car>, sqlx::Error> {
        let column = if SORTABLE.contains(&sort_by) {
            sort_by
        } else {
            "id"
        };
        let direction = if descending { "DESC" } else { "ASC" };
        let query = format!("SELECT {COLUMNS} FROM cars ORDER BY {column} {direction}");
        sqlx::query_as::<_, Car>(&query).fetch_all(pool).await
    }

    /// List cars with no approved reservation intersecting `[starts_at, ends_at)`.
    ///
    /// Only approved reservations block availability; pending, rejected,
    /// and cancelled ones do not, and the `is_available` flag is not
    /// consulted. The comparison is half-open, so a reservation ending
    /// exactly at `starts_at` does not exclude the car.
    pub async fn list_available(
        executor: impl PgExecutor<'_>,
        starts_at: Timestamp,
        ends_at: Timestamp,
    ) -> Result<Vec<Car>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cars c
             WHERE NOT EXISTS (
                   SELECT 1 FROM reservations r
                   WHERE r.car_id = c.id
                     AND r.status = $3
                     AND r.starts_at < $2
                     AND r.ends_at > $1
               )
             ORDER BY c.id ASC"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(starts_at)
            .bind(ends_at)
            .bind(ReservationStatus::Approved.as_str())
            .fetch_all(executor)
            .await
    }

    /// Update a car. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCar,
    ) -> Result<Option<Car>, sqlx::Error> {
        let query = format!(
            "UPDATE cars SET
                make = COALESCE($2, make),
                model = COALESCE($3, model),
                plate = COALESCE($4, plate),
                year = COALESCE($5, year),
                is_available = COALESCE($6, is_available),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .bind(&input.make)
            .bind(&input.model)
            .bind(&input.plate)
            .bind(input.year)
            .bind(input.is_available)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a car. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
