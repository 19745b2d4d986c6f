//! Car entity model and DTOs.

use motorpool_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A car row from the `cars` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Car {
    pub id: DbId,
    pub make: String,
    pub model: String,
    pub plate: String,
    pub year: i32,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new car.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCar {
    pub make: String,
    pub model: String,
    pub plate: String,
    pub year: i32,
    /// Defaults to `true` if omitted.
    pub is_available: Option<bool>,
}

/// DTO for updating an existing car. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCar {
    pub make: Option<String>,
    pub model: Option<String>,
    pub plate: Option<String>,
    pub year: Option<i32>,
    pub is_available: Option<bool>,
}
