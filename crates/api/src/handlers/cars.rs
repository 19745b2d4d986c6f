//! Handlers for the `/cars` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use motorpool_core::error::CoreError;
use motorpool_core::reservation::validate_interval;
use motorpool_core::types::{DbId, Timestamp};
use motorpool_db::models::car::{Car, CreateCar, UpdateCar};
use motorpool_db::repositories::CarRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Request body for `POST /cars`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, message = "make must not be empty"))]
    pub make: String,
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,
    #[validate(length(min = 1, message = "plate must not be empty"))]
    pub plate: String,
    #[validate(range(min = 1950, max = 2100, message = "year out of range"))]
    pub year: i32,
    pub is_available: Option<bool>,
}

/// Sorting parameters for `GET /cars` (`?sort=&order=`).
#[derive(Debug, Deserialize)]
pub struct SortParams {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl SortParams {
    /// Sort column, defaulting to `id`.
    pub fn column(&self) -> &str {
        self.sort.as_deref().unwrap_or("id")
    }

    /// Whether the order is descending (`?order=desc`).
    pub fn descending(&self) -> bool {
        self.order.as_deref() == Some("desc")
    }
}

/// Query parameters for `GET /cars/available`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/cars
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateCarRequest>,
) -> AppResult<(StatusCode, Json<Car>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let create_dto = CreateCar {
        make: input.make,
        model: input.model,
        plate: input.plate,
        year: input.year,
        is_available: input.is_available,
    };
    let car = CarRepo::create(&state.pool, &create_dto).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

/// GET /api/v1/cars
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SortParams>,
) -> AppResult<Json<Vec<Car>>> {
    let cars = CarRepo::list(&state.pool, params.column(), params.descending()).await?;
    Ok(Json(cars))
}

/// GET /api/v1/cars/available?starts_at=&ends_at=
///
/// Cars with no approved reservation intersecting the half-open window.
pub async fn list_available(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<Json<Vec<Car>>> {
    validate_interval(params.starts_at, params.ends_at)?;
    let cars = CarRepo::list_available(&state.pool, params.starts_at, params.ends_at).await?;
    Ok(Json(cars))
}

/// GET /api/v1/cars/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Car>> {
    let car = CarRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Car", id }))?;
    Ok(Json(car))
}

/// PUT /api/v1/cars/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCar>,
) -> AppResult<Json<Car>> {
    let car = CarRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Car", id }))?;
    Ok(Json(car))
}

/// DELETE /api/v1/cars/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = CarRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Car", id }))
    }
}
