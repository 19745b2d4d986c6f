//! Handlers for the `/roles` resource.
//!
//! Roles are fixed seed data, so this is read-only.

use axum::extract::State;
use axum::Json;
use motorpool_db::models::role::Role;
use motorpool_db::repositories::RoleRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// GET /api/v1/roles
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<Role>>> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(roles))
}
