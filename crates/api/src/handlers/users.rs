//! Handlers for the `/users` resource (admin user management and role
//! assignments).
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use motorpool_core::error::CoreError;
use motorpool_core::roles::ROLE_USER;
use motorpool_core::types::DbId;
use motorpool_db::models::role::Role;
use motorpool_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use motorpool_db::repositories::{RoleRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{
    generate_temporary_password, hash_password, validate_password_strength,
};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Minimum password length enforced on password reset.
const MIN_PASSWORD_LENGTH: usize = 12;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
///
/// No password field: the system generates a temporary credential and
/// returns it once in the response.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "first_name must not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name must not be empty"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub can_reserve: bool,
    /// Role ids to assign; defaults to the plain `user` role if omitted.
    pub role_ids: Option<Vec<DbId>>,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub can_reserve: Option<bool>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Request body for `PUT /users/{id}/roles`.
#[derive(Debug, Deserialize)]
pub struct ReplaceRolesRequest {
    pub role_ids: Vec<DbId>,
}

/// Response for `POST /users`: the created user plus the one-time
/// temporary password.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub temporary_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/users
///
/// Create a new user with a generated temporary password. Returns the safe
/// user representation plus the plaintext temporary password (once) with
/// 201 Created.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let temporary_password = generate_temporary_password();
    let hashed = hash_password(&temporary_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        phone: input.phone,
        can_reserve: input.can_reserve,
        password_hash: hashed,
    };
    let user = UserRepo::create(&state.pool, &create_dto).await?;

    // Assign requested roles, or the plain user role by default.
    let role_ids = match input.role_ids {
        Some(ids) => ids,
        None => {
            let role = RoleRepo::find_by_name(&state.pool, ROLE_USER)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError("default user role is not seeded".to_string())
                })?;
            vec![role.id]
        }
    };
    UserRepo::replace_roles(&state.pool, user.id, &role_ids).await?;

    let response = user_to_response(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: response,
            temporary_password,
        }),
    ))
}

/// GET /api/v1/users
///
/// List all users with resolved role names.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool, "id", false).await?;

    // Pre-fetch all role assignments to avoid N+1 queries.
    let assignments = UserRepo::all_role_assignments(&state.pool).await?;

    let responses: Vec<UserResponse> = users
        .iter()
        .map(|u| {
            let roles = assignments
                .iter()
                .filter(|(user_id, _)| *user_id == u.id)
                .map(|(_, name)| name.clone())
                .collect();
            build_user_response(u, roles)
        })
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    let response = user_to_response(&state, &user).await?;
    Ok(Json(response))
}

/// PUT /api/v1/users/{id}
///
/// Update a user's profile fields (not password, not roles).
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let update_dto = UpdateUser {
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        phone: input.phone,
        can_reserve: input.can_reserve,
        is_active: input.is_active,
    };

    let user = UserRepo::update(&state.pool, id, &update_dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    let response = user_to_response(&state, &user).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/users/{id}
///
/// Soft-deactivate a user (sets `is_active = false`). Returns 204 No Content.
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deactivated = UserRepo::deactivate(&state.pool, id).await?;
    if deactivated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "User", id }))
    }
}

/// POST /api/v1/users/{id}/reset-password
///
/// Admin-initiated password reset for a user.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let updated = UserRepo::update_password(&state.pool, id, &hashed).await?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "User", id }))
    }
}

// ---------------------------------------------------------------------------
// Role assignment handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{id}/roles
pub async fn list_roles(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<Role>>> {
    ensure_user_exists(&state, id).await?;

    let names = UserRepo::role_names(&state.pool, id).await?;
    let all_roles = RoleRepo::list(&state.pool).await?;
    let roles = all_roles
        .into_iter()
        .filter(|r| names.contains(&r.name))
        .collect();
    Ok(Json(roles))
}

/// PUT /api/v1/users/{id}/roles
///
/// Replace the user's role set. Unknown role ids fail the whole request.
pub async fn replace_roles(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceRolesRequest>,
) -> AppResult<StatusCode> {
    ensure_user_exists(&state, id).await?;

    for role_id in &input.role_ids {
        ensure_role_exists(&state, *role_id).await?;
    }

    UserRepo::replace_roles(&state.pool, id, &input.role_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/{id}/roles/{role_id}
pub async fn assign_role(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_user_exists(&state, id).await?;
    ensure_role_exists(&state, role_id).await?;

    UserRepo::assign_role(&state.pool, id, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/{id}/roles/{role_id}
pub async fn remove_role(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_user_exists(&state, id).await?;

    let removed = UserRepo::remove_role(&state.pool, id, role_id).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Role assignment",
            id: role_id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_user_exists(state: &AppState, id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(())
}

async fn ensure_role_exists(state: &AppState, id: DbId) -> AppResult<()> {
    RoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Role", id }))?;
    Ok(())
}

/// Convert a [`User`] row into a safe [`UserResponse`] by resolving role names.
async fn user_to_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let roles = UserRepo::role_names(&state.pool, user.id).await?;
    Ok(build_user_response(user, roles))
}

/// Build a [`UserResponse`] from a [`User`] and pre-resolved role names.
fn build_user_response(user: &User, roles: Vec<String>) -> UserResponse {
    UserResponse {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        can_reserve: user.can_reserve,
        is_active: user.is_active,
        roles,
        last_login_at: user.last_login_at,
        created_at: user.created_at,
    }
}
