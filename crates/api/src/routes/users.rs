//! User management routes (admin only, enforced in handlers).

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create).get(users::list))
        .route(
            "/users/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::deactivate),
        )
        .route("/users/{id}/reset-password", post(users::reset_password))
        .route(
            "/users/{id}/roles",
            get(users::list_roles).put(users::replace_roles),
        )
        .route(
            "/users/{id}/roles/{role_id}",
            post(users::assign_role).delete(users::remove_role),
        )
}
