//! Role catalogue routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::roles;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/roles", get(roles::list))
}
