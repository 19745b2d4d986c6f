//! Reservation workflow routes.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/reservations",
            post(reservations::create).get(reservations::list),
        )
        .route("/reservations/pending", get(reservations::list_pending))
        .route(
            "/reservations/user/{id}",
            get(reservations::list_for_user),
        )
        .route(
            "/reservations/{id}",
            get(reservations::get_by_id).delete(reservations::delete),
        )
        .route("/reservations/{id}/approve", put(reservations::approve))
        .route("/reservations/{id}/reject", put(reservations::reject))
        .route("/reservations/{id}/cancel", put(reservations::cancel))
}
