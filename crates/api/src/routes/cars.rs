//! Car fleet routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cars;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cars", post(cars::create).get(cars::list))
        .route("/cars/available", get(cars::list_available))
        .route(
            "/cars/{id}",
            get(cars::get_by_id).put(cars::update).delete(cars::delete),
        )
}
