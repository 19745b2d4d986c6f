//! Route registration.
//!
//! Each submodule owns one resource and exposes a `router()` returning a
//! `Router<AppState>`; [`api_routes`] merges them under a common prefix.

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cars;
pub mod health;
pub mod reservations;
pub mod roles;
pub mod users;

/// All versioned API routes, nested under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(cars::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(reservations::router())
}
