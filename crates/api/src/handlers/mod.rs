//! HTTP handlers, one module per resource.

pub mod auth;
pub mod cars;
pub mod reservations;
pub mod roles;
pub mod users;
