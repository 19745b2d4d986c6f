//! Pure domain logic for the motorpool fleet reservation service.
//!
//! This crate has no database or HTTP dependencies so the reservation
//! workflow rules can be tested in isolation.

pub mod error;
pub mod reservation;
pub mod roles;
pub mod types;
