//! Authentication building blocks: JWT tokens and password hashing.

pub mod jwt;
pub mod password;
