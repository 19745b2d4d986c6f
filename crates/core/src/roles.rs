//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_table.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_USER: &str = "user";

/// Whether a set of role names grants privileged access.
///
/// Privileged callers (admin or manager) may approve, reject, and cancel
/// any reservation, and may create reservations that are approved
/// immediately.
pub fn is_privileged(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ROLE_ADMIN || r == ROLE_MANAGER)
}
