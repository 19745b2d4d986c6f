//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Plain lookups accept `&PgPool`; methods that participate in a
//! read-check-write sequence accept any `PgExecutor` so callers can run
//! them inside a transaction.

pub mod car_repo;
pub mod reservation_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use car_repo::CarRepo;
pub use reservation_repo::ReservationRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
