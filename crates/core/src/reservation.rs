//! Reservation workflow rules: status lifecycle, interval validation, and
//! transition guards.
//!
//! Every rule the reservation endpoints enforce lives here as a pure
//! function over plain values. The API layer decides *when* to call these
//! (inside a transaction, see the reservations handler); this module
//! decides *whether* an operation is allowed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Lifecycle status of a reservation.
///
/// `Pending` is the only non-terminal state. The string form (used in the
/// database and in API payloads) is the lowercase variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// The lowercase database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "approved" => Ok(ReservationStatus::Approved),
            "rejected" => Ok(ReservationStatus::Rejected),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}

/// Validate that a reservation interval is well-formed (start strictly
/// before end).
pub fn validate_interval(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), CoreError> {
    if starts_at >= ends_at {
        return Err(CoreError::Validation(
            "starts_at must be strictly before ends_at".to_string(),
        ));
    }
    Ok(())
}

/// Half-open interval overlap test: `[a_start, a_end)` intersects
/// `[b_start, b_end)` iff `a_start < b_end && b_start < a_end`.
///
/// Touching endpoints do not overlap, so back-to-back bookings that share
/// a boundary instant are allowed.
pub fn intervals_overlap(
    a_start: Timestamp,
    a_end: Timestamp,
    b_start: Timestamp,
    b_end: Timestamp,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Initial status for a newly created reservation.
///
/// Privileged creators (admin or manager) get an immediately approved
/// reservation; everyone else starts in `Pending` awaiting approval.
pub fn initial_status(privileged_creator: bool) -> ReservationStatus {
    if privileged_creator {
        ReservationStatus::Approved
    } else {
        ReservationStatus::Pending
    }
}

/// Guard for approve/reject: only a `Pending` reservation may be decided.
///
/// Terminal states never revert, so a second approve or reject on the
/// same reservation fails with `InvalidState`.
pub fn ensure_pending(status: ReservationStatus) -> Result<(), CoreError> {
    if status != ReservationStatus::Pending {
        return Err(CoreError::InvalidState(format!(
            "reservation must be pending, current status is {status}"
        )));
    }
    Ok(())
}

/// Guard for cancellation.
///
/// The owning user may cancel their own reservation while it is still
/// `Pending`. A privileged caller may cancel a reservation in any status.
pub fn cancel_allowed(
    status: ReservationStatus,
    is_owner: bool,
    is_privileged: bool,
) -> Result<(), CoreError> {
    if is_privileged {
        return Ok(());
    }
    if is_owner && status == ReservationStatus::Pending {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "only the owner of a pending reservation or a privileged caller may cancel".to_string(),
    ))
}

/// Guard for creation: the requesting user must carry the reserve flag.
pub fn ensure_can_reserve(can_reserve: bool) -> Result<(), CoreError> {
    if !can_reserve {
        return Err(CoreError::Forbidden(
            "user is not authorized to hold reservations".to_string(),
        ));
    }
    Ok(())
}

/// Lazy time-based transition: an `Approved` reservation whose end has
/// passed reads as `Completed`.
///
/// Presentation-only; the stored status is never rewritten.
pub fn effective_status(
    status: ReservationStatus,
    ends_at: Timestamp,
    now: Timestamp,
) -> ReservationStatus {
    if status == ReservationStatus::Approved && ends_at <= now {
        ReservationStatus::Completed
    } else {
        status
    }
}
