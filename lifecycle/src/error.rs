//! Error types for the listing/request lifecycle.

use crate::state::{ListingStatus, RequestStatus};
use thiserror::Error;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Error taxonomy for the lifecycle manager.
///
/// Every precondition failure maps to exactly one variant and aborts before
/// any mutation begins; the caller boundary translates these into
/// user-facing responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    // ═══════════════════════════════════════════════════════════
    // Not Found
    // ═══════════════════════════════════════════════════════════

    /// Referenced listing id does not exist.
    #[error("Food listing not found")]
    ListingNotFound,

    /// Referenced request id does not exist.
    #[error("Food request not found")]
    RequestNotFound,

    // ═══════════════════════════════════════════════════════════
    // Invalid State
    // ═══════════════════════════════════════════════════════════

    /// Listing is not accepting requests in its current status.
    #[error("Food listing is not available")]
    ListingUnavailable {
        /// Status the listing was found in.
        status: ListingStatus,
    },

    /// Request transition not listed in the lifecycle transition table.
    #[error("Cannot move request from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        /// Status the request currently holds.
        from: RequestStatus,
        /// Status the caller attempted to move to.
        to: RequestStatus,
    },

    /// Only pending requests can be cancelled.
    #[error("Only pending requests can be cancelled")]
    RequestNotPending {
        /// Status the request was found in.
        status: RequestStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Quantity
    // ═══════════════════════════════════════════════════════════

    /// Requested amount exceeds the listing's remaining quantity.
    #[error("Requested quantity is not available ({requested} requested, {available} left)")]
    InsufficientQuantity {
        /// Amount the user asked for.
        requested: u32,
        /// Amount the listing still holds.
        available: u32,
    },

    /// Requested amount must be at least one unit.
    #[error("Requested quantity must be positive")]
    InvalidQuantity,

    // ═══════════════════════════════════════════════════════════
    // Conflict / Authorization
    // ═══════════════════════════════════════════════════════════

    /// The user already holds a pending request against this listing.
    #[error("You already have a pending request for this food listing")]
    DuplicatePendingRequest,

    /// Caller does not own the resource they are attempting to mutate.
    #[error("You do not have permission to modify this resource")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Notification delivery failed. Never surfaced by an operation; the
    /// manager logs it and carries on.
    #[error("Failed to deliver notification")]
    NotificationFailed,

    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl LifecycleError {
    /// Returns `true` if this error is the caller's fault (a failed
    /// precondition) rather than a system failure.
    ///
    /// # Examples
    ///
    /// ```
    /// # use foodshare_lifecycle::LifecycleError;
    /// assert!(LifecycleError::DuplicatePendingRequest.is_client_error());
    /// assert!(!LifecycleError::Database("timeout".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::NotificationFailed | Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(LifecycleError::ListingNotFound.is_client_error());
        assert!(LifecycleError::Forbidden.is_client_error());
        assert!(
            LifecycleError::InsufficientQuantity {
                requested: 5,
                available: 2
            }
            .is_client_error()
        );
        assert!(!LifecycleError::Database("boom".into()).is_client_error());
        assert!(!LifecycleError::NotificationFailed.is_client_error());
    }

    #[test]
    fn test_messages_match_caller_boundary_wording() {
        assert_eq!(
            LifecycleError::ListingUnavailable {
                status: ListingStatus::Claimed
            }
            .to_string(),
            "Food listing is not available"
        );
        assert_eq!(
            LifecycleError::RequestNotPending {
                status: RequestStatus::Approved
            }
            .to_string(),
            "Only pending requests can be cancelled"
        );
        assert_eq!(
            LifecycleError::InvalidTransition {
                from: RequestStatus::Completed,
                to: RequestStatus::Approved,
            }
            .to_string(),
            "Cannot move request from COMPLETED to APPROVED"
        );
    }
}
