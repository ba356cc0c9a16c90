//! Domain state for the listing/request lifecycle.
//!
//! This module defines the two entities the lifecycle manager owns
//! (`FoodListing`, `FoodRequest`), their status enums, and the explicit
//! state machine that couples request transitions to listing mutations.
//! All types are `Clone` + `serde` to support the injected-store pattern.

use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a food listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub uuid::Uuid);

impl ListingId {
    /// Generate a new random `ListingId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a food request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    /// Generate a new random `RequestId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub uuid::Uuid);

impl RestaurantId {
    /// Generate a new random `RestaurantId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RestaurantId {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Status Enums
// ═══════════════════════════════════════════════════════════════════════

/// Status of a food listing.
///
/// Mutated only by the lifecycle operations; the browse path additionally
/// filters on `expires_at` but never writes status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    /// Listing has remaining quantity and accepts new requests.
    Available,
    /// Remaining quantity is fully claimed by pending/approved requests.
    Reserved,
    /// An approved request's pickup has been confirmed completed.
    Claimed,
    /// Listing is past its expiry date.
    Expired,
}

impl ListingStatus {
    /// Get the status as its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Claimed => "CLAIMED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Parse a status from its stored string form.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a known listing status.
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "CLAIMED" => Ok(Self::Claimed),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(LifecycleError::Database(format!(
                "unknown listing status: {other}"
            ))),
        }
    }

    /// Derive the listing status after a reservation drains it to
    /// `remaining` units.
    ///
    /// This is the only derived-state rule in the lifecycle: a listing whose
    /// quantity reaches zero becomes `Reserved`, otherwise it stays
    /// `Available`. Every other status change is an explicit transition.
    #[must_use]
    pub const fn after_draining(remaining: u32) -> Self {
        if remaining == 0 {
            Self::Reserved
        } else {
            Self::Available
        }
    }
}

/// Status of a food request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting a restaurant decision. Holds quantity against the listing.
    Pending,
    /// Accepted by the restaurant; awaiting pickup.
    Approved,
    /// Declined by the restaurant. Terminal.
    Rejected,
    /// Pickup confirmed. Terminal.
    Completed,
    /// Withdrawn by the requesting user. Terminal.
    Cancelled,
}

impl RequestStatus {
    /// Get the status as its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status from its stored string form.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a known request status.
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(LifecycleError::Database(format!(
                "unknown request status: {other}"
            ))),
        }
    }

    /// Returns `true` if no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════

/// A restaurant's offer of surplus food with a finite claimable quantity.
///
/// `quantity` and `status` are the shared mutable fields contended by
/// multiple callers; they are only ever written inside a lifecycle
/// operation's transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodListing {
    /// Listing identifier.
    pub id: ListingId,
    /// Owning restaurant. Immutable after creation.
    pub restaurant_id: RestaurantId,
    /// Display title (e.g., "Day-old sourdough").
    pub title: String,
    /// Unit the quantity is counted in (e.g., "loaves", "kg").
    pub unit: String,
    /// Remaining donatable amount. Invariant: never negative.
    pub quantity: u32,
    /// Current listing status.
    pub status: ListingStatus,
    /// Listings past this point are excluded from browse results.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A user's claim against a portion of a listing's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodRequest {
    /// Request identifier.
    pub id: RequestId,
    /// Requesting user.
    pub user_id: UserId,
    /// Target listing.
    pub listing_id: ListingId,
    /// Amount requested. Fixed at creation; this exact amount is restored
    /// to the listing on rejection or cancellation.
    pub quantity: u32,
    /// Current request status.
    pub status: RequestStatus,
    /// Optional message from the user to the restaurant.
    pub message: Option<String>,
    /// Pickup timestamp, set on approval.
    pub pickup_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl FoodRequest {
    /// Build a new `Pending` request against a listing.
    #[must_use]
    pub fn new(
        user_id: UserId,
        listing_id: ListingId,
        quantity: u32,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            user_id,
            listing_id,
            quantity,
            status: RequestStatus::Pending,
            message,
            pickup_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Transition State Machine
// ═══════════════════════════════════════════════════════════════════════

/// A restaurant's decision on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Accept the request and reserve the listing for pickup.
    Approve,
    /// Decline the request and restore its quantity to the listing.
    Reject,
    /// Confirm the approved pickup happened.
    Complete,
}

impl Decision {
    /// The request status this decision drives toward.
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
            Self::Complete => RequestStatus::Completed,
        }
    }
}

/// The listing-side effect of a request transition.
///
/// Applied in the same transaction as the request status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingMutation {
    /// Quantity returned to the listing's pool. Zero for approve/complete.
    pub restock: u32,
    /// Status the listing moves to.
    pub status: ListingStatus,
}

impl ListingMutation {
    /// Restore `quantity` units and make the listing available again.
    #[must_use]
    pub const fn restock(quantity: u32) -> Self {
        Self {
            restock: quantity,
            status: ListingStatus::Available,
        }
    }

    /// Change listing status without touching quantity.
    #[must_use]
    pub const fn status_only(status: ListingStatus) -> Self {
        Self { restock: 0, status }
    }
}

/// Plan a request transition and its matching listing mutation.
///
/// Implements the full transition table:
///
/// | current → decision     | request status | listing effect            |
/// |------------------------|----------------|---------------------------|
/// | `Pending` → `Reject`   | `Rejected`     | `+held_quantity`, `Available` |
/// | `Pending` → `Approve`  | `Approved`     | none, `Reserved`          |
/// | `Approved` → `Complete`| `Completed`    | none, `Claimed`           |
///
/// Any other pairing is rejected before any state is touched; in particular
/// terminal statuses never transition again and a status can never be
/// re-entered.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidTransition`] for any pairing not in the
/// table above.
pub const fn plan_transition(
    current: RequestStatus,
    decision: Decision,
    held_quantity: u32,
) -> Result<(RequestStatus, ListingMutation)> {
    match (current, decision) {
        (RequestStatus::Pending, Decision::Reject) => Ok((
            RequestStatus::Rejected,
            ListingMutation::restock(held_quantity),
        )),
        (RequestStatus::Pending, Decision::Approve) => Ok((
            RequestStatus::Approved,
            ListingMutation::status_only(ListingStatus::Reserved),
        )),
        (RequestStatus::Approved, Decision::Complete) => Ok((
            RequestStatus::Completed,
            ListingMutation::status_only(ListingStatus::Claimed),
        )),
        (current, decision) => Err(LifecycleError::InvalidTransition {
            from: current,
            to: decision.target(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_string_round_trips() {
        for status in [
            ListingStatus::Available,
            ListingStatus::Reserved,
            ListingStatus::Claimed,
            ListingStatus::Expired,
        ] {
            assert_eq!(ListingStatus::from_str(status.as_str()), Ok(status));
        }
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(RequestStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(ListingStatus::from_str("PENDING").is_err());
        assert!(RequestStatus::from_str("AVAILABLE").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_derived_status_after_draining() {
        assert_eq!(ListingStatus::after_draining(0), ListingStatus::Reserved);
        assert_eq!(ListingStatus::after_draining(1), ListingStatus::Available);
        assert_eq!(ListingStatus::after_draining(42), ListingStatus::Available);
    }

    #[test]
    fn test_reject_restores_exact_quantity() {
        let Ok((status, mutation)) =
            plan_transition(RequestStatus::Pending, Decision::Reject, 7)
        else {
            unreachable!("pending → reject is in the table");
        };
        assert_eq!(status, RequestStatus::Rejected);
        assert_eq!(mutation.restock, 7);
        assert_eq!(mutation.status, ListingStatus::Available);
    }

    #[test]
    fn test_approve_reserves_without_quantity_change() {
        let Ok((status, mutation)) =
            plan_transition(RequestStatus::Pending, Decision::Approve, 7)
        else {
            unreachable!("pending → approve is in the table");
        };
        assert_eq!(status, RequestStatus::Approved);
        assert_eq!(mutation.restock, 0);
        assert_eq!(mutation.status, ListingStatus::Reserved);
    }

    #[test]
    fn test_complete_claims_listing() {
        let Ok((status, mutation)) =
            plan_transition(RequestStatus::Approved, Decision::Complete, 7)
        else {
            unreachable!("approved → complete is in the table");
        };
        assert_eq!(status, RequestStatus::Completed);
        assert_eq!(mutation.restock, 0);
        assert_eq!(mutation.status, ListingStatus::Claimed);
    }

    #[test]
    fn test_transitions_outside_table_are_rejected() {
        // Terminal states never move again.
        for current in [
            RequestStatus::Rejected,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            for decision in [Decision::Approve, Decision::Reject, Decision::Complete] {
                assert!(plan_transition(current, decision, 1).is_err());
            }
        }
        // Approved can only complete.
        assert!(plan_transition(RequestStatus::Approved, Decision::Approve, 1).is_err());
        assert!(plan_transition(RequestStatus::Approved, Decision::Reject, 1).is_err());
        // Pending cannot skip straight to completed.
        assert!(plan_transition(RequestStatus::Pending, Decision::Complete, 1).is_err());
    }

    fn any_request_status() -> impl Strategy<Value = RequestStatus> {
        prop_oneof![
            Just(RequestStatus::Pending),
            Just(RequestStatus::Approved),
            Just(RequestStatus::Rejected),
            Just(RequestStatus::Completed),
            Just(RequestStatus::Cancelled),
        ]
    }

    fn any_decision() -> impl Strategy<Value = Decision> {
        prop_oneof![
            Just(Decision::Approve),
            Just(Decision::Reject),
            Just(Decision::Complete),
        ]
    }

    proptest! {
        /// Only a rejection ever restocks, and it restocks exactly the held
        /// quantity (the conservation law).
        #[test]
        fn prop_restock_conservation(
            current in any_request_status(),
            decision in any_decision(),
            held in 0_u32..10_000,
        ) {
            if let Ok((_, mutation)) = plan_transition(current, decision, held) {
                if decision == Decision::Reject {
                    prop_assert_eq!(mutation.restock, held);
                } else {
                    prop_assert_eq!(mutation.restock, 0);
                }
            }
        }

        /// A planned transition always lands on the decision's target and
        /// never starts from a terminal status.
        #[test]
        fn prop_transitions_respect_table(
            current in any_request_status(),
            decision in any_decision(),
            held in 0_u32..10_000,
        ) {
            match plan_transition(current, decision, held) {
                Ok((next, _)) => {
                    prop_assert_eq!(next, decision.target());
                    prop_assert!(!current.is_terminal());
                    prop_assert_ne!(current, next);
                }
                Err(err) => {
                    prop_assert!(
                        matches!(
                            err,
                            crate::error::LifecycleError::InvalidTransition { .. }
                        ),
                        "expected InvalidTransition, got {err:?}"
                    );
                }
            }
        }
    }
}
