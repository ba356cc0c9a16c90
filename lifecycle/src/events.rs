//! Lifecycle domain events.
//!
//! An event is emitted after a lifecycle transaction commits and carries
//! everything the notification boundary needs to render a message, so the
//! manager itself stays free of template knowledge. Exactly one event is
//! emitted per successful operation.

use crate::state::{ListingId, RequestId, RestaurantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts produced by successful lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// A user placed a new request against a listing.
    ///
    /// Notifies the listing's restaurant.
    RequestCreated {
        /// The new request.
        request_id: RequestId,
        /// Target listing.
        listing_id: ListingId,
        /// Restaurant that owns the listing.
        restaurant_id: RestaurantId,
        /// Requesting user.
        user_id: UserId,
        /// Requesting user's display name.
        user_name: String,
        /// Listing title.
        food_title: String,
        /// Amount requested.
        quantity: u32,
        /// Unit the quantity is counted in.
        unit: String,
    },

    /// A restaurant approved a pending request.
    ///
    /// Notifies the requesting user.
    RequestApproved {
        /// The approved request.
        request_id: RequestId,
        /// Requesting user.
        user_id: UserId,
        /// Restaurant's display name.
        restaurant_name: String,
        /// Listing title.
        food_title: String,
        /// Agreed pickup time, if one was set.
        pickup_date: Option<DateTime<Utc>>,
    },

    /// A restaurant rejected a pending request.
    ///
    /// Notifies the requesting user.
    RequestRejected {
        /// The rejected request.
        request_id: RequestId,
        /// Requesting user.
        user_id: UserId,
        /// Restaurant's display name.
        restaurant_name: String,
        /// Listing title.
        food_title: String,
    },

    /// A restaurant confirmed an approved request's pickup.
    ///
    /// Notifies the requesting user.
    RequestCompleted {
        /// The completed request.
        request_id: RequestId,
        /// Requesting user.
        user_id: UserId,
        /// Restaurant's display name.
        restaurant_name: String,
        /// Listing title.
        food_title: String,
    },

    /// A user withdrew their pending request.
    ///
    /// Notifies the listing's restaurant.
    RequestCancelled {
        /// The cancelled request.
        request_id: RequestId,
        /// Restaurant that owns the listing.
        restaurant_id: RestaurantId,
        /// Requesting user's display name.
        user_name: String,
        /// Listing title.
        food_title: String,
    },
}

impl LifecycleEvent {
    /// Short event name, used in log spans.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestCreated { .. } => "request_created",
            Self::RequestApproved { .. } => "request_approved",
            Self::RequestRejected { .. } => "request_rejected",
            Self::RequestCompleted { .. } => "request_completed",
            Self::RequestCancelled { .. } => "request_cancelled",
        }
    }
}
