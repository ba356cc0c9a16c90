//! # FoodShare Lifecycle
//!
//! The listing/request lifecycle manager for the FoodShare surplus-food
//! marketplace: restaurants list surplus food, users request portions of it,
//! and this crate keeps a listing's remaining quantity and status consistent
//! with its requests' statuses across create, approve, reject, complete and
//! cancel.
//!
//! ## Architecture
//!
//! The manager is injected with two collaborator traits:
//!
//! ```text
//! LifecycleManager
//!   ├── MarketplaceStore     transactional reads + guarded writes
//!   │     ├── PostgresMarketplaceStore   (production)
//!   │     └── InMemoryMarketplaceStore   (tests)
//!   └── NotificationSink     post-commit, fire-and-forget delivery
//! ```
//!
//! Every operation is: precondition checks against a fresh read, then one
//! atomic store primitive whose guard re-checks the preconditions inside the
//! transaction, then exactly one notification. Guard losses are re-read and
//! re-classified, so concurrent callers get precise errors instead of lost
//! updates.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use foodshare_lifecycle::mocks::{InMemoryMarketplaceStore, RecordingNotificationSink};
//! use foodshare_lifecycle::{
//!     FoodListing, LifecycleManager, ListingId, ListingStatus, RestaurantId, UserId,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> foodshare_lifecycle::Result<()> {
//! let store = InMemoryMarketplaceStore::new();
//! let now = Utc::now();
//! let listing = FoodListing {
//!     id: ListingId::new(),
//!     restaurant_id: RestaurantId::new(),
//!     title: "Day-old sourdough".into(),
//!     unit: "loaves".into(),
//!     quantity: 5,
//!     status: ListingStatus::Available,
//!     expires_at: now + chrono::Duration::days(1),
//!     created_at: now,
//!     updated_at: now,
//! };
//! store.insert_listing(listing.clone(), "Corner Deli");
//!
//! let manager = LifecycleManager::new(store, RecordingNotificationSink::new());
//! let request = manager
//!     .create_request(UserId::new(), listing.id, 2, None)
//!     .await?;
//! assert_eq!(request.quantity, 2);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod notifications;
pub mod providers;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use error::{LifecycleError, Result};
pub use events::LifecycleEvent;
pub use manager::LifecycleManager;
pub use notifications::{Notification, NotificationKind, Recipient};
pub use providers::{MarketplaceStore, NotificationSink};
pub use state::{
    Decision, FoodListing, FoodRequest, ListingId, ListingMutation, ListingStatus, RequestId,
    RequestStatus, RestaurantId, UserId,
};
