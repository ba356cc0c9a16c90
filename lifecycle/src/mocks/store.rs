//! In-memory marketplace store for testing.

use crate::error::{LifecycleError, Result};
use crate::providers::{ListingContext, MarketplaceStore, ReserveOutcome, SettleOutcome};
use crate::state::{
    FoodListing, FoodRequest, ListingId, ListingMutation, ListingStatus, RequestId, RequestStatus,
    UserId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    listings: HashMap<ListingId, FoodListing>,
    restaurant_names: HashMap<ListingId, String>,
    requests: HashMap<RequestId, FoodRequest>,
    user_names: HashMap<UserId, String>,
}

/// In-memory marketplace store.
///
/// A single mutex over all tables stands in for the relational store's
/// transaction boundary: every primitive reads and writes under one lock,
/// so guards observe the same atomicity the SQL adapter gets from its
/// transactions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplaceStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryMarketplaceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a listing owned by a named restaurant.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn insert_listing(&self, listing: FoodListing, restaurant_name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .restaurant_names
            .insert(listing.id, restaurant_name.to_string());
        inner.listings.insert(listing.id, listing);
    }

    /// Seed a user's display name.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn insert_user(&self, user_id: UserId, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .user_names
            .insert(user_id, name.to_string());
    }

    /// Snapshot a listing for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn listing_snapshot(&self, id: ListingId) -> Option<FoodListing> {
        self.inner.lock().unwrap().listings.get(&id).cloned()
    }

    /// Snapshot a request for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn request_snapshot(&self, id: RequestId) -> Option<FoodRequest> {
        self.inner.lock().unwrap().requests.get(&id).cloned()
    }
}

impl MarketplaceStore for InMemoryMarketplaceStore {
    fn listing(
        &self,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<ListingContext>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let inner = inner.lock().map_err(poisoned)?;
            Ok(inner.listings.get(&id).map(|listing| ListingContext {
                listing: listing.clone(),
                restaurant_name: inner
                    .restaurant_names
                    .get(&id)
                    .cloned()
                    .unwrap_or_default(),
            }))
        }
    }

    fn request(&self, id: RequestId) -> impl Future<Output = Result<Option<FoodRequest>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let inner = inner.lock().map_err(poisoned)?;
            Ok(inner.requests.get(&id).cloned())
        }
    }

    fn pending_request_exists(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> impl Future<Output = Result<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let inner = inner.lock().map_err(poisoned)?;
            Ok(inner.requests.values().any(|request| {
                request.user_id == user_id
                    && request.listing_id == listing_id
                    && request.status == RequestStatus::Pending
            }))
        }
    }

    fn user_name(&self, id: UserId) -> impl Future<Output = Result<Option<String>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let inner = inner.lock().map_err(poisoned)?;
            Ok(inner.user_names.get(&id).cloned())
        }
    }

    fn reserve(
        &self,
        request: &FoodRequest,
    ) -> impl Future<Output = Result<ReserveOutcome>> + Send {
        let inner = Arc::clone(&self.inner);
        let request = request.clone();
        async move {
            let mut inner = inner.lock().map_err(poisoned)?;
            let Some(listing) = inner.listings.get_mut(&request.listing_id) else {
                return Ok(ReserveOutcome::Contended);
            };
            // Same guard as the SQL adapter's conditional UPDATE.
            if listing.status != ListingStatus::Available || listing.quantity < request.quantity {
                return Ok(ReserveOutcome::Contended);
            }
            listing.quantity -= request.quantity;
            listing.status = ListingStatus::after_draining(listing.quantity);
            listing.updated_at = request.created_at;
            inner.requests.insert(request.id, request);
            Ok(ReserveOutcome::Reserved)
        }
    }

    fn settle(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        new_status: RequestStatus,
        pickup_date: Option<DateTime<Utc>>,
        listing_id: ListingId,
        mutation: ListingMutation,
    ) -> impl Future<Output = Result<SettleOutcome>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut inner = inner.lock().map_err(poisoned)?;
            let now = Utc::now();

            let Some(request) = inner.requests.get_mut(&request_id) else {
                return Ok(SettleOutcome::StaleStatus);
            };
            if request.status != expected {
                return Ok(SettleOutcome::StaleStatus);
            }
            request.status = new_status;
            if pickup_date.is_some() {
                request.pickup_date = pickup_date;
            }
            request.updated_at = now;

            let Some(listing) = inner.listings.get_mut(&listing_id) else {
                return Err(LifecycleError::Database(
                    "settle referenced a missing listing".to_string(),
                ));
            };
            listing.quantity += mutation.restock;
            listing.status = mutation.status;
            listing.updated_at = now;

            Ok(SettleOutcome::Applied)
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LifecycleError {
    LifecycleError::Database("store mutex poisoned".to_string())
}
