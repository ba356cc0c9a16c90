//! Marketplace store trait.

use crate::error::Result;
use crate::state::{
    FoodListing, FoodRequest, ListingId, ListingMutation, RequestId, RequestStatus, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing together with its restaurant's display name.
///
/// The name rides along so notification payloads can be built without a
/// second round trip (the relational adapter gets it from a join).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingContext {
    /// The listing itself.
    pub listing: FoodListing,
    /// Display name of the owning restaurant.
    pub restaurant_name: String,
}

/// Outcome of a [`MarketplaceStore::reserve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The decrement guard held and the request row was inserted.
    Reserved,
    /// The guard failed: the listing changed under us (concurrent commit,
    /// status change, or deletion). No state was written. The caller should
    /// re-read the listing to classify the failure precisely.
    Contended,
}

/// Outcome of a [`MarketplaceStore::settle`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The request moved to its new status and the listing mutation was
    /// applied in the same transaction.
    Applied,
    /// The request was no longer in the expected status (or no longer
    /// exists). No state was written.
    StaleStatus,
}

/// Durable transactional store for listings and requests.
///
/// Implementations must provide at-least read-committed isolation and make
/// `reserve`/`settle` atomic: either every row change in the primitive
/// commits, or none does.
///
/// # Guard semantics
///
/// Both write primitives are *conditional*. `reserve` only decrements a
/// listing that is still `AVAILABLE` with enough quantity; `settle` only
/// moves a request that still holds the expected status. A failed guard is
/// reported as an outcome, not an error, because under concurrency it is an
/// ordinary occurrence the manager re-classifies against a fresh read.
pub trait MarketplaceStore: Send + Sync {
    /// Fetch a listing (with its restaurant's display name) by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn listing(
        &self,
        id: ListingId,
    ) -> impl std::future::Future<Output = Result<Option<ListingContext>>> + Send;

    /// Fetch a request by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn request(
        &self,
        id: RequestId,
    ) -> impl std::future::Future<Output = Result<Option<FoodRequest>>> + Send;

    /// Whether `user_id` already holds a `PENDING` request against
    /// `listing_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn pending_request_exists(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Fetch a user's display name.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn user_name(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Atomically reserve `request.quantity` units from the target listing
    /// and insert the request row.
    ///
    /// In one transaction: decrement the listing's quantity *iff* it is
    /// still `AVAILABLE` and holds at least `request.quantity` units, derive
    /// the listing's new status from the remaining quantity, and insert the
    /// `PENDING` request. The decrement-with-floor must be a single
    /// conditional update so concurrent reservations can never drive the
    /// quantity negative.
    ///
    /// # Errors
    ///
    /// Returns error if the store transaction fails. A failed guard is
    /// [`ReserveOutcome::Contended`], not an error.
    fn reserve(
        &self,
        request: &FoodRequest,
    ) -> impl std::future::Future<Output = Result<ReserveOutcome>> + Send;

    /// Atomically move a request to a new status and apply the matching
    /// listing mutation.
    ///
    /// In one transaction: update the request's status (and `pickup_date`,
    /// when given) *iff* it still holds `expected`, then add
    /// `mutation.restock` to the listing's quantity and set the listing's
    /// status to `mutation.status`.
    ///
    /// # Errors
    ///
    /// Returns error if the store transaction fails. A stale `expected`
    /// status is [`SettleOutcome::StaleStatus`], not an error.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        new_status: RequestStatus,
        pickup_date: Option<DateTime<Utc>>,
        listing_id: ListingId,
        mutation: ListingMutation,
    ) -> impl std::future::Future<Output = Result<SettleOutcome>> + Send;
}
