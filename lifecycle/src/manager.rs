//! The listing/request lifecycle manager.
//!
//! Owns every mutation of `FoodListing.quantity`/`FoodListing.status` and
//! `FoodRequest.status`, keeping them consistent across create, decide
//! (approve/reject/complete) and cancel. Each operation is: precondition
//! checks against a fresh read, one transactional store primitive, then a
//! single post-commit notification whose failure is logged and swallowed.

use crate::error::{LifecycleError, Result};
use crate::events::LifecycleEvent;
use crate::notifications::Notification;
use crate::providers::{
    ListingContext, MarketplaceStore, NotificationSink, ReserveOutcome, SettleOutcome,
};
use crate::state::{
    Decision, FoodRequest, ListingId, ListingMutation, ListingStatus, RequestId, RequestStatus,
    RestaurantId, UserId, plan_transition,
};
use chrono::{DateTime, Utc};

/// Display name used when a requester has no stored profile name.
const ANONYMOUS_USER: &str = "A community member";

/// The lifecycle manager.
///
/// Generic over its two injected collaborators so the same logic runs
/// against the `PostgreSQL` adapter in production and the in-memory mocks
/// in tests.
#[derive(Clone)]
pub struct LifecycleManager<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> LifecycleManager<S, N>
where
    S: MarketplaceStore,
    N: NotificationSink,
{
    /// Create a manager over a store and a notification sink.
    pub const fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Create a request: reserve quantity from a listing and insert a
    /// `PENDING` request, atomically.
    ///
    /// Preconditions, each checked before any mutation:
    /// - the listing exists and is `AVAILABLE`
    /// - it holds at least `quantity` units
    /// - the user holds no other `PENDING` request against it
    ///
    /// On success the listing's quantity drops by `quantity` and its status
    /// is re-derived (`RESERVED` when drained to zero), and the restaurant
    /// is notified.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidQuantity`], [`LifecycleError::ListingNotFound`],
    /// [`LifecycleError::ListingUnavailable`],
    /// [`LifecycleError::InsufficientQuantity`],
    /// [`LifecycleError::DuplicatePendingRequest`], or a store failure.
    #[tracing::instrument(skip(self, message), fields(user_id = %user_id.0, listing_id = %listing_id.0, quantity))]
    pub async fn create_request(
        &self,
        user_id: UserId,
        listing_id: ListingId,
        quantity: u32,
        message: Option<String>,
    ) -> Result<FoodRequest> {
        if quantity == 0 {
            return Err(LifecycleError::InvalidQuantity);
        }

        let ctx = self
            .store
            .listing(listing_id)
            .await?
            .ok_or(LifecycleError::ListingNotFound)?;

        if ctx.listing.status != ListingStatus::Available {
            return Err(LifecycleError::ListingUnavailable {
                status: ctx.listing.status,
            });
        }
        if ctx.listing.quantity < quantity {
            return Err(LifecycleError::InsufficientQuantity {
                requested: quantity,
                available: ctx.listing.quantity,
            });
        }
        if self
            .store
            .pending_request_exists(user_id, listing_id)
            .await?
        {
            return Err(LifecycleError::DuplicatePendingRequest);
        }

        // Looked up before the write so a lookup failure aborts cleanly.
        let user_name = self
            .store
            .user_name(user_id)
            .await?
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        let request = FoodRequest::new(user_id, listing_id, quantity, message, Utc::now());
        match self.store.reserve(&request).await? {
            ReserveOutcome::Reserved => {}
            ReserveOutcome::Contended => {
                // Another operation committed between our read and the
                // guarded write. Re-read and report the precise reason.
                return Err(self.reserve_conflict(listing_id, quantity).await);
            }
        }

        tracing::info!(request_id = %request.id.0, "food request created");
        self.dispatch(LifecycleEvent::RequestCreated {
            request_id: request.id,
            listing_id,
            restaurant_id: ctx.listing.restaurant_id,
            user_id,
            user_name,
            food_title: ctx.listing.title.clone(),
            quantity,
            unit: ctx.listing.unit.clone(),
        })
        .await;

        Ok(request)
    }

    /// Apply a restaurant's decision to a request.
    ///
    /// Only the restaurant that owns the request's listing may decide.
    /// Valid transitions are exactly `PENDING → APPROVED` (listing becomes
    /// `RESERVED`), `PENDING → REJECTED` (quantity restored, listing
    /// `AVAILABLE`), and `APPROVED → COMPLETED` (listing `CLAIMED`); every
    /// other pairing fails without touching any state. `pickup_date` is
    /// honored only on approval. The requesting user is notified of the
    /// outcome.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::RequestNotFound`], [`LifecycleError::Forbidden`],
    /// [`LifecycleError::InvalidTransition`], or a store failure.
    #[tracing::instrument(skip(self), fields(restaurant_id = %restaurant_id.0, request_id = %request_id.0, decision = ?decision))]
    pub async fn update_request_status(
        &self,
        restaurant_id: RestaurantId,
        request_id: RequestId,
        decision: Decision,
        pickup_date: Option<DateTime<Utc>>,
    ) -> Result<FoodRequest> {
        let request = self
            .store
            .request(request_id)
            .await?
            .ok_or(LifecycleError::RequestNotFound)?;
        let ctx = self
            .store
            .listing(request.listing_id)
            .await?
            .ok_or(LifecycleError::ListingNotFound)?;

        if ctx.listing.restaurant_id != restaurant_id {
            return Err(LifecycleError::Forbidden);
        }

        let (new_status, mutation) = plan_transition(request.status, decision, request.quantity)?;
        let pickup = match decision {
            Decision::Approve => pickup_date,
            Decision::Reject | Decision::Complete => None,
        };

        match self
            .store
            .settle(
                request.id,
                request.status,
                new_status,
                pickup,
                request.listing_id,
                mutation,
            )
            .await?
        {
            SettleOutcome::Applied => {}
            SettleOutcome::StaleStatus => {
                return Err(self.settle_conflict(request_id, new_status).await);
            }
        }

        tracing::info!(
            from = request.status.as_str(),
            to = new_status.as_str(),
            "food request status updated"
        );
        self.dispatch(decision_event(decision, &request, &ctx, pickup))
            .await;

        Ok(FoodRequest {
            status: new_status,
            pickup_date: pickup.or(request.pickup_date),
            updated_at: Utc::now(),
            ..request
        })
    }

    /// Cancel a pending request, restoring its quantity to the listing.
    ///
    /// Only the requesting user may cancel, and only while the request is
    /// `PENDING`. The listing gets the request's exact quantity back and
    /// becomes `AVAILABLE` again; the restaurant is notified.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::RequestNotFound`], [`LifecycleError::Forbidden`],
    /// [`LifecycleError::RequestNotPending`], or a store failure.
    #[tracing::instrument(skip(self), fields(user_id = %user_id.0, request_id = %request_id.0))]
    pub async fn cancel_request(
        &self,
        user_id: UserId,
        request_id: RequestId,
    ) -> Result<FoodRequest> {
        let request = self
            .store
            .request(request_id)
            .await?
            .ok_or(LifecycleError::RequestNotFound)?;

        if request.user_id != user_id {
            return Err(LifecycleError::Forbidden);
        }
        if request.status != RequestStatus::Pending {
            return Err(LifecycleError::RequestNotPending {
                status: request.status,
            });
        }

        let ctx = self
            .store
            .listing(request.listing_id)
            .await?
            .ok_or(LifecycleError::ListingNotFound)?;
        let user_name = self
            .store
            .user_name(user_id)
            .await?
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        match self
            .store
            .settle(
                request.id,
                RequestStatus::Pending,
                RequestStatus::Cancelled,
                None,
                request.listing_id,
                ListingMutation::restock(request.quantity),
            )
            .await?
        {
            SettleOutcome::Applied => {}
            SettleOutcome::StaleStatus => {
                // Lost a race against a restaurant decision.
                return Err(match self.store.request(request_id).await? {
                    None => LifecycleError::RequestNotFound,
                    Some(fresh) => LifecycleError::RequestNotPending {
                        status: fresh.status,
                    },
                });
            }
        }

        tracing::info!("food request cancelled");
        self.dispatch(LifecycleEvent::RequestCancelled {
            request_id: request.id,
            restaurant_id: ctx.listing.restaurant_id,
            user_name,
            food_title: ctx.listing.title.clone(),
        })
        .await;

        Ok(FoodRequest {
            status: RequestStatus::Cancelled,
            updated_at: Utc::now(),
            ..request
        })
    }

    /// Re-classify a failed reserve guard against a fresh read.
    async fn reserve_conflict(&self, listing_id: ListingId, requested: u32) -> LifecycleError {
        match self.store.listing(listing_id).await {
            Ok(None) => LifecycleError::ListingNotFound,
            Ok(Some(ctx)) if ctx.listing.status != ListingStatus::Available => {
                LifecycleError::ListingUnavailable {
                    status: ctx.listing.status,
                }
            }
            Ok(Some(ctx)) => LifecycleError::InsufficientQuantity {
                requested,
                available: ctx.listing.quantity,
            },
            Err(err) => err,
        }
    }

    /// Re-classify a failed settle guard against a fresh read.
    async fn settle_conflict(&self, request_id: RequestId, to: RequestStatus) -> LifecycleError {
        match self.store.request(request_id).await {
            Ok(None) => LifecycleError::RequestNotFound,
            Ok(Some(fresh)) => LifecycleError::InvalidTransition {
                from: fresh.status,
                to,
            },
            Err(err) => err,
        }
    }

    /// Deliver the post-commit notification for an event.
    ///
    /// Failures are logged and never escalate: by the time we get here the
    /// transaction has committed and the operation has succeeded.
    async fn dispatch(&self, event: LifecycleEvent) {
        let name = event.name();
        if let Err(error) = self.notifier.notify(Notification::from_event(&event)).await {
            tracing::warn!(event = name, %error, "notification delivery failed, continuing");
        }
    }
}

/// Build the user-facing event for a restaurant decision.
fn decision_event(
    decision: Decision,
    request: &FoodRequest,
    ctx: &ListingContext,
    pickup: Option<DateTime<Utc>>,
) -> LifecycleEvent {
    match decision {
        Decision::Approve => LifecycleEvent::RequestApproved {
            request_id: request.id,
            user_id: request.user_id,
            restaurant_name: ctx.restaurant_name.clone(),
            food_title: ctx.listing.title.clone(),
            pickup_date: pickup,
        },
        Decision::Reject => LifecycleEvent::RequestRejected {
            request_id: request.id,
            user_id: request.user_id,
            restaurant_name: ctx.restaurant_name.clone(),
            food_title: ctx.listing.title.clone(),
        },
        Decision::Complete => LifecycleEvent::RequestCompleted {
            request_id: request.id,
            user_id: request.user_id,
            restaurant_name: ctx.restaurant_name.clone(),
            food_title: ctx.listing.title.clone(),
        },
    }
}
