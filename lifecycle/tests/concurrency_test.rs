//! Concurrency tests: the guarded store primitives must keep the listing
//! quantity consistent when operations against the same listing race.

use chrono::{Duration, Utc};
use foodshare_lifecycle::mocks::{InMemoryMarketplaceStore, RecordingNotificationSink};
use foodshare_lifecycle::{
    Decision, FoodListing, LifecycleError, LifecycleManager, ListingId, ListingStatus,
    RequestStatus, RestaurantId, UserId,
};

fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn seeded_listing(quantity: u32) -> (InMemoryMarketplaceStore, RestaurantId, ListingId) {
    let store = InMemoryMarketplaceStore::new();
    let restaurant_id = RestaurantId::new();
    let listing_id = ListingId::new();
    let now = Utc::now();
    store.insert_listing(
        FoodListing {
            id: listing_id,
            restaurant_id,
            title: "Last tray of pastries".to_string(),
            unit: "trays".to_string(),
            quantity,
            status: ListingStatus::Available,
            expires_at: now + Duration::days(1),
            created_at: now,
            updated_at: now,
        },
        "Corner Deli",
    );
    (store, restaurant_id, listing_id)
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_last_unit_race_has_exactly_one_winner() {
    trace_init();
    let (store, _, listing_id) = seeded_listing(1);
    let sink = RecordingNotificationSink::new();
    let manager = LifecycleManager::new(store.clone(), sink.clone());

    let (a, b) = tokio::join!(
        manager.create_request(UserId::new(), listing_id, 1, None),
        manager.create_request(UserId::new(), listing_id, 1, None),
    );

    // Exactly one reservation wins; the loser gets a precondition error,
    // never a lost update.
    assert_ne!(a.is_ok(), b.is_ok(), "exactly one request must win");
    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert!(loser.is_client_error(), "loser saw {loser:?}");

    let listing = store.listing_snapshot(listing_id).unwrap();
    assert_eq!(listing.quantity, 0);
    assert_eq!(listing.status, ListingStatus::Reserved);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_many_concurrent_requests_never_overdraw() {
    trace_init();
    let (store, _, listing_id) = seeded_listing(5);
    let manager = LifecycleManager::new(store.clone(), RecordingNotificationSink::new());

    let mut handles = Vec::new();
    for _ in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .create_request(UserId::new(), listing_id, 2, None)
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            winners += 1;
        }
    }

    // 5 units, 2 per request: exactly two reservations fit.
    assert_eq!(winners, 2);
    let listing = store.listing_snapshot(listing_id).unwrap();
    assert_eq!(listing.quantity, 1);
    assert_eq!(listing.status, ListingStatus::Available);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_approve_cancel_race_settles_exactly_once() {
    trace_init();
    let (store, restaurant_id, listing_id) = seeded_listing(3);
    let user_id = UserId::new();
    let manager = LifecycleManager::new(store.clone(), RecordingNotificationSink::new());

    let request = manager
        .create_request(user_id, listing_id, 3, None)
        .await
        .unwrap();

    let (approve, cancel) = tokio::join!(
        manager.update_request_status(restaurant_id, request.id, Decision::Approve, None),
        manager.cancel_request(user_id, request.id),
    );

    assert_ne!(
        approve.is_ok(),
        cancel.is_ok(),
        "exactly one transition must settle"
    );

    let listing = store.listing_snapshot(listing_id).unwrap();
    let settled = store.request_snapshot(request.id).unwrap();
    if approve.is_ok() {
        assert_eq!(settled.status, RequestStatus::Approved);
        assert_eq!(listing.quantity, 0);
        assert_eq!(listing.status, ListingStatus::Reserved);
        assert!(matches!(
            cancel.unwrap_err(),
            LifecycleError::RequestNotPending { .. }
        ));
    } else {
        assert_eq!(settled.status, RequestStatus::Cancelled);
        assert_eq!(listing.quantity, 3);
        assert_eq!(listing.status, ListingStatus::Available);
        assert!(matches!(
            approve.unwrap_err(),
            LifecycleError::InvalidTransition { .. }
        ));
    }
}
