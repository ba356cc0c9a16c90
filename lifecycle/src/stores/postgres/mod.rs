//! PostgreSQL marketplace store implementation.
//!
//! The two write primitives run inside explicit transactions and use
//! *conditional* updates: the reserve decrement only fires while the listing
//! is still `AVAILABLE` with enough quantity, and the settle update only
//! fires while the request still holds the expected status. `rows_affected`
//! is the guard signal, so a lost race is detected without stricter
//! isolation than read-committed.
//!
//! # Example
//!
//! ```no_run
//! use foodshare_lifecycle::stores::PostgresMarketplaceStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/foodshare").await?;
//! let store = PostgresMarketplaceStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{LifecycleError, Result};
use crate::providers::{
    ListingContext, MarketplaceStore, ReserveOutcome, SettleOutcome,
};
use crate::state::{
    FoodListing, FoodRequest, ListingId, ListingMutation, ListingStatus, RequestId, RequestStatus,
    RestaurantId, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// `PostgreSQL` marketplace store.
#[derive(Clone)]
pub struct PostgresMarketplaceStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresMarketplaceStore {
    /// Create a new `PostgreSQL` marketplace store.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LifecycleError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

/// Row shape for listing reads (joined with the restaurant's name).
#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    restaurant_id: Uuid,
    restaurant_name: String,
    title: String,
    unit: String,
    quantity: i32,
    status: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for ListingContext {
    type Error = LifecycleError;

    fn try_from(row: ListingRow) -> Result<Self> {
        Ok(Self {
            listing: FoodListing {
                id: ListingId(row.id),
                restaurant_id: RestaurantId(row.restaurant_id),
                title: row.title,
                unit: row.unit,
                quantity: non_negative(row.quantity)?,
                status: ListingStatus::from_str(&row.status)?,
                expires_at: row.expires_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            restaurant_name: row.restaurant_name,
        })
    }
}

/// Row shape for request reads.
#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    user_id: Uuid,
    listing_id: Uuid,
    quantity: i32,
    status: String,
    message: Option<String>,
    pickup_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for FoodRequest {
    type Error = LifecycleError;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(Self {
            id: RequestId(row.id),
            user_id: UserId(row.user_id),
            listing_id: ListingId(row.listing_id),
            quantity: non_negative(row.quantity)?,
            status: RequestStatus::from_str(&row.status)?,
            message: row.message,
            pickup_date: row.pickup_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a stored quantity back to the domain type.
///
/// The schema carries a `CHECK (quantity >= 0)`, so a negative value here
/// means the invariant was violated outside this component.
fn non_negative(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .map_err(|_| LifecycleError::Database(format!("negative quantity in store: {quantity}")))
}

/// Convert a domain quantity to the stored representation.
fn stored_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| LifecycleError::Database(format!("quantity out of range: {quantity}")))
}

impl MarketplaceStore for PostgresMarketplaceStore {
    async fn listing(&self, id: ListingId) -> Result<Option<ListingContext>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r"
            SELECT l.id, l.restaurant_id, r.name AS restaurant_name, l.title, l.unit,
                   l.quantity, l.status, l.expires_at, l.created_at, l.updated_at
            FROM food_listings l
            JOIN restaurants r ON r.id = l.restaurant_id
            WHERE l.id = $1
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to get listing: {e}")))?;

        row.map(ListingContext::try_from).transpose()
    }

    async fn request(&self, id: RequestId) -> Result<Option<FoodRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r"
            SELECT id, user_id, listing_id, quantity, status, message, pickup_date,
                   created_at, updated_at
            FROM food_requests
            WHERE id = $1
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to get request: {e}")))?;

        row.map(FoodRequest::try_from).transpose()
    }

    async fn pending_request_exists(
        &self,
        user_id: UserId,
        listing_id: ListingId,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM food_requests
                WHERE user_id = $1 AND listing_id = $2 AND status = 'PENDING'
            )
            ",
        )
        .bind(user_id.0)
        .bind(listing_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to check pending requests: {e}")))
    }

    async fn user_name(&self, id: UserId) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LifecycleError::Database(format!("Failed to get user name: {e}")))
    }

    async fn reserve(&self, request: &FoodRequest) -> Result<ReserveOutcome> {
        let quantity = stored_quantity(request.quantity)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LifecycleError::Database(format!("Failed to begin transaction: {e}")))?;

        // Single conditional decrement-with-floor: the guard and the write
        // are one statement, so concurrent reservations can never drive the
        // quantity negative under read-committed isolation.
        let updated = sqlx::query(
            r"
            UPDATE food_listings
            SET quantity = quantity - $2,
                status = CASE WHEN quantity - $2 <= 0 THEN 'RESERVED' ELSE 'AVAILABLE' END,
                updated_at = NOW()
            WHERE id = $1 AND status = 'AVAILABLE' AND quantity >= $2
            ",
        )
        .bind(request.listing_id.0)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to reserve quantity: {e}")))?;

        if updated.rows_affected() == 0 {
            // Guard lost: listing gone, not available, or not enough left.
            return Ok(ReserveOutcome::Contended);
        }

        sqlx::query(
            r"
            INSERT INTO food_requests
                (id, user_id, listing_id, quantity, status, message, pickup_date,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8)
            ",
        )
        .bind(request.id.0)
        .bind(request.user_id.0)
        .bind(request.listing_id.0)
        .bind(quantity)
        .bind(request.status.as_str())
        .bind(request.message.as_deref())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to insert request: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| LifecycleError::Database(format!("Failed to commit reservation: {e}")))?;

        Ok(ReserveOutcome::Reserved)
    }

    async fn settle(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        new_status: RequestStatus,
        pickup_date: Option<DateTime<Utc>>,
        listing_id: ListingId,
        mutation: ListingMutation,
    ) -> Result<SettleOutcome> {
        let restock = stored_quantity(mutation.restock)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LifecycleError::Database(format!("Failed to begin transaction: {e}")))?;

        // Guarded on the expected current status so a transition can only
        // ever be applied once.
        let updated = sqlx::query(
            r"
            UPDATE food_requests
            SET status = $2,
                pickup_date = COALESCE($3, pickup_date),
                updated_at = NOW()
            WHERE id = $1 AND status = $4
            ",
        )
        .bind(request_id.0)
        .bind(new_status.as_str())
        .bind(pickup_date)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to update request: {e}")))?;

        if updated.rows_affected() == 0 {
            return Ok(SettleOutcome::StaleStatus);
        }

        let listing = sqlx::query(
            r"
            UPDATE food_listings
            SET quantity = quantity + $2,
                status = $3,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(listing_id.0)
        .bind(restock)
        .bind(mutation.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| LifecycleError::Database(format!("Failed to update listing: {e}")))?;

        if listing.rows_affected() == 0 {
            return Err(LifecycleError::Database(
                "settle referenced a missing listing".to_string(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| LifecycleError::Database(format!("Failed to commit settlement: {e}")))?;

        Ok(SettleOutcome::Applied)
    }
}
