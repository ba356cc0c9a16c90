//! Collaborator interfaces for the lifecycle manager.
//!
//! This module defines traits for the two external dependencies the
//! lifecycle manager needs: the transactional marketplace store and the
//! notification sink. The manager depends only on these traits, which
//! enables dependency injection:
//!
//! - **Testing**: in-memory mocks (deterministic, run at memory speed)
//! - **Production**: the `PostgreSQL` adapter in [`crate::stores`]
//!
//! The store trait deliberately exposes *transactional primitives*
//! (`reserve`, `settle`) instead of bare row writes: the conditional
//! quantity decrement and the guarded status update must happen inside a
//! single transaction, or two concurrent operations against the same
//! listing can lose an update.

pub mod notifier;
pub mod store;

pub use notifier::NotificationSink;
pub use store::{ListingContext, MarketplaceStore, ReserveOutcome, SettleOutcome};
