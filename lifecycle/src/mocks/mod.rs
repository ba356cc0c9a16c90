//! Mock collaborators for testing.
//!
//! In-memory implementations of the provider traits. The store mock applies
//! the same guard semantics as the `PostgreSQL` adapter behind a single
//! mutex, so the lifecycle manager's concurrency behavior can be exercised
//! at memory speed.

pub mod notifier;
pub mod store;

pub use notifier::{FailingNotificationSink, RecordingNotificationSink};
pub use store::InMemoryMarketplaceStore;
