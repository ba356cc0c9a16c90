//! Notification sink trait.

use crate::error::Result;
use crate::notifications::Notification;

/// Notification sink.
///
/// This trait abstracts over whatever delivers notifications (an in-app
/// notification table, a push service, a queue). Delivery happens *after*
/// the lifecycle transaction commits and is fire-and-forget: the manager
/// logs failures and never lets them fail or roll back an operation.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails. Callers must isolate this failure;
    /// it never propagates out of a lifecycle operation.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
