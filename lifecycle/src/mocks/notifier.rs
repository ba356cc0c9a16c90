//! Mock notification sinks for testing.

use crate::error::{LifecycleError, Result};
use crate::notifications::Notification;
use crate::providers::NotificationSink;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Notification sink that records everything it is asked to deliver.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotificationSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications delivered so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the sink mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: Notification) -> impl Future<Output = Result<()>> + Send {
        let sent = Arc::clone(&self.sent);
        async move {
            sent.lock()
                .map_err(|_| LifecycleError::NotificationFailed)?
                .push(notification);
            Ok(())
        }
    }
}

/// Notification sink that always fails delivery.
///
/// Used to verify that notification failures never fail an operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingNotificationSink;

impl FailingNotificationSink {
    /// Create a failing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationSink for FailingNotificationSink {
    fn notify(&self, _notification: Notification) -> impl Future<Output = Result<()>> + Send {
        async move { Err(LifecycleError::NotificationFailed) }
    }
}
