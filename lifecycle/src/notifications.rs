//! Rendering of lifecycle events into notifications.
//!
//! Each [`LifecycleEvent`] maps to exactly one [`Notification`] with a
//! recipient, a template kind, and a rendered title/message pair. Delivery
//! is the [`NotificationSink`](crate::providers::NotificationSink)'s job and
//! is always fire-and-forget.

use crate::events::LifecycleEvent;
use crate::state::{RestaurantId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// A requesting user.
    User(UserId),
    /// A restaurant account.
    Restaurant(RestaurantId),
}

/// Template kind, one per lifecycle outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// New request placed against a restaurant's listing.
    RequestCreated,
    /// Request approved by the restaurant.
    RequestApproved,
    /// Request rejected by the restaurant.
    RequestRejected,
    /// Approved pickup confirmed completed.
    RequestCompleted,
    /// Pending request withdrawn by the user.
    RequestCancelled,
}

/// A rendered notification, ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Addressee.
    pub recipient: Recipient,
    /// Template kind.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Rendered message body.
    pub message: String,
    /// In-app route the notification links to.
    pub action_url: String,
    /// Structured payload for clients that render their own copy.
    pub metadata: serde_json::Value,
}

impl Notification {
    /// Render the single notification an event produces.
    #[must_use]
    pub fn from_event(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::RequestCreated {
                request_id,
                restaurant_id,
                user_name,
                food_title,
                quantity,
                unit,
                ..
            } => Self {
                recipient: Recipient::Restaurant(*restaurant_id),
                kind: NotificationKind::RequestCreated,
                title: "New Food Request".to_string(),
                message: format!("{user_name} requested {quantity} {unit} of {food_title}"),
                action_url: "/restaurant/requests".to_string(),
                metadata: json!({
                    "requestId": request_id,
                    "userName": user_name,
                    "foodTitle": food_title,
                    "quantity": quantity,
                    "unit": unit,
                }),
            },
            LifecycleEvent::RequestApproved {
                request_id,
                user_id,
                restaurant_name,
                food_title,
                pickup_date,
            } => {
                let pickup_info = pickup_date.map_or_else(String::new, |date| {
                    format!(" for pickup on {}", date.format("%Y-%m-%d"))
                });
                Self {
                    recipient: Recipient::User(*user_id),
                    kind: NotificationKind::RequestApproved,
                    title: "Request Approved!".to_string(),
                    message: format!(
                        "{restaurant_name} approved your request for {food_title}{pickup_info}"
                    ),
                    action_url: "/user/requests".to_string(),
                    metadata: json!({
                        "requestId": request_id,
                        "restaurantName": restaurant_name,
                        "foodTitle": food_title,
                        "pickupDate": pickup_date,
                    }),
                }
            }
            LifecycleEvent::RequestRejected {
                request_id,
                user_id,
                restaurant_name,
                food_title,
            } => Self {
                recipient: Recipient::User(*user_id),
                kind: NotificationKind::RequestRejected,
                title: "Request Declined".to_string(),
                message: format!(
                    "{restaurant_name} declined your request for {food_title}. \
                     Don't worry, there are other options available!"
                ),
                action_url: "/food/browse".to_string(),
                metadata: json!({
                    "requestId": request_id,
                    "restaurantName": restaurant_name,
                    "foodTitle": food_title,
                }),
            },
            LifecycleEvent::RequestCompleted {
                request_id,
                user_id,
                restaurant_name,
                food_title,
            } => Self {
                recipient: Recipient::User(*user_id),
                kind: NotificationKind::RequestCompleted,
                title: "Pickup Confirmed!".to_string(),
                message: format!(
                    "Your pickup of {food_title} from {restaurant_name} has been completed. \
                     Thank you for helping reduce food waste!"
                ),
                action_url: "/user/history".to_string(),
                metadata: json!({
                    "requestId": request_id,
                    "restaurantName": restaurant_name,
                    "foodTitle": food_title,
                }),
            },
            LifecycleEvent::RequestCancelled {
                request_id,
                restaurant_id,
                user_name,
                food_title,
            } => Self {
                recipient: Recipient::Restaurant(*restaurant_id),
                kind: NotificationKind::RequestCancelled,
                title: "Request Cancelled".to_string(),
                message: format!("{user_name} cancelled their request for {food_title}"),
                action_url: "/restaurant/requests".to_string(),
                metadata: json!({
                    "requestId": request_id,
                    "userName": user_name,
                    "foodTitle": food_title,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ListingId, RequestId};
    use chrono::TimeZone;

    #[test]
    fn test_created_event_notifies_restaurant() {
        let restaurant_id = RestaurantId::new();
        let note = Notification::from_event(&LifecycleEvent::RequestCreated {
            request_id: RequestId::new(),
            listing_id: ListingId::new(),
            restaurant_id,
            user_id: UserId::new(),
            user_name: "Ada".to_string(),
            food_title: "Day-old sourdough".to_string(),
            quantity: 3,
            unit: "loaves".to_string(),
        });

        assert_eq!(note.recipient, Recipient::Restaurant(restaurant_id));
        assert_eq!(note.kind, NotificationKind::RequestCreated);
        assert_eq!(note.message, "Ada requested 3 loaves of Day-old sourdough");
        assert_eq!(note.action_url, "/restaurant/requests");
    }

    #[test]
    fn test_approved_event_mentions_pickup_date_only_when_set() {
        let user_id = UserId::new();
        #[allow(clippy::unwrap_used)]
        let pickup = chrono::Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();

        let with_date = Notification::from_event(&LifecycleEvent::RequestApproved {
            request_id: RequestId::new(),
            user_id,
            restaurant_name: "Corner Deli".to_string(),
            food_title: "Soup".to_string(),
            pickup_date: Some(pickup),
        });
        assert_eq!(with_date.recipient, Recipient::User(user_id));
        assert_eq!(
            with_date.message,
            "Corner Deli approved your request for Soup for pickup on 2025-03-14"
        );

        let without_date = Notification::from_event(&LifecycleEvent::RequestApproved {
            request_id: RequestId::new(),
            user_id,
            restaurant_name: "Corner Deli".to_string(),
            food_title: "Soup".to_string(),
            pickup_date: None,
        });
        assert_eq!(
            without_date.message,
            "Corner Deli approved your request for Soup"
        );
    }

    #[test]
    fn test_cancelled_event_notifies_restaurant() {
        let restaurant_id = RestaurantId::new();
        let note = Notification::from_event(&LifecycleEvent::RequestCancelled {
            request_id: RequestId::new(),
            restaurant_id,
            user_name: "Ada".to_string(),
            food_title: "Soup".to_string(),
        });
        assert_eq!(note.recipient, Recipient::Restaurant(restaurant_id));
        assert_eq!(note.kind, NotificationKind::RequestCancelled);
        assert_eq!(note.message, "Ada cancelled their request for Soup");
    }

    #[test]
    fn test_rejected_and_completed_notify_user() {
        let user_id = UserId::new();
        let rejected = Notification::from_event(&LifecycleEvent::RequestRejected {
            request_id: RequestId::new(),
            user_id,
            restaurant_name: "Corner Deli".to_string(),
            food_title: "Soup".to_string(),
        });
        assert_eq!(rejected.recipient, Recipient::User(user_id));
        assert_eq!(rejected.kind, NotificationKind::RequestRejected);

        let completed = Notification::from_event(&LifecycleEvent::RequestCompleted {
            request_id: RequestId::new(),
            user_id,
            restaurant_name: "Corner Deli".to_string(),
            food_title: "Soup".to_string(),
        });
        assert_eq!(completed.recipient, Recipient::User(user_id));
        assert_eq!(completed.kind, NotificationKind::RequestCompleted);
        assert_eq!(completed.action_url, "/user/history");
    }
}
