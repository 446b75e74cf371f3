//! Push notifications.
//!
//! Delivery belongs to an external messaging service; this module defines
//! the messages the handlers send and the seam they are sent through.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    BookingCreated,
    BookingConfirmed,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookingCreated => "BOOKING_CREATED",
            NotificationType::BookingConfirmed => "BOOKING_CONFIRMED",
        }
    }
}

/// A message addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl PushNotification {
    pub fn booking_created(token: impl Into<String>, booking_id: &str) -> Self {
        Self::for_booking(
            token,
            "New booking",
            "Your booking has been created. Please proceed to payment.",
            NotificationType::BookingCreated,
            booking_id,
        )
    }

    pub fn booking_confirmed(token: impl Into<String>, booking_id: &str) -> Self {
        Self::for_booking(
            token,
            "Payment confirmed",
            "Your booking has been confirmed. You can now download your ticket.",
            NotificationType::BookingConfirmed,
            booking_id,
        )
    }

    fn for_booking(
        token: impl Into<String>,
        title: &str,
        body: &str,
        kind: NotificationType,
        booking_id: &str,
    ) -> Self {
        let data = BTreeMap::from([
            ("type".to_owned(), kind.as_str().to_owned()),
            ("bookingId".to_owned(), booking_id.to_owned()),
        ]);
        Self {
            token: token.into(),
            title: title.to_owned(),
            body: body.to_owned(),
            data,
        }
    }

    /// The `type` entry of the payload.
    pub fn kind(&self) -> Option<&str> {
        self.data.get("type").map(String::as_str)
    }

    pub fn booking_id(&self) -> Option<&str> {
        self.data.get("bookingId").map(String::as_str)
    }
}

/// Hands notifications to the push service. Callers do not wait for device
/// delivery, only for the service to accept the message.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: PushNotification) -> Result<(), DispatchError>;
}

/// Writes notifications to the log instead of delivering them. Used when no
/// push service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send(&self, notification: PushNotification) -> Result<(), DispatchError> {
        tracing::info!(
            token = %notification.token,
            title = %notification.title,
            kind = notification.kind().unwrap_or_default(),
            booking_id = notification.booking_id().unwrap_or_default(),
            "push notification"
        );
        Ok(())
    }
}
