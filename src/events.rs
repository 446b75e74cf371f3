//! Booking creation events and the listener that feeds them to the reactor.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::handlers::booking_events::on_booking_created;
use crate::models::Booking;
use crate::state::AppState;

const FEED_CAPACITY: usize = 256;

/// Emitted once when a booking document is created. Updates never emit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreated {
    pub booking_id: String,
    pub booking: Booking,
}

impl BookingCreated {
    pub fn new(booking: Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            booking,
        }
    }
}

pub type CreationFeed = broadcast::Sender<BookingCreated>;

pub fn creation_feed() -> CreationFeed {
    broadcast::channel(FEED_CAPACITY).0
}

/// Runs the booking-created reactor for every event on the feed until the
/// feed closes. Events are handled one at a time, in order.
pub fn spawn_booking_created_listener(
    state: AppState,
    mut events: broadcast::Receiver<BookingCreated>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => on_booking_created(&state, event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "booking-created listener lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("booking-created feed closed");
    })
}
