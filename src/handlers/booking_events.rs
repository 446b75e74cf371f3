use super::notify_owner;
use crate::events::BookingCreated;
use crate::messaging::PushNotification;
use crate::state::AppState;

/// Tells the owner of a newly created booking that it exists.
///
/// Runs once per created booking. The event only names the booking: the
/// owner is read from the stored record, and an event for a booking the
/// store does not know is dropped. There is nobody to report failures to, so
/// they are logged and dropped; retrying is up to whatever delivered the
/// event.
pub async fn on_booking_created(state: &AppState, event: BookingCreated) {
    let booking_id = event.booking_id.as_str();
    let booking = match state.bookings.get_booking(booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            tracing::warn!(%booking_id, "creation event for unknown booking");
            return;
        }
        Err(err) => {
            tracing::error!(%booking_id, error = %err, "Error loading created booking");
            return;
        }
    };
    let Some(user_id) = booking.user_id.as_deref() else {
        tracing::warn!(%booking_id, "created booking has no owner");
        return;
    };

    let result = notify_owner(state, Some(user_id), |token| {
        PushNotification::booking_created(token, booking_id)
    })
    .await;
    match result {
        Ok(notified) => tracing::debug!(%booking_id, %user_id, notified, "booking created"),
        Err(err) => {
            tracing::error!(%booking_id, %user_id, error = %err, detail = ?err, "Error sending notification")
        }
    }
}
