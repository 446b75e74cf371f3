//! Payment and booking-event handlers.

pub mod booking_events;
pub mod payments;

use crate::error::InternalCause;
use crate::messaging::PushNotification;
use crate::state::AppState;

/// Looks up the booking's owner and, if they registered a device, sends them
/// the notification built from their token. Returns whether one was sent.
async fn notify_owner<F>(
    state: &AppState,
    user_id: Option<&str>,
    build: F,
) -> Result<bool, InternalCause>
where
    F: FnOnce(&str) -> PushNotification + Send,
{
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    let Some(user) = state.users.get_user(user_id).await? else {
        tracing::debug!(%user_id, "booking owner not found");
        return Ok(false);
    };
    let Some(token) = user.push_token() else {
        tracing::debug!(%user_id, "no push token registered");
        return Ok(false);
    };

    state.notifier.send(build(token)).await?;
    Ok(true)
}
