use std::sync::Arc;

use crate::messaging::NotificationDispatcher;
use crate::store::{BookingStore, UserStore};
use crate::verification::PaymentVerifier;

/// Collaborators shared by every handler invocation. Handlers keep no state
/// of their own between calls.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingStore>,
    pub users: Arc<dyn UserStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub verifier: Arc<dyn PaymentVerifier>,
    /// Secret expected on platform event deliveries. `None` refuses them all.
    pub events_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        verifier: Arc<dyn PaymentVerifier>,
    ) -> Self {
        Self {
            bookings,
            users,
            notifier,
            verifier,
            events_token: None,
        }
    }

    pub fn with_events_token(mut self, token: Option<String>) -> Self {
        self.events_token = token.map(Arc::from);
        self
    }
}
