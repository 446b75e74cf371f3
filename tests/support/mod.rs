#![allow(dead_code)]

use std::sync::Arc;

use booking_payments::auth::CallerIdentity;
use booking_payments::events::creation_feed;
use booking_payments::mocks::RecordingDispatcher;
use booking_payments::models::{Booking, BookingStatus, User};
use booking_payments::state::AppState;
use booking_payments::store::InMemoryStore;
use booking_payments::verification::{AlwaysConfirm, PaymentVerifier};

/// Platform secret the harness state accepts on booking events.
pub const EVENTS_TOKEN: &str = "platform-secret";

/// In-memory collaborators wired into an `AppState`, with handles kept for
/// assertions.
pub struct Harness {
    pub state: AppState,
    pub store: InMemoryStore,
    pub notifier: RecordingDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_verifier(Arc::new(AlwaysConfirm))
    }

    pub fn with_verifier(verifier: Arc<dyn PaymentVerifier>) -> Self {
        let store = InMemoryStore::new(creation_feed());
        let notifier = RecordingDispatcher::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            verifier,
        )
        .with_events_token(Some(EVENTS_TOKEN.to_owned()));
        Self {
            state,
            store,
            notifier,
        }
    }

    pub fn booking(&self, id: &str, user_id: Option<&str>) {
        self.store.put_booking(Booking {
            id: id.to_owned(),
            status: BookingStatus::Created,
            user_id: user_id.map(str::to_owned),
            payment_reference: None,
            updated_at: None,
            created_at: None,
        })
        .unwrap();
    }

    pub fn user(&self, id: &str, token: Option<&str>) {
        self.store.put_user(User {
            id: id.to_owned(),
            fcm_token: token.map(str::to_owned),
        })
        .unwrap();
    }

    pub async fn stored(&self, id: &str) -> Booking {
        use booking_payments::store::BookingStore;
        self.store
            .get_booking(id)
            .await
            .unwrap()
            .expect("booking should exist")
    }
}

pub fn caller() -> CallerIdentity {
    CallerIdentity::new("caller-1")
}
