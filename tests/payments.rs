mod support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booking_payments::dtos::{PaymentRequest, PaymentVerification};
use booking_payments::error::{ErrorKind, InternalCause, StoreError};
use booking_payments::events::{creation_feed, spawn_booking_created_listener, BookingCreated};
use booking_payments::handlers::booking_events::on_booking_created;
use booking_payments::handlers::payments::{initiate_payment, verify_payment, VERIFY_FAILED};
use booking_payments::mocks::RejectAll;
use booking_payments::models::{Booking, BookingStatus, NewBooking, User};
use booking_payments::state::AppState;
use booking_payments::store::{BookingStore, ConfirmOutcome, InMemoryStore};

use support::{caller, Harness};

fn payment_request(booking_id: &str) -> PaymentRequest {
    PaymentRequest {
        booking_id: booking_id.to_owned(),
        method: "mobile-money".to_owned(),
        amount: 2500.0,
        phone_number: "+22500000000".to_owned(),
    }
}

fn verification(booking_id: &str, transaction_id: &str) -> PaymentVerification {
    PaymentVerification {
        booking_id: booking_id.to_owned(),
        transaction_id: transaction_id.to_owned(),
    }
}

/// Hands control back to the scheduler before every read and confirm, so
/// concurrent verifications interleave between their existence check and
/// their write.
struct YieldingStore(InMemoryStore);

#[async_trait]
impl BookingStore for YieldingStore {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        tokio::task::yield_now().await;
        self.0.get_booking(id).await
    }

    async fn confirm_booking(
        &self,
        id: &str,
        payment_reference: &str,
    ) -> Result<ConfirmOutcome, StoreError> {
        tokio::task::yield_now().await;
        self.0.confirm_booking(id, payment_reference).await
    }

    async fn insert_booking(&self, new: NewBooking) -> Result<Booking, StoreError> {
        self.0.insert_booking(new).await
    }
}

#[tokio::test]
async fn unauthenticated_calls_are_rejected_without_mutation() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));

    let initiate = initiate_payment(&harness.state, None, payment_request("b1"))
        .await
        .unwrap_err();
    let verify = verify_payment(&harness.state, None, verification("b1", "TXN1"))
        .await
        .unwrap_err();

    assert_eq!(initiate.kind(), ErrorKind::Unauthenticated);
    assert_eq!(verify.kind(), ErrorKind::Unauthenticated);
    assert_eq!(harness.store.write_count(), 0);
    assert_eq!(harness.stored("b1").await.status, BookingStatus::Created);
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn unknown_bookings_are_not_found() {
    let harness = Harness::new();
    let caller = caller();

    let initiate = initiate_payment(&harness.state, Some(&caller), payment_request("ghost"))
        .await
        .unwrap_err();
    let verify = verify_payment(&harness.state, Some(&caller), verification("ghost", "TXN1"))
        .await
        .unwrap_err();

    assert_eq!(initiate.kind(), ErrorKind::NotFound);
    assert_eq!(verify.kind(), ErrorKind::NotFound);
    assert_eq!(harness.store.write_count(), 0);
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn initiation_issues_references_without_touching_the_booking() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    let caller = caller();

    let first = initiate_payment(&harness.state, Some(&caller), payment_request("b1"))
        .await
        .unwrap();
    let second = initiate_payment(&harness.state, Some(&caller), payment_request("b1"))
        .await
        .unwrap();

    assert!(first.success);
    assert!(first.transaction_id.starts_with("TXN"));
    assert!(first.ticket_number.starts_with("TKT"));
    assert!(first.message.contains("+22500000000"));
    assert_ne!(first.transaction_id, second.transaction_id);
    assert_ne!(first.ticket_number, second.ticket_number);

    let booking = harness.stored("b1").await;
    assert_eq!(booking.status, BookingStatus::Created);
    assert!(booking.payment_reference.is_none());
    assert_eq!(harness.store.write_count(), 0);
}

#[tokio::test]
async fn verification_confirms_and_notifies_the_owner() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));
    let caller = caller();
    let before = chrono::Utc::now();

    let result = verify_payment(&harness.state, Some(&caller), verification("b1", "TXN123"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.message, "Payment verified successfully");

    let booking = harness.stored("b1").await;
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_reference.as_deref(), Some("TXN123"));
    assert!(booking.updated_at.unwrap() >= before);

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "tok-1");
    assert_eq!(sent[0].kind(), Some("BOOKING_CONFIRMED"));
    assert_eq!(sent[0].booking_id(), Some("b1"));
}

#[tokio::test]
async fn owner_without_token_gets_nothing_but_payment_succeeds() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", None);
    harness.booking("b2", None);

    let caller = caller();
    let with_owner = verify_payment(&harness.state, Some(&caller), verification("b1", "TXN1"))
        .await
        .unwrap();
    let ownerless = verify_payment(&harness.state, Some(&caller), verification("b2", "TXN2"))
        .await
        .unwrap();

    assert!(with_owner.success);
    assert!(ownerless.success);
    assert_eq!(harness.stored("b2").await.status, BookingStatus::Confirmed);
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn second_verification_is_refused_and_not_notified_again() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));
    let caller = caller();

    verify_payment(&harness.state, Some(&caller), verification("b1", "TXN1"))
        .await
        .unwrap();
    let again = verify_payment(&harness.state, Some(&caller), verification("b1", "TXN2"))
        .await
        .unwrap_err();

    assert_eq!(again.kind(), ErrorKind::FailedPrecondition);
    assert_eq!(harness.stored("b1").await.payment_reference.as_deref(), Some("TXN1"));
    assert_eq!(harness.notifier.sent().len(), 1);
}

#[tokio::test]
async fn concurrent_verifications_confirm_once() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));
    let caller = caller();

    let (a, b) = tokio::join!(
        verify_payment(&harness.state, Some(&caller), verification("b1", "TXN-A")),
        verify_payment(&harness.state, Some(&caller), verification("b1", "TXN-B")),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(harness.notifier.sent().len(), 1);
    assert_eq!(harness.store.write_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_verifications_on_worker_threads_confirm_once() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));
    let state = AppState::new(
        Arc::new(YieldingStore(harness.store.clone())),
        harness.state.users.clone(),
        harness.state.notifier.clone(),
        harness.state.verifier.clone(),
    );

    let attempts: Vec<_> = (0..8)
        .map(|n| {
            let state = state.clone();
            tokio::spawn(async move {
                let reference = format!("TXN-{n}");
                verify_payment(&state, Some(&caller()), verification("b1", &reference))
                    .await
                    .map(|_| reference)
            })
        })
        .collect();

    let mut confirmed = Vec::new();
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(reference) => confirmed.push(reference),
            Err(err) => assert_eq!(err.kind(), ErrorKind::FailedPrecondition),
        }
    }

    assert_eq!(confirmed.len(), 1);
    let booking = harness.stored("b1").await;
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_reference.as_deref(), Some(confirmed[0].as_str()));
    assert_eq!(harness.notifier.sent().len(), 1);
    assert_eq!(harness.store.write_count(), 1);
}

#[tokio::test]
async fn rejected_transactions_leave_the_booking_alone() {
    let harness = Harness::with_verifier(Arc::new(RejectAll));
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));

    let err = verify_payment(&harness.state, Some(&caller()), verification("b1", "TXN1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
    assert_eq!(err.to_string(), "Payment verification failed");
    assert_eq!(harness.stored("b1").await.status, BookingStatus::Created);
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn store_outage_is_a_generic_internal_error() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.store.set_available(false);

    let err = verify_payment(&harness.state, Some(&caller()), verification("b1", "TXN1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.to_string(), VERIFY_FAILED);
    assert!(matches!(err.cause(), Some(InternalCause::StoreUnavailable(_))));
}

#[tokio::test]
async fn failed_notification_keeps_the_confirmation() {
    let harness = Harness::new();
    harness.booking("b1", Some("u1"));
    harness.user("u1", Some("tok-1"));
    harness.notifier.set_failing(true);

    let err = verify_payment(&harness.state, Some(&caller()), verification("b1", "TXN1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(matches!(err.cause(), Some(InternalCause::MessagingUnavailable(_))));
    assert_eq!(harness.stored("b1").await.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn created_booking_notifies_its_owner_once() {
    let harness = Harness::new();
    harness.user("u2", Some("tok-2"));

    let booking = harness
        .store
        .insert_booking(NewBooking {
            id: "b-new".into(),
            user_id: Some("u2".into()),
        })
        .await
        .unwrap();
    on_booking_created(&harness.state, BookingCreated::new(booking)).await;

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "tok-2");
    assert_eq!(sent[0].kind(), Some("BOOKING_CREATED"));
    assert_eq!(sent[0].booking_id(), Some("b-new"));

    let stored = harness.stored("b-new").await;
    assert_eq!(stored.status, BookingStatus::Created);
    assert!(stored.payment_reference.is_none());
}

#[tokio::test]
async fn reactor_swallows_failures() {
    let harness = Harness::new();
    harness.user("u2", Some("tok-2"));
    harness.booking("b1", Some("u2"));
    harness.notifier.set_failing(true);
    let booking = harness.stored("b1").await;

    on_booking_created(&harness.state, BookingCreated::new(booking.clone())).await;
    harness.notifier.set_failing(false);
    harness.store.set_available(false);
    on_booking_created(&harness.state, BookingCreated::new(booking)).await;

    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn events_for_unknown_bookings_notify_nobody() {
    let harness = Harness::new();
    harness.user("u2", Some("tok-2"));

    let forged = Booking {
        id: "ghost".into(),
        status: BookingStatus::Created,
        user_id: Some("u2".into()),
        payment_reference: None,
        updated_at: None,
        created_at: None,
    };
    on_booking_created(&harness.state, BookingCreated::new(forged)).await;

    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn reactor_notifies_the_stored_owner_not_the_claimed_one() {
    let harness = Harness::new();
    harness.user("u2", Some("tok-2"));
    harness.user("u9", Some("tok-9"));
    harness.booking("b1", Some("u2"));

    let mut claimed = harness.stored("b1").await;
    claimed.user_id = Some("u9".into());
    on_booking_created(&harness.state, BookingCreated::new(claimed)).await;

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "tok-2");
}

#[tokio::test]
async fn listener_reacts_to_inserts_but_not_confirmations() {
    let harness = Harness::new();
    harness.user("u2", Some("tok-2"));
    harness.booking("b7", Some("u2"));

    // A second store publishing on its own feed; the listener runs against
    // the harness state so that it holds no sender of that feed. The harness
    // store mirrors b7 so the reactor can resolve it.
    let feed = creation_feed();
    let store = InMemoryStore::new(feed.clone());
    store.put_user(User {
        id: "u2".into(),
        fcm_token: Some("tok-2".into()),
    })
    .unwrap();
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        harness.state.notifier.clone(),
        harness.state.verifier.clone(),
    );
    let listener = spawn_booking_created_listener(harness.state.clone(), feed.subscribe());

    store
        .insert_booking(NewBooking {
            id: "b7".into(),
            user_id: Some("u2".into()),
        })
        .await
        .unwrap();
    verify_payment(&state, Some(&caller()), verification("b7", "TXN7"))
        .await
        .unwrap();

    drop(state);
    drop(store);
    drop(feed);
    tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener should stop when the feed closes")
        .unwrap();

    let kinds: Vec<String> = harness
        .notifier
        .sent()
        .iter()
        .filter_map(|n| n.kind().map(str::to_owned))
        .collect();
    assert_eq!(kinds.iter().filter(|k| *k == "BOOKING_CREATED").count(), 1);
    assert_eq!(kinds.iter().filter(|k| *k == "BOOKING_CONFIRMED").count(), 1);
}
