//! Test doubles for the messaging and verification seams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::messaging::{NotificationDispatcher, PushNotification};
use crate::verification::{Decision, PaymentVerifier};

/// Keeps every notification it accepts. Can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<PushNotification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<PushNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, notification: PushNotification) -> Result<(), DispatchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DispatchError::Unavailable("recording dispatcher is failing".into()));
        }
        self.sent
            .lock()
            .map_err(|_| DispatchError::Unavailable("recording dispatcher poisoned".into()))?
            .push(notification);
        Ok(())
    }
}

/// Rejects every transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

#[async_trait]
impl PaymentVerifier for RejectAll {
    async fn decide(&self, _transaction_id: &str) -> Decision {
        Decision::Rejected
    }
}
