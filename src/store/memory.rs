use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{BookingStore, ConfirmOutcome, UserStore};
use crate::error::StoreError;
use crate::events::{BookingCreated, CreationFeed};
use crate::models::{Booking, BookingStatus, NewBooking, User};

/// Store backed by process memory.
///
/// Clones share the same documents. Can be switched offline to simulate an
/// unreachable store, and counts the writes it accepted.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    bookings: Arc<Mutex<HashMap<String, Booking>>>,
    users: Arc<Mutex<HashMap<String, User>>>,
    feed: CreationFeed,
    available: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new(feed: CreationFeed) -> Self {
        Self {
            bookings: Arc::new(Mutex::new(HashMap::new())),
            users: Arc::new(Mutex::new(HashMap::new())),
            feed,
            available: Arc::new(AtomicBool::new(true)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stores a user document as-is.
    pub fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Unavailable("user map poisoned".into()))?
            .insert(user.id.clone(), user);
        Ok(())
    }

    /// Stores a booking document as-is, without publishing a creation event.
    pub fn put_booking(&self, booking: Booking) -> Result<(), StoreError> {
        self.bookings
            .lock()
            .map_err(|_| StoreError::Unavailable("booking map poisoned".into()))?
            .insert(booking.id.clone(), booking);
        Ok(())
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of booking writes accepted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn bookings(&self) -> Result<MutexGuard<'_, HashMap<String, Booking>>, StoreError> {
        self.ensure_available()?;
        self.bookings
            .lock()
            .map_err(|_| StoreError::Unavailable("booking map poisoned".into()))
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".into()))
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings()?.get(id).cloned())
    }

    async fn confirm_booking(
        &self,
        id: &str,
        payment_reference: &str,
    ) -> Result<ConfirmOutcome, StoreError> {
        let mut bookings = self.bookings()?;
        let Some(booking) = bookings.get_mut(id) else {
            return Ok(ConfirmOutcome::Missing);
        };
        if booking.status != BookingStatus::Created {
            return Ok(ConfirmOutcome::NotAwaitingPayment(booking.status.clone()));
        }

        booking.status = BookingStatus::Confirmed;
        booking.payment_reference = Some(payment_reference.to_owned());
        booking.updated_at = Some(Utc::now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(ConfirmOutcome::Confirmed)
    }

    async fn insert_booking(&self, new: NewBooking) -> Result<Booking, StoreError> {
        let booking = {
            let mut bookings = self.bookings()?;
            if bookings.contains_key(&new.id) {
                return Err(StoreError::AlreadyExists(new.id));
            }
            let booking = Booking {
                id: new.id,
                status: BookingStatus::Created,
                user_id: new.user_id,
                payment_reference: None,
                updated_at: None,
                created_at: Some(Utc::now()),
            };
            bookings.insert(booking.id.clone(), booking.clone());
            booking
        };
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.feed.send(BookingCreated::new(booking.clone())).is_err() {
            tracing::debug!(booking_id = %booking.id, "no booking-created listeners");
        }
        Ok(booking)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.ensure_available()?;
        let users = self
            .users
            .lock()
            .map_err(|_| StoreError::Unavailable("user map poisoned".into()))?;
        Ok(users.get(id).cloned())
    }
}
