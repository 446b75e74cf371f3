//! Booking and user document stores.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Booking, BookingStatus, NewBooking, User};

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Result of a conditional confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The booking moved from `created` to `confirmed`.
    Confirmed,
    /// The booking exists but is not `created`; nothing was written.
    NotAwaitingPayment(BookingStatus),
    Missing,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError>;

    /// Sets status to `confirmed`, records the payment reference and stamps
    /// `updated_at` with the store's clock, only if the booking is currently
    /// `created`. The check and the write are atomic.
    async fn confirm_booking(
        &self,
        id: &str,
        payment_reference: &str,
    ) -> Result<ConfirmOutcome, StoreError>;

    /// Creates a booking in the `created` state and publishes a
    /// `BookingCreated` event for it.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
}
