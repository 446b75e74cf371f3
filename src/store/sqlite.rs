use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::{BookingStore, ConfirmOutcome, UserStore};
use crate::config::Config;
use crate::error::StoreError;
use crate::events::{BookingCreated, CreationFeed};
use crate::models::{Booking, BookingRow, BookingStatus, NewBooking, NewBookingRow, User, UserRow};
use crate::schema::{bookings, users};

// this embeds the migrations into the application binary
// the migration path is relative to the `CARGO_MANIFEST_DIR`
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

/// Current time as SQLite renders it, RFC 3339 with milliseconds. Writes are
/// stamped by the database clock, not the process clock.
const SQL_NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Booking and user documents kept in SQLite, pooled with deadpool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: deadpool_diesel::sqlite::Pool,
    feed: CreationFeed,
}

impl SqliteStore {
    /// Builds the pool and brings the schema up to date.
    pub async fn connect(config: &Config, feed: CreationFeed) -> Result<Self, StoreError> {
        let manager = deadpool_diesel::sqlite::Manager::new(
            config.database_url.clone(),
            deadpool_diesel::Runtime::Tokio1,
        );
        let pool = deadpool_diesel::sqlite::Pool::builder(manager)
            .max_size(config.db_pool_size)
            .build()
            .map_err(unavailable)?;

        let store = Self { pool, feed };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await.map_err(unavailable)?;
        conn.interact(|conn| conn.run_pending_migrations(MIGRATIONS).map(|_| ()))
            .await
            .map_err(unavailable)?
            .map_err(unavailable)
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let conn = self.pool.get().await.map_err(unavailable)?;
        let id = id.to_owned();
        let row = conn
            .interact(move |conn| {
                bookings::table
                    .find(id)
                    .select(BookingRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(unavailable)?
            .map_err(unavailable)?;
        row.map(Booking::try_from).transpose()
    }

    async fn confirm_booking(
        &self,
        id: &str,
        payment_reference: &str,
    ) -> Result<ConfirmOutcome, StoreError> {
        let conn = self.pool.get().await.map_err(unavailable)?;
        let id = id.to_owned();
        let reference = payment_reference.to_owned();
        let outcome = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let updated = diesel::update(
                        bookings::table
                            .filter(bookings::id.eq(&id))
                            .filter(bookings::status.eq(BookingStatus::CREATED)),
                    )
                    .set((
                        bookings::status.eq(BookingStatus::CONFIRMED),
                        bookings::payment_reference.eq(&reference),
                        bookings::updated_at.eq(sql::<Nullable<Text>>(SQL_NOW)),
                    ))
                    .execute(conn)?;
                    if updated == 1 {
                        return Ok(ConfirmOutcome::Confirmed);
                    }

                    let status: Option<String> = bookings::table
                        .find(&id)
                        .select(bookings::status)
                        .first(conn)
                        .optional()?;
                    Ok(match status {
                        Some(status) => ConfirmOutcome::NotAwaitingPayment(status.into()),
                        None => ConfirmOutcome::Missing,
                    })
                })
            })
            .await
            .map_err(unavailable)?
            .map_err(unavailable)?;
        Ok(outcome)
    }

    async fn insert_booking(&self, new: NewBooking) -> Result<Booking, StoreError> {
        let conn = self.pool.get().await.map_err(unavailable)?;
        let booking_id = new.id.clone();
        let row = NewBookingRow {
            id: new.id,
            status: BookingStatus::CREATED.to_owned(),
            user_id: new.user_id,
        };
        let inserted = conn
            .interact(|conn| {
                diesel::insert_into(bookings::table)
                    .values(row)
                    .returning(BookingRow::as_returning())
                    .get_result(conn)
            })
            .await
            .map_err(unavailable)?
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => StoreError::AlreadyExists(booking_id),
                other => unavailable(other),
            })?;

        let booking = Booking::try_from(inserted)?;
        if self.feed.send(BookingCreated::new(booking.clone())).is_err() {
            tracing::debug!(booking_id = %booking.id, "no booking-created listeners");
        }
        Ok(booking)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get().await.map_err(unavailable)?;
        let id = id.to_owned();
        let row = conn
            .interact(move |conn| {
                users::table
                    .find(id)
                    .select(UserRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(unavailable)?
            .map_err(unavailable)?;
        Ok(row.map(User::from))
    }
}

/// Utility function for mapping any pool, driver or query error into
/// `StoreError::Unavailable`.
fn unavailable<E>(err: E) -> StoreError
where
    E: std::fmt::Display,
{
    StoreError::Unavailable(err.to_string())
}
