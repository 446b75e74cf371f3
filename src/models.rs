use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Lifecycle state of a booking.
///
/// Only `created` and `confirmed` are read or written by the payment
/// handlers. Any other stored value is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Created,
    Confirmed,
    Other(String),
}

impl BookingStatus {
    pub const CREATED: &'static str = "created";
    pub const CONFIRMED: &'static str = "confirmed";

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Created => Self::CREATED,
            BookingStatus::Confirmed => Self::CONFIRMED,
            BookingStatus::Other(status) => status,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            Self::CREATED => BookingStatus::Created,
            Self::CONFIRMED => BookingStatus::Confirmed,
            _ => BookingStatus::Other(status),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Other(status) => status,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Data needed to create a booking document. New bookings always start out
/// as `created`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub fcm_token: Option<String>,
}

impl User {
    /// The device token, if one is registered and non-empty.
    pub fn push_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookingRow {
    pub id: String,
    pub status: String,
    pub user_id: Option<String>,
    pub payment_reference: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBookingRow {
    pub id: String,
    pub status: String,
    pub user_id: Option<String>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: String,
    pub fcm_token: Option<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let updated_at = row
            .updated_at
            .as_deref()
            .map(|raw| parse_timestamp(&row.id, raw))
            .transpose()?;
        let created_at = parse_timestamp(&row.id, &row.created_at)?;
        Ok(Booking {
            status: row.status.into(),
            user_id: row.user_id,
            payment_reference: row.payment_reference,
            updated_at,
            created_at: Some(created_at),
            id: row.id,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            fcm_token: row.fcm_token,
        }
    }
}

fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt {
            id: id.to_owned(),
            reason: format!("bad timestamp {raw:?}: {err}"),
        })
}
