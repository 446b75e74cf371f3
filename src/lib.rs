//! Booking payment handlers: mock payment initiation, payment verification
//! that confirms a booking, and push notifications on booking creation and
//! confirmation.

pub mod auth;
pub mod config;
pub mod dtos;
pub mod error;
pub mod events;
pub mod handlers;
pub mod messaging;
pub mod mocks;
pub mod models;
pub mod references;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;
pub mod verification;
