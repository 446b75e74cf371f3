use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};

use crate::auth::{Caller, EventsCredential};
use crate::dtos::{
    BookingEventAck, HealthStatus, InitiatePaymentResult, PaymentRequest, PaymentVerification,
    VerifyPaymentResult,
};
use crate::error::{InternalCause, PaymentError};
use crate::events::BookingCreated;
use crate::handlers::{booking_events, payments};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/payments/initiate", post(initiate_payment))
        .route("/payments/verify", post(verify_payment))
        .route("/events/booking-created", post(booking_created))
        .with_state(state)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

async fn initiate_payment(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<InitiatePaymentResult>, PaymentError> {
    let request = decode(&caller, payload, payments::INITIATE_FAILED)?;
    let result = payments::initiate_payment(&state, caller.identity(), request).await?;
    Ok(Json(result))
}

async fn verify_payment(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<PaymentVerification>, JsonRejection>,
) -> Result<Json<VerifyPaymentResult>, PaymentError> {
    let verification = decode(&caller, payload, payments::VERIFY_FAILED)?;
    let result = payments::verify_payment(&state, caller.identity(), verification).await?;
    Ok(Json(result))
}

/// Creation events pushed by the document platform. Deliveries without the
/// configured platform secret are refused before the body is read. Accepted
/// events are always acknowledged: the reactor handles its own failures.
async fn booking_created(
    State(state): State<AppState>,
    credential: EventsCredential,
    payload: Result<Json<BookingCreated>, JsonRejection>,
) -> Result<Json<BookingEventAck>, Response> {
    if !credential.matches(state.events_token.as_deref()) {
        tracing::warn!("booking event refused: missing or wrong platform credential");
        return Err(PaymentError::Unauthenticated.into_response());
    }
    let Json(event) = payload.map_err(IntoResponse::into_response)?;
    booking_events::on_booking_created(&state, event).await;
    Ok(Json(BookingEventAck { received: true }))
}

/// Unauthenticated callers are told so before their payload is looked at; an
/// undecodable payload from an authenticated caller is an internal error.
fn decode<T>(
    caller: &Caller,
    payload: Result<Json<T>, JsonRejection>,
    message: &'static str,
) -> Result<T, PaymentError> {
    if caller.identity().is_none() {
        return Err(PaymentError::Unauthenticated);
    }
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            PaymentError::internal(InternalCause::MalformedInput(rejection.body_text()))
                .at_boundary(message)
        })
}
