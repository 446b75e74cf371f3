//! Payment initiation and verification.
//!
//! Both handlers require an authenticated caller and an existing booking.
//! Initiation only reads; verification moves the booking from `created` to
//! `confirmed` and notifies its owner.

use chrono::Utc;

use super::notify_owner;
use crate::auth::CallerIdentity;
use crate::dtos::{InitiatePaymentResult, PaymentRequest, PaymentVerification, VerifyPaymentResult};
use crate::error::PaymentError;
use crate::messaging::PushNotification;
use crate::references;
use crate::state::AppState;
use crate::store::ConfirmOutcome;
use crate::verification::Decision;

pub const INITIATE_FAILED: &str = "An error occurred while processing the payment";
pub const VERIFY_FAILED: &str = "An error occurred while verifying the payment";

pub async fn initiate_payment(
    state: &AppState,
    caller: Option<&CallerIdentity>,
    request: PaymentRequest,
) -> Result<InitiatePaymentResult, PaymentError> {
    let caller = caller.ok_or(PaymentError::Unauthenticated)?;
    issue_payment(state, caller, request)
        .await
        .map_err(|err| err.at_boundary(INITIATE_FAILED))
}

async fn issue_payment(
    state: &AppState,
    caller: &CallerIdentity,
    request: PaymentRequest,
) -> Result<InitiatePaymentResult, PaymentError> {
    if state.bookings.get_booking(&request.booking_id).await?.is_none() {
        return Err(PaymentError::NotFound);
    }

    // The payment provider is simulated: references are issued locally and
    // the payment is reported as pending confirmation.
    let refs = references::issue(Utc::now(), &mut rand::thread_rng());
    tracing::info!(
        booking_id = %request.booking_id,
        caller = %caller.uid,
        method = %request.method,
        amount = request.amount,
        transaction_id = %refs.transaction_id,
        "payment initiated"
    );

    Ok(InitiatePaymentResult {
        success: true,
        transaction_id: refs.transaction_id,
        ticket_number: refs.ticket_number,
        message: format!("A confirmation message has been sent to {}", request.phone_number),
    })
}

pub async fn verify_payment(
    state: &AppState,
    caller: Option<&CallerIdentity>,
    verification: PaymentVerification,
) -> Result<VerifyPaymentResult, PaymentError> {
    let caller = caller.ok_or(PaymentError::Unauthenticated)?;
    confirm_payment(state, caller, verification)
        .await
        .map_err(|err| err.at_boundary(VERIFY_FAILED))
}

async fn confirm_payment(
    state: &AppState,
    caller: &CallerIdentity,
    verification: PaymentVerification,
) -> Result<VerifyPaymentResult, PaymentError> {
    let PaymentVerification {
        booking_id,
        transaction_id,
    } = verification;

    if state.bookings.get_booking(&booking_id).await?.is_none() {
        return Err(PaymentError::NotFound);
    }

    if state.verifier.decide(&transaction_id).await == Decision::Rejected {
        tracing::info!(%booking_id, %transaction_id, "payment rejected by verifier");
        return Err(PaymentError::FailedPrecondition(
            "Payment verification failed".to_owned(),
        ));
    }

    match state
        .bookings
        .confirm_booking(&booking_id, &transaction_id)
        .await?
    {
        ConfirmOutcome::Confirmed => {}
        ConfirmOutcome::NotAwaitingPayment(status) => {
            tracing::warn!(%booking_id, %status, "booking is not awaiting payment");
            return Err(PaymentError::FailedPrecondition(
                "Booking is not awaiting payment".to_owned(),
            ));
        }
        // deleted between the existence check and the update
        ConfirmOutcome::Missing => return Err(PaymentError::NotFound),
    }
    tracing::info!(%booking_id, caller = %caller.uid, %transaction_id, "booking confirmed");

    // The confirmation stands even if notifying the owner fails below.
    let booking = state
        .bookings
        .get_booking(&booking_id)
        .await?
        .ok_or(PaymentError::NotFound)?;
    let notified = notify_owner(state, booking.user_id.as_deref(), |token| {
        PushNotification::booking_confirmed(token, &booking_id)
    })
    .await
    .map_err(PaymentError::internal)?;
    tracing::debug!(%booking_id, notified, "confirmation notification");

    Ok(VerifyPaymentResult {
        success: true,
        message: "Payment verified successfully".to_owned(),
    })
}
