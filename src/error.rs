//! Error taxonomy for the payment handlers.
//!
//! Callers only ever see four kinds of failure. Internal failures keep their
//! classification for the logs but are answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure talking to the booking or user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt document {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("document {0} already exists")]
    AlreadyExists(String),
}

/// Failure handing a notification to the push service.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("messaging unavailable: {0}")]
    Unavailable(String),
    #[error("push rejected: {0}")]
    Rejected(String),
}

/// Classification of an internal failure. Logged, never shown to callers.
#[derive(Debug, Error)]
pub enum InternalCause {
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error("messaging unavailable")]
    MessagingUnavailable(#[source] DispatchError),
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl From<StoreError> for InternalCause {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt { .. } | StoreError::AlreadyExists(_) => {
                InternalCause::MalformedInput(err.to_string())
            }
            StoreError::Unavailable(_) => InternalCause::StoreUnavailable(err),
        }
    }
}

impl From<DispatchError> for InternalCause {
    fn from(err: DispatchError) -> Self {
        InternalCause::MessagingUnavailable(err)
    }
}

/// Caller-visible error kind, serialized the way clients switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    FailedPrecondition,
    Internal,
}

const DEFAULT_INTERNAL_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("The function must be called while authenticated.")]
    Unauthenticated,
    #[error("Booking not found")]
    NotFound,
    #[error("{0}")]
    FailedPrecondition(String),
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        cause: InternalCause,
    },
}

impl PaymentError {
    pub fn internal(cause: impl Into<InternalCause>) -> Self {
        PaymentError::Internal {
            message: DEFAULT_INTERNAL_MESSAGE,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Unauthenticated => ErrorKind::Unauthenticated,
            PaymentError::NotFound => ErrorKind::NotFound,
            PaymentError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            PaymentError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The internal classification, if this is an internal error.
    pub fn cause(&self) -> Option<&InternalCause> {
        match self {
            PaymentError::Internal { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Applied once at a handler's outer boundary: logs internal failures and
    /// swaps in the handler's generic message.
    pub(crate) fn at_boundary(self, message: &'static str) -> Self {
        match self {
            PaymentError::Internal { cause, .. } => {
                tracing::error!(error = %cause, detail = ?cause, "{message}");
                PaymentError::Internal { message, cause }
            }
            other => other,
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> Self {
        PaymentError::internal(err)
    }
}

impl From<DispatchError> for PaymentError {
    fn from(err: DispatchError) -> Self {
        PaymentError::internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
