//! Caller identity.
//!
//! Authentication happens upstream: the identity provider verifies the
//! caller's credentials and forwards the resulting uid in a header. The
//! handlers only distinguish "some caller" from "no caller".

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const CALLER_UID_HEADER: &str = "x-caller-uid";
pub const EVENTS_TOKEN_HEADER: &str = "x-events-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
}

impl CallerIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// Extracts the forwarded caller identity, if any. Never rejects: a missing
/// identity is the handler's decision to make.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<CallerIdentity>);

impl Caller {
    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(CALLER_UID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(CallerIdentity::new);
        Ok(Caller(identity))
    }
}

/// The shared secret presented by the document platform on event delivery,
/// if any. Matching it against the configured secret is up to the route.
#[derive(Debug, Clone, Default)]
pub struct EventsCredential(pub Option<String>);

impl EventsCredential {
    /// True only when a secret is configured and the presented one equals it.
    pub fn matches(&self, expected: Option<&str>) -> bool {
        match (self.0.as_deref(), expected) {
            (Some(presented), Some(expected)) => presented == expected,
            _ => false,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for EventsCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(EVENTS_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned);
        Ok(EventsCredential(token))
    }
}
