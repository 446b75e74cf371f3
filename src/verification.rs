//! Payment verification strategy.
//!
//! The verifier handler asks a `PaymentVerifier` whether a transaction went
//! through. A gateway-backed implementation slots in here without touching
//! the handler.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Rejected,
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn decide(&self, transaction_id: &str) -> Decision;
}

/// Accepts every transaction. Stand-in while no gateway is integrated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl PaymentVerifier for AlwaysConfirm {
    async fn decide(&self, transaction_id: &str) -> Decision {
        tracing::debug!(%transaction_id, "simulated verification");
        Decision::Confirmed
    }
}
