//! Transaction and ticket references handed out by payment initiation.
//!
//! A reference is a millisecond timestamp followed by a bounded random
//! suffix. Two references issued in the same millisecond collide with
//! probability 1 / `SUFFIX_BOUND`; nothing checks for it.

use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_BOUND: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReferences {
    pub transaction_id: String,
    pub ticket_number: String,
}

pub fn issue<R>(now: DateTime<Utc>, rng: &mut R) -> PaymentReferences
where
    R: Rng + ?Sized,
{
    let millis = now.timestamp_millis();
    PaymentReferences {
        transaction_id: format!("TXN{millis}{:06}", rng.gen_range(0..SUFFIX_BOUND)),
        ticket_number: format!("TKT{millis}{:06}", rng.gen_range(0..SUFFIX_BOUND)),
    }
}
