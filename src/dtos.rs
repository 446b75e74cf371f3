#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub booking_id: String,
    /// Passed through, never validated.
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub booking_id: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResult {
    pub success: bool,
    pub transaction_id: String,
    pub ticket_number: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VerifyPaymentResult {
    pub success: bool,
    pub message: String,
}

#[derive(serde::Serialize)]
pub struct BookingEventAck {
    pub received: bool,
}

#[derive(serde::Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}
