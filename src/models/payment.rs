use serde::{Deserialize, Serialize};

/// State of a gateway order. Orders are `created` when handed to the
/// gateway and flip to `completed` once the signature checks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Created,
    Completed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Created => "created",
            PaymentState::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(PaymentState::Created),
            "completed" => Some(PaymentState::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: String,
    pub booking_id: Option<i64>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentState,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub gateway: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}
