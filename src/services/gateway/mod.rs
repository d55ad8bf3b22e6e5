pub mod razorpay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order as echoed back by the gateway. Clients need the id and amount to
/// open the checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens an order for `amount_paise` and returns the gateway's handle
    /// for it. `notes` travel with the order for later reconciliation.
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        notes: serde_json::Value,
    ) -> anyhow::Result<GatewayOrder>;
}
