use anyhow::Context;
use async_trait::async_trait;

use super::{GatewayOrder, PaymentGateway};

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        notes: serde_json::Value,
    ) -> anyhow::Result<GatewayOrder> {
        let body = serde_json::json!({
            "amount": amount_paise,
            "currency": currency,
            "receipt": receipt,
            "notes": notes,
        });

        let order: GatewayOrder = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .context("failed to reach Razorpay")?
            .error_for_status()
            .context("Razorpay API returned error")?
            .json()
            .await
            .context("failed to decode Razorpay order")?;

        Ok(order)
    }
}
