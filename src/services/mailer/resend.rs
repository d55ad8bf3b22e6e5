use anyhow::Context;
use async_trait::async_trait;

use super::{EmailProvider, OutgoingEmail};

const SEND_URL: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
        });

        self.client
            .post(SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach Resend")?
            .error_for_status()
            .context("Resend API returned error")?;

        Ok(())
    }
}
