use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DeliveryError, Observer, State};

const CHANNEL: &str = "slack";

/// Observer that posts status changes to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self::with_client(webhook_url, client)
    }

    pub fn with_client(webhook_url: impl Into<String>, client: Client) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    fn format_message(state: &State) -> String {
        format!(
            "*{}* is now *{}*\n{}\nat {}",
            state.name,
            state.status,
            state.message,
            state.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

#[async_trait]
impl Observer for SlackNotifier {
    async fn notify(&self, state: &State) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({ "text": Self::format_message(state) });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Network {
                channel: CHANNEL.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                channel: CHANNEL.into(),
                status: status.as_u16(),
            });
        }

        debug!(status = status.as_u16(), "Slack notification delivered");
        Ok(())
    }
}
