use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::app::{Result, ScraperError};
use crate::fetcher::http_fetcher::USER_AGENT;
use crate::notifier::{Notifier, WebhookMessage};

/// Executes Discord webhooks.
pub struct DiscordWebhook {
    client: Client,
}

impl DiscordWebhook {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Endpoint to post to; component messages need `with_components=true`.
    fn endpoint(destination: &str, message: &WebhookMessage) -> Result<Url> {
        let mut url = Url::parse(destination).map_err(|e| {
            ScraperError::Config(format!("invalid webhook URL {}: {}", redact(destination), e))
        })?;
        if message.has_components() {
            url.query_pairs_mut().append_pair("with_components", "true");
        }
        Ok(url)
    }
}

/// Webhook URL with its secret token removed, for logs and errors.
pub fn redact(destination: &str) -> String {
    match destination.rsplit_once('/') {
        Some((prefix, token)) if !token.is_empty() => format!("{}/***", prefix),
        _ => destination.to_string(),
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, destination: &str, message: &WebhookMessage) -> Result<()> {
        if destination.is_empty() {
            return Ok(());
        }

        let url = Self::endpoint(destination, message)?;
        let response = self
            .client
            .post(url)
            .json(&message.to_json())
            .send()
            .await
            .map_err(|e| ScraperError::Network {
                url: redact(destination),
                source: Box::new(e.without_url()),
            })?;

        let status = response.status();
        debug!(webhook = %redact(destination), status = status.as_u16(), "Executed webhook");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::Webhook {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
