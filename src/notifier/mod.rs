//! Outgoing messages.

pub mod discord;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::Result;
use crate::domain::Component;

pub use discord::DiscordWebhook;

/// Discord flag marking a message as Components V2.
pub const IS_COMPONENTS_V2: u32 = 1 << 15;

/// One webhook execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookMessage {
    pub content: Option<String>,
    pub username: Option<String>,
    pub components: Vec<Component>,
}

impl WebhookMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn components(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Default::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    /// Request body for the webhook execute endpoint.
    pub fn to_json(&self) -> Value {
        let mut body = json!({});
        if let Some(content) = &self.content {
            body["content"] = json!(content);
        }
        if let Some(username) = &self.username {
            body["username"] = json!(username);
        }
        if self.has_components() {
            body["components"] = Value::Array(self.components.iter().map(Component::to_json).collect());
            body["flags"] = json!(IS_COMPONENTS_V2);
        }
        body
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `destination`. An empty destination disables
    /// delivery and succeeds without doing anything.
    async fn send(&self, destination: &str, message: &WebhookMessage) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::ScraperError;
    use crate::domain::Container;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, WebhookMessage)>>,
        pub fail: AtomicBool,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<(String, WebhookMessage)> {
            self.sent.lock().unwrap().clone()
        }

        /// Messages that carried components, i.e. delivered posts.
        pub fn posts(&self) -> Vec<(String, WebhookMessage)> {
            self.sent()
                .into_iter()
                .filter(|(_, m)| m.has_components())
                .collect()
        }

        pub fn reports(&self) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter_map(|(_, m)| m.content)
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, destination: &str, message: &WebhookMessage) -> Result<()> {
            if destination.is_empty() {
                return Ok(());
            }
            if self.fail.load(Ordering::SeqCst) && message.has_components() {
                return Err(ScraperError::Webhook {
                    status: 500,
                    body: "upstream down".into(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), message.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_message_json_with_components() {
        let message = WebhookMessage::components(vec![
            Component::text("<@&42>"),
            Component::Container(Container::new().text("hello")),
        ])
        .username("FINKI");

        let body = message.to_json();
        assert_eq!(body["flags"], 32768);
        assert_eq!(body["username"], "FINKI");
        assert_eq!(body["components"][0]["content"], "<@&42>");
        assert_eq!(body["components"][1]["type"], 17);
        assert!(body.get("content").is_none());
    }

    #[test]
    fn test_text_message_json() {
        let body = WebhookMessage::text("❌ Error").to_json();
        assert_eq!(body["content"], "❌ Error");
        assert!(body.get("flags").is_none());
        assert!(body.get("components").is_none());
    }
}
