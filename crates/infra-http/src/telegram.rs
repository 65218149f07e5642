// Telegram bot notifier
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use watchdog_core::port::Notifier;

use crate::error::HttpAdapterError;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Bot token and destination chat
#[derive(Clone)]
pub struct BotCredentials {
    pub chat_id: String,
    pub token: String,
}

impl BotCredentials {
    /// Read credentials from two environment variables
    ///
    /// Returns None if either is unset or empty.
    pub fn from_env(chat_id_var: &str, token_var: &str) -> Option<Self> {
        let chat_id = std::env::var(chat_id_var).ok().filter(|v| !v.is_empty())?;
        let token = std::env::var(token_var).ok().filter(|v| !v.is_empty())?;
        Some(Self { chat_id, token })
    }
}

// The token is a secret: keep it out of logs
impl std::fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotCredentials")
            .field("chat_id", &self.chat_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fire-and-forget sender for the Telegram `sendMessage` method
///
/// Without credentials every `send` is a no-op. Delivery failures are
/// logged and dropped.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    credentials: Option<BotCredentials>,
}

impl TelegramNotifier {
    pub fn new(
        credentials: Option<BotCredentials>,
        timeout: Duration,
    ) -> Result<Self, HttpAdapterError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            credentials,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) {
        let Some(credentials) = &self.credentials else {
            debug!("Notifications disabled, dropping message");
            return;
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, credentials.token);
        let result = self
            .client
            .get(&url)
            .query(&[("chat_id", credentials.chat_id.as_str()), ("text", message)])
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => debug!("Notification sent"),
            Err(e) => warn!(error = %e.without_url(), "Notification not delivered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Inbox = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn send_message(
        State(inbox): State<Inbox>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        inbox.lock().unwrap().push(params);
        Json(json!({ "ok": true }))
    }

    async fn fake_bot_api() -> (String, Inbox) {
        let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/botTEST-TOKEN/sendMessage", get(send_message))
            .with_state(inbox.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}", addr), inbox)
    }

    fn credentials() -> BotCredentials {
        BotCredentials {
            chat_id: "4242".to_string(),
            token: "TEST-TOKEN".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let (api_base, inbox) = fake_bot_api().await;
        let notifier = TelegramNotifier::new(Some(credentials()), Duration::from_secs(2))
            .unwrap()
            .with_api_base(api_base);

        notifier.send("Current experiment progress [3/9] & more").await;

        let received = inbox.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["chat_id"], "4242");
        assert_eq!(received[0]["text"], "Current experiment progress [3/9] & more");
    }

    #[tokio::test]
    async fn test_disabled_without_credentials() {
        let (api_base, inbox) = fake_bot_api().await;
        let notifier = TelegramNotifier::new(None, Duration::from_secs(2))
            .unwrap()
            .with_api_base(api_base);

        assert!(!notifier.is_enabled());
        notifier.send("dropped").await;
        assert!(inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_propagate() {
        let notifier = TelegramNotifier::new(Some(credentials()), Duration::from_millis(500))
            .unwrap()
            .with_api_base("http://127.0.0.1:9");

        // Returns normally even though nothing listens there
        notifier.send("lost").await;
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("4242"));
        assert!(!rendered.contains("TEST-TOKEN"));
    }

    #[test]
    fn test_credentials_from_missing_env() {
        assert!(BotCredentials::from_env(
            "WATCHDOG_TEST_UNSET_CHAT_ID",
            "WATCHDOG_TEST_UNSET_TOKEN"
        )
        .is_none());
    }
}
