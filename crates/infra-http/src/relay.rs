// Power relay over HTTP/JSON
//
// GET /settings            -> {"name": "...", ...}
// GET /relay/0[?turn=on]   -> {"ison": true, ...}
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use watchdog_core::port::RelayApi;

use crate::error::HttpAdapterError;

#[derive(Debug, Deserialize)]
struct SettingsResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    ison: bool,
}

/// Relay client; every request is bounded by the client timeout
pub struct HttpRelayApi {
    client: reqwest::Client,
    base_url: String,
    channel: u8,
}

impl HttpRelayApi {
    /// Create a relay client
    ///
    /// # Arguments
    /// * `base_url` - e.g. `http://10.30.3.203`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpAdapterError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpAdapterError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            channel: 0,
        })
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HttpAdapterError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RelayApi for HttpRelayApi {
    async fn device_name(&self) -> Option<String> {
        match self.get_json::<SettingsResponse>("/settings", &[]).await {
            Ok(settings) => {
                debug!(name = ?settings.name, "Relay settings read");
                settings.name
            }
            Err(e) => {
                warn!(error = %e, "Could not read relay settings");
                None
            }
        }
    }

    async fn switch(&self, turn: Option<bool>) -> Option<bool> {
        let path = format!("/relay/{}", self.channel);
        let query: &[(&str, &str)] = match turn {
            Some(true) => &[("turn", "on")],
            Some(false) => &[("turn", "off")],
            None => &[],
        };
        match self.get_json::<RelayResponse>(&path, query).await {
            Ok(status) => {
                debug!(turn = ?turn, ison = status.ison, "Relay answered");
                Some(status.ison)
            }
            Err(e) => {
                warn!(turn = ?turn, error = %e, "Relay request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FakeRelay {
        name: String,
        is_on: Mutex<bool>,
    }

    async fn settings(State(relay): State<Arc<FakeRelay>>) -> Json<Value> {
        Json(json!({ "name": relay.name, "device": { "type": "SHSW-1" } }))
    }

    async fn relay0(
        State(relay): State<Arc<FakeRelay>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let mut is_on = relay.is_on.lock().unwrap();
        match params.get("turn").map(String::as_str) {
            Some("on") => *is_on = true,
            Some("off") => *is_on = false,
            _ => {}
        }
        Json(json!({ "ison": *is_on, "has_timer": false }))
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn fake_relay(name: &str, is_on: bool) -> (String, Arc<FakeRelay>) {
        let relay = Arc::new(FakeRelay {
            name: name.to_string(),
            is_on: Mutex::new(is_on),
        });
        let router = Router::new()
            .route("/settings", get(settings))
            .route("/relay/0", get(relay0))
            .with_state(relay.clone());
        (serve(router).await, relay)
    }

    fn client(base_url: &str) -> HttpRelayApi {
        HttpRelayApi::new(base_url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_identity_and_switching() {
        let (url, relay) = fake_relay("Zarquon", false).await;
        let api = client(&url);

        assert_eq!(api.device_name().await.as_deref(), Some("Zarquon"));
        assert_eq!(api.switch(None).await, Some(false));
        assert_eq!(api.switch(Some(true)).await, Some(true));
        assert!(*relay.is_on.lock().unwrap());
        assert_eq!(api.switch(Some(false)).await, Some(false));
        assert!(!*relay.is_on.lock().unwrap());
    }

    #[tokio::test]
    async fn test_server_error_is_unknown() {
        let router = Router::new()
            .route("/settings", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/relay/0", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let api = client(&serve(router).await);

        assert_eq!(api.device_name().await, None);
        assert_eq!(api.switch(Some(true)).await, None);
    }

    #[tokio::test]
    async fn test_malformed_json_is_unknown() {
        let router = Router::new()
            .route("/settings", get(|| async { "not json" }))
            .route("/relay/0", get(|| async { Json(json!({ "power": 3.5 })) }));
        let api = client(&serve(router).await);

        assert_eq!(api.device_name().await, None);
        assert_eq!(api.switch(None).await, None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unknown() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr));
        assert_eq!(api.device_name().await, None);
        assert_eq!(api.switch(Some(false)).await, None);
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let result = HttpRelayApi::new("10.30.3.203", Duration::from_secs(1));
        assert!(matches!(result, Err(HttpAdapterError::InvalidUrl(_))));
    }
}
