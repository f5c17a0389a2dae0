use async_trait::async_trait;
use chat_core::Config;
use reqwest::{Client, Proxy};

use crate::error::{RelayError, Result};
use crate::request::ChatPayload;
use crate::wire::{decode_response, DeltaStream};

/// Opens one upstream chat request and yields its text deltas.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fails with [`RelayError::Transport`] on a non-success status and with
    /// [`RelayError::Configuration`] when no endpoint is set.
    async fn open(&self, payload: &ChatPayload) -> Result<DeltaStream>;
}

/// POSTs the payload as JSON to a single configured endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Build from configuration, honoring the proxy settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(config.api_base.clone())
            .with_api_key(config.api_key.clone())
            .with_client(client))
    }
}

fn build_http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder();
    if !config.http_proxy.is_empty() {
        builder = builder.proxy(Proxy::http(&config.http_proxy)?);
    }
    if !config.https_proxy.is_empty() {
        builder = builder.proxy(Proxy::https(&config.https_proxy)?);
    }
    Ok(builder.build()?)
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, payload: &ChatPayload) -> Result<DeltaStream> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            RelayError::Configuration("no upstream endpoint configured (set API_BASE)".to_string())
        })?;

        log::debug!(
            "POST {} model={} messages={} max_tokens={:?}",
            endpoint,
            payload.model,
            payload.messages.len(),
            payload.max_tokens
        );

        let mut request = self.client.post(endpoint).json(payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log::warn!("Upstream returned {}", status);
            return Err(RelayError::transport(status.as_u16(), &text));
        }

        Ok(decode_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::ChatMessage;

    #[tokio::test]
    async fn missing_endpoint_is_a_configuration_error() {
        let transport = HttpTransport::new(Some("  ".to_string()));
        let payload = ChatPayload::new("m", &[ChatMessage::user("hi")]);
        match transport.open(&payload).await {
            Err(RelayError::Configuration(msg)) => assert!(msg.contains("endpoint")),
            Err(other) => panic!("expected configuration error, got {other:?}"),
            Ok(_) => panic!("expected configuration error, got a stream"),
        }
    }

    #[test]
    fn invalid_proxy_is_rejected() {
        let mut config = Config::default();
        config.https_proxy = "::not a url::".to_string();
        assert!(HttpTransport::from_config(&config).is_err());
    }
}
