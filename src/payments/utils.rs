use crate::payments::error::{PaymentError, PaymentResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::warn;

/// Thin JSON client for provider calls. No retries: each call is sent once and
/// the provider's status and body are handed back unchanged on failure.
#[derive(Clone)]
pub struct PaymentHttpClient {
    client: Client,
    timeout: Duration,
    provider: &'static str,
}

impl PaymentHttpClient {
    pub fn new(provider: &'static str, timeout: Duration) -> PaymentResult<Self> {
        let client =
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| PaymentError::NetworkError {
                    message: format!("failed to initialize HTTP client: {}", e),
                })?;

        Ok(Self {
            client,
            timeout,
            provider,
        })
    }

    /// POST `body` as JSON and decode the success body into `T`.
    ///
    /// A success body that is not valid JSON for `T` decodes as `T::default()`.
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> PaymentResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let mut request = self.client.post(url).timeout(self.timeout).json(body);
        for (k, v) in headers {
            request = request.header(*k, *v);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(PaymentError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("HTTP {}", status),
                status: Some(status.as_u16()),
                details: parse_body(&text),
            });
        }

        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!(
                    provider = self.provider,
                    url = url,
                    error = %e,
                    "provider returned an unreadable success body"
                );
                Ok(T::default())
            }
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> PaymentError {
        if err.is_timeout() {
            PaymentError::TimeoutError {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            PaymentError::NetworkError {
                message: format!("{} request failed: {}", self.provider, err),
            }
        }
    }
}

/// Provider error body as JSON, or `None` when it is empty or not JSON.
fn parse_body(text: &str) -> Option<JsonValue> {
    serde_json::from_str::<JsonValue>(text)
        .ok()
        .filter(|v| !v.is_null())
}
