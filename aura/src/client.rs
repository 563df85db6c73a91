//! HTTP client for the hosted business-assistant functions.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AuraConfig;
use crate::error::{Error, Result};

/// Error body returned by the hosted functions.
#[derive(Debug, Clone, Deserialize)]
struct FunctionErrorResponse {
    error: String,
}

/// Client for the hosted functions.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Aura {
    pub(crate) config: Arc<AuraConfig>,
    pub(crate) client: Client,
}

impl Aura {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: AuraConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::config("API key is required"));
        }

        // No client-wide timeout: it would also cap how long a chat stream may run.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// See [`AuraConfig::from_env`] and [`Aura::new`].
    pub fn from_env() -> Result<Self> {
        let config = AuraConfig::from_env()?;
        Self::new(config)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AuraConfig {
        &self.config
    }

    /// Build the URL of a hosted function.
    #[must_use]
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/{name}", self.config.functions_url)
    }

    /// Build an authenticated request to a hosted function.
    pub(crate) fn build_request(&self, method: Method, function: &str) -> RequestBuilder {
        self.client
            .request(method, self.function_url(function))
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
    }

    /// Apply the configured whole-request timeout.
    fn with_timeout(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.timeout_secs {
            Some(secs) => req.timeout(Duration::from_secs(secs)),
            None => req,
        }
    }

    /// POST a JSON body to a function and decode its JSON answer.
    pub(crate) async fn invoke<B, T>(&self, function: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(function, "invoking function");
        let req = self.with_timeout(self.build_request(Method::POST, function).json(body));
        let response = Self::check_status(function, req.send().await?).await?;
        Self::decode(function, response).await
    }

    /// GET a function and decode its JSON answer.
    pub(crate) async fn invoke_get<T: DeserializeOwned>(&self, function: &str) -> Result<T> {
        tracing::debug!(function, "fetching function");
        let req = self.with_timeout(self.build_request(Method::GET, function));
        let response = Self::check_status(function, req.send().await?).await?;
        Self::decode(function, response).await
    }

    async fn decode<T: DeserializeOwned>(function: &str, response: Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            Error::transport(format!(
                "[{function}] unexpected response: {e}, response: {text}"
            ))
        })
    }

    /// Turn a non-success response into the matching error.
    ///
    /// # Errors
    ///
    /// 429 maps to [`Error::RateLimited`], 402 to [`Error::PaymentRequired`],
    /// any other non-2xx status to [`Error::Transport`].
    pub(crate) async fn check_status(function: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(function, status = status.as_u16(), "function call failed");
        Err(Self::parse_error(function, status, &body))
    }

    /// Classify an error response.
    #[must_use]
    pub fn parse_error(function: &str, status: StatusCode, body: &str) -> Error {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Error::rate_limited(function),
            StatusCode::PAYMENT_REQUIRED => Error::payment_required(function),
            _ => match serde_json::from_str::<FunctionErrorResponse>(body) {
                Ok(parsed) => Error::transport(format!("[{function}] {}", parsed.error)),
                Err(_) => Error::transport(format!("HTTP {}: {body}", status.as_u16())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = Aura::new(AuraConfig::default()).expect_err("empty key");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_function_url() {
        let client = Aura::new(
            AuraConfig::new("key").with_functions_url("https://demo.test/functions/v1/"),
        )
        .expect("client");
        assert_eq!(
            client.function_url("market-data"),
            "https://demo.test/functions/v1/market-data"
        );
    }

    #[test]
    fn test_parse_error_classification() {
        let err = Aura::parse_error("f", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, Error::RateLimited { ref endpoint } if endpoint == "f"));

        let err = Aura::parse_error("f", StatusCode::PAYMENT_REQUIRED, "{}");
        assert!(matches!(err, Error::PaymentRequired { .. }));

        let err = Aura::parse_error(
            "f",
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"gateway key is not configured"}"#,
        );
        assert_eq!(err.to_string(), "[f] gateway key is not configured");

        let err = Aura::parse_error("f", StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "HTTP 502: upstream down");
    }
}
