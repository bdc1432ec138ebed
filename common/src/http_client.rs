use crate::errors::AppError;
use reqwest::Client;
use std::time::Duration;
use tracing::{Instrument, error, info, instrument, warn};

/// Longest pause between retry attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retrying after the given zero-based attempt: 100ms doubling, capped
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2_u64.saturating_pow(attempt).saturating_mul(100);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// HTTP client with timeout and optional retry
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Fetch JSON from URL, retrying with exponential backoff when `max_retries > 0`.
    ///
    /// The URL is not recorded on the span because provider URLs carry API keys.
    #[instrument(skip(self, url))]
    pub async fn get_json<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            let span = tracing::span!(
                tracing::Level::INFO,
                "http_request",
                attempt = attempt.saturating_add(1)
            );

            match self.fetch_with_timeout(url).instrument(span).await {
                Ok(response) => {
                    info!(attempt = attempt.saturating_add(1), "Request successful");
                    return Ok(response);
                }
                // Client errors will not change on retry
                Err(e @ AppError::HttpError { status: 400..=499, .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let backoff = backoff_delay(attempt);
                        warn!(
                            attempt = attempt.saturating_add(1),
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying with exponential backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        if self.max_retries > 0 {
            error!(attempts = self.max_retries.saturating_add(1), "All retry attempts exhausted");
        }
        Err(last_error.unwrap_or_else(|| AppError::internal("Unknown error after retries")))
    }

    async fn fetch_with_timeout<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| AppError::timeout("Request timed out"))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout("Request timed out")
                } else {
                    AppError::NetworkError(e.without_url())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::http(
                status.as_u16(),
                format!("HTTP error: {} {}", status, body.trim()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(e.without_url()))?;
        let json: T = serde_json::from_str(&text).map_err(AppError::ParseError)?;

        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(9), MAX_BACKOFF);
        assert_eq!(backoff_delay(64), MAX_BACKOFF);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF);
    }
}
