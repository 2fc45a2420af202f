//! Shared HTTP client utilities

use crate::{Result, TransportError};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Maximum number of retries for transient errors
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            // Telemetry payloads are small; 30s covers slow links without
            // letting a wedged request pin the flush worker for long.
            timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 4,
            max_retries: 3,
            user_agent: format!("Traceline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before the collection API closes them,
        // otherwise reuse of a dead connection hangs the next flush.
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| TransportError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Retry policy for transient errors
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 250ms, 500ms, 1s, ...
            let backoff_ms = 2u64.pow(attempt - 1) * 250;
            debug!(
                backoff_ms,
                attempt,
                max_retries,
                "Retrying request after backoff"
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if e.is_transient() && attempt < max_retries {
                    warn!(
                        attempt = attempt + 1,
                        max_retries,
                        error = %e,
                        "Request failed, will retry"
                    );
                    last_error = Some(e);
                } else {
                    return Err(e);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| TransportError::Config("Retry loop exited unexpectedly".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_retries, 3);
        assert!(config.user_agent.starts_with("Traceline/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default();
        assert!(create_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(3, || async { Ok::<i32, TransportError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_transient_error_fails_fast() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<i32, TransportError>(TransportError::Api {
                    status_code: 400,
                    message: "bad request".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(3, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TransportError::Api {
                        status_code: 503,
                        message: "unavailable".to_string(),
                    })
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, TransportError>(TransportError::Unauthorized) }
        })
        .await;

        assert!(matches!(result, Err(TransportError::Unauthorized)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = HttpClientConfig {
            timeout_secs: 120,
            connect_timeout_secs: 20,
            pool_max_idle_per_host: 8,
            max_retries: 5,
            user_agent: "Test/1.0".to_string(),
        };
        assert!(create_client(&config).is_ok());
    }
}
