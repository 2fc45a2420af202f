//! Typed client for the collection API
//!
//! All endpoints are JSON-over-POST. Session creation and JWT
//! reauthorization authenticate with the API key header; session-scoped
//! calls additionally carry the session's bearer token.

use crate::{
    client::{create_client, with_retry, HttpClientConfig},
    retry_after::parse_retry_after,
    Result, TransportError,
};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use traceline_core::{ApiKey, Event, SessionDescriptor, SessionId};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-traceline-api-key";

/// Response to `/v2/create_session`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub status: String,
    pub jwt: String,
}

/// Response to `/v2/update_session`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSessionResponse {
    pub status: String,

    /// Accumulated cost for the session, as reported by the server.
    /// Arrives as a JSON number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_token_cost")]
    pub token_cost: Option<f64>,
}

/// Response to `/v2/reauthorize_jwt`
#[derive(Debug, Clone, Deserialize)]
pub struct ReauthorizeResponse {
    pub status: String,
    pub jwt: String,
}

/// Bare status response (`/v2/create_events`, `/v2/developer_errors`)
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// SDK-internal failure report sent to `/v2/developer_errors`
#[derive(Debug, Clone, Serialize)]
pub struct DeveloperError {
    pub sdk_version: String,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl DeveloperError {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            error_type: error_type.into(),
            message: message.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session: &'a SessionDescriptor,
}

#[derive(Serialize)]
struct EventsRequest<'a> {
    events: &'a [Event],
}

#[derive(Serialize)]
struct ReauthorizeRequest {
    session_id: SessionId,
}

#[derive(Serialize)]
struct DeveloperErrorRequest<'a> {
    error: &'a DeveloperError,
}

fn deserialize_token_cost<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid token_cost string: {}", e))),
        Some(other) => Err(D::Error::custom(format!(
            "invalid token_cost type: {}",
            other
        ))),
    }
}

/// Client for the collection API
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    max_retries: u32,
}

impl ApiClient {
    /// Create an API client against the given base URL
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKey,
        config: &HttpClientConfig,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client: create_client(config)?,
            base_url,
            api_key,
            max_retries: config.max_retries,
        })
    }

    /// The underlying reqwest client, shared with auxiliary callers
    /// (version check) to reuse the connection pool
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Exchange the API key for a session JWT
    pub async fn create_session(
        &self,
        session: &SessionDescriptor,
    ) -> Result<CreateSessionResponse> {
        debug!(session_id = %session.session_id, "Creating session");
        with_retry(self.max_retries, || async move {
            let response = self
                .client
                .post(format!("{}/v2/create_session", self.base_url))
                .header(API_KEY_HEADER, self.api_key.expose())
                .json(&SessionRequest { session })
                .send()
                .await?;
            handle_response("create_session", response).await
        })
        .await
    }

    /// Push an updated session snapshot; returns the server's running cost
    pub async fn update_session(
        &self,
        jwt: &str,
        session: &SessionDescriptor,
    ) -> Result<UpdateSessionResponse> {
        debug!(session_id = %session.session_id, "Updating session");
        with_retry(self.max_retries, || async move {
            let response = self
                .client
                .post(format!("{}/v2/update_session", self.base_url))
                .header(API_KEY_HEADER, self.api_key.expose())
                .bearer_auth(jwt)
                .json(&SessionRequest { session })
                .send()
                .await?;
            handle_response("update_session", response).await
        })
        .await
    }

    /// Transmit a batch of recorded events
    pub async fn create_events(&self, jwt: &str, events: &[Event]) -> Result<StatusResponse> {
        debug!(count = events.len(), "Sending events");
        with_retry(self.max_retries, || async move {
            let response = self
                .client
                .post(format!("{}/v2/create_events", self.base_url))
                .header(API_KEY_HEADER, self.api_key.expose())
                .bearer_auth(jwt)
                .json(&EventsRequest { events })
                .send()
                .await?;
            handle_response("create_events", response).await
        })
        .await
    }

    /// Obtain a fresh JWT for a session whose token was rejected
    pub async fn reauthorize_jwt(&self, session_id: SessionId) -> Result<ReauthorizeResponse> {
        debug!(session_id = %session_id, "Reauthorizing JWT");
        with_retry(self.max_retries, || async move {
            let response = self
                .client
                .post(format!("{}/v2/reauthorize_jwt", self.base_url))
                .header(API_KEY_HEADER, self.api_key.expose())
                .json(&ReauthorizeRequest { session_id })
                .send()
                .await?;
            handle_response("reauthorize_jwt", response).await
        })
        .await
    }

    /// Report an SDK-internal failure, best effort
    ///
    /// Never surfaces an error: a telemetry SDK must not fail the host
    /// application because its own failure report could not be delivered.
    pub async fn report_developer_error(&self, error: &DeveloperError) {
        let result: Result<StatusResponse> = async {
            let response = self
                .client
                .post(format!("{}/v2/developer_errors", self.base_url))
                .header(API_KEY_HEADER, self.api_key.expose())
                .json(&DeveloperErrorRequest { error })
                .send()
                .await?;
            handle_response("developer_errors", response).await
        }
        .await;

        if let Err(e) = result {
            warn!(error = %e, error_type = %error.error_type, "Failed to deliver developer error report");
        }
    }
}

/// Map an HTTP response into a typed result
async fn handle_response<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(TransportError::Unauthorized);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return Err(TransportError::RateLimitExceeded { retry_after_secs });
    }

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(TransportError::Api {
            status_code: status.as_u16(),
            message: body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Parse(format!("Failed to parse {} response: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cost_from_number() {
        let response: UpdateSessionResponse =
            serde_json::from_str(r#"{"status": "success", "token_cost": 5}"#).unwrap();
        assert_eq!(response.token_cost, Some(5.0));
    }

    #[test]
    fn test_token_cost_from_string() {
        let response: UpdateSessionResponse =
            serde_json::from_str(r#"{"status": "success", "token_cost": "0.0215"}"#).unwrap();
        assert_eq!(response.token_cost, Some(0.0215));
    }

    #[test]
    fn test_token_cost_absent() {
        let response: UpdateSessionResponse =
            serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(response.token_cost, None);

        let response: UpdateSessionResponse =
            serde_json::from_str(r#"{"status": "success", "token_cost": null}"#).unwrap();
        assert_eq!(response.token_cost, None);
    }

    #[test]
    fn test_token_cost_rejects_non_numeric() {
        let result: std::result::Result<UpdateSessionResponse, _> =
            serde_json::from_str(r#"{"status": "success", "token_cost": "free"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api_key = ApiKey::new("11111111-1111-4111-8111-111111111111").unwrap();
        let client = ApiClient::new(
            "https://api.traceline.dev/",
            api_key,
            &HttpClientConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.traceline.dev");
    }
}
