//! Basic Recording Example
//!
//! This example opens a session, records one event of each kind, and ends
//! the session, printing the server-reported cost.
//!
//! Usage:
//! ```bash
//! TRACELINE_API_KEY=your_key cargo run -p traceline-demos
//!
//! # Against a local collection endpoint:
//! TRACELINE_API_KEY=your_key \
//! TRACELINE_API_ENDPOINT=http://localhost:8080 cargo run -p traceline-demos
//! ```

use traceline_client::{ActionEvent, Client, ClientConfig, EndState, ErrorEvent, ToolEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ClientConfig::from_env()?.with_default_tags(vec!["demo".to_string()]);
    let client = Client::new(config)?;

    info!("Starting session");
    let session = client.start_session().await?;

    session.record(
        ActionEvent::new()
            .with_action_type("plan")
            .with_params(serde_json::json!({"steps": 3})),
    )?;

    session.record(ToolEvent::new("search").with_returns("2 results"))?;

    session.record(
        ErrorEvent::new(Some("retrying after transient failure".to_string()))
            .with_error_type("Timeout"),
    )?;

    let cost = client
        .end_session(&session, EndState::Success, Some("demo complete".to_string()))
        .await?;

    info!(?cost, "Session ended");
    Ok(())
}
