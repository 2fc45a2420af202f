//! Caller-owned client and session registry
//!
//! The [`Client`] replaces any notion of process-global state: it is
//! constructed explicitly, owns the HTTP channel and the registry of running
//! sessions, and is passed (or cloned via `Arc`) to whatever needs it.

use crate::config::ClientConfig;
use crate::dispatcher::DispatcherConfig;
use crate::session::Session;
use crate::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use traceline_core::{EndState, SessionId};
use traceline_transport::{
    check_latest, ApiClient, VersionCheckResult, CURRENT_VERSION,
};

/// Default registry endpoint queried by the version check
const DEFAULT_REGISTRY_URL: &str = traceline_transport::version_check::DEFAULT_REGISTRY_URL;

/// Telemetry client holding the session registry
pub struct Client {
    api: Arc<ApiClient>,
    config: ClientConfig,
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl Client {
    /// Create a client from a validated configuration
    ///
    /// Must be called within a Tokio runtime: the version check (when
    /// enabled) is spawned here, and sessions spawn their dispatch workers.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let api = Arc::new(ApiClient::new(
            &config.endpoint,
            config.api_key.clone(),
            &config.http,
        )?);

        if config.version_check.enabled {
            spawn_version_check(&api, &config);
        }

        Ok(Self {
            api,
            config,
            sessions: DashMap::new(),
        })
    }

    /// The underlying API client
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Number of running sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Start a session with the configured default tags
    pub async fn start_session(&self) -> Result<Arc<Session>> {
        self.start_session_with_tags(self.config.default_tags.clone())
            .await
    }

    /// Start a session with explicit tags
    pub async fn start_session_with_tags(&self, tags: Vec<String>) -> Result<Arc<Session>> {
        let dispatcher_config = DispatcherConfig {
            batch_size: self.config.batch_size,
            batch_interval_ms: self.config.batch_interval_ms,
            queue_size: self.config.max_queue_size,
        };

        let session = Session::start(self.api.clone(), tags, dispatcher_config).await?;
        self.sessions.insert(session.id(), session.clone());
        Ok(session)
    }

    /// End one session and remove it from the registry
    ///
    /// The session is deregistered even if ending it fails, so the registry
    /// never retains dead handles.
    pub async fn end_session(
        &self,
        session: &Session,
        end_state: EndState,
        reason: Option<String>,
    ) -> Result<Option<f64>> {
        self.sessions.remove(&session.id());
        session.end(end_state, reason).await
    }

    /// End every running session
    ///
    /// Used at shutdown (and test teardown) to guarantee nothing leaks into
    /// the next run: pending events are flushed, final snapshots pushed, and
    /// the registry is left empty. Failures are logged, never propagated;
    /// the sweep always converges. Calling it again is a no-op.
    pub async fn end_all_sessions(&self) {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.sessions.clear();

        if sessions.is_empty() {
            return;
        }

        info!(count = sessions.len(), "Ending all sessions");
        for session in sessions {
            if let Err(e) = session.end(EndState::Indeterminate, None).await {
                warn!(session_id = %session.id(), error = %e, "Failed to end session cleanly");
            }
        }
    }
}

/// Kick off the background version check; the result is only logged
fn spawn_version_check(api: &Arc<ApiClient>, config: &ClientConfig) {
    let http = api.http_client().clone();
    let url = config
        .version_check
        .registry_url
        .clone()
        .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

    tokio::spawn(async move {
        match check_latest(&http, &url).await {
            VersionCheckResult::UpdateAvailable { latest } => {
                info!(current = CURRENT_VERSION, latest = %latest, "A newer SDK version is available");
            }
            VersionCheckResult::UpToDate => {
                debug!(current = CURRENT_VERSION, "SDK is up to date");
            }
            VersionCheckResult::Failed => {
                debug!("Version check failed; continuing without it");
            }
        }
    });
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
