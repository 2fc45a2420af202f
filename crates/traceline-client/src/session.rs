//! Session handle
//!
//! A [`Session`] owns one telemetry session: its JWT, its event dispatcher,
//! and its counters. Recording stamps the event's end timestamp and hands it
//! to the dispatcher; ending flushes pending events and pushes the final
//! session snapshot.

use crate::dispatcher::{DispatcherConfig, EventDispatcher, EventSender, EventSink};
use crate::{Result, TransportResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info};
use traceline_core::{
    EndState, Error, Event, EventCounts, SessionDescriptor, SessionId, SessionState,
};
use traceline_transport::{ApiClient, DeveloperError, TransportError};
use uuid::Uuid;

const STATE_RUNNING: u8 = 0;
const STATE_ENDED: u8 = 1;

/// Call a JWT-authenticated endpoint, reauthorizing once on rejection
///
/// A second rejection surfaces as [`TransportError::Unauthorized`].
async fn call_with_reauth<T, F, Fut>(
    api: &ApiClient,
    session_id: SessionId,
    jwt: &RwLock<String>,
    op: F,
) -> TransportResult<T>
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = TransportResult<T>>,
{
    let token = jwt.read().await.clone();
    match op(token).await {
        Err(TransportError::Unauthorized) => {
            debug!(session_id = %session_id, "JWT rejected, reauthorizing");
            let fresh = api.reauthorize_jwt(session_id).await?.jwt;
            *jwt.write().await = fresh.clone();
            op(fresh).await
        }
        other => other,
    }
}

/// Sink delivering batches over the session's authorized channel
struct SessionTransmitter {
    api: Arc<ApiClient>,
    session_id: SessionId,
    jwt: Arc<RwLock<String>>,
}

#[async_trait]
impl EventSink for SessionTransmitter {
    async fn deliver(&self, events: Vec<Event>) -> Result<()> {
        let batch = &events;
        let result = call_with_reauth(&self.api, self.session_id, &self.jwt, |token| async move {
            self.api
                .create_events(&token, batch)
                .await
                .map(|_response| ())
        })
        .await;

        if let Err(e) = &result {
            // The batch is gone; leave a trace server-side, best effort
            let report = DeveloperError::new(
                "event_delivery_failed",
                format!("dropping batch of {} events: {}", events.len(), e),
            )
            .with_session(self.session_id);
            self.api.report_developer_error(&report).await;
        }

        result.map_err(Into::into)
    }
}

/// A running telemetry session
pub struct Session {
    id: SessionId,
    api: Arc<ApiClient>,
    jwt: Arc<RwLock<String>>,
    tags: Vec<String>,
    init_timestamp: DateTime<Utc>,
    state: AtomicU8,
    counts: Mutex<EventCounts>,
    token_cost: Mutex<Option<f64>>,
    // Enqueueing goes through the lock-free sender; only end() takes the
    // dispatcher mutex, so concurrent record calls never contend.
    sender: EventSender,
    dispatcher: tokio::sync::Mutex<Option<EventDispatcher>>,
}

impl Session {
    /// Open a session: exchange the API key for a JWT and start the
    /// background dispatcher
    pub async fn start(
        api: Arc<ApiClient>,
        tags: Vec<String>,
        dispatcher_config: DispatcherConfig,
    ) -> Result<Arc<Self>> {
        let id = Uuid::new_v4();
        let descriptor = SessionDescriptor::new(id).with_tags(tags.clone());

        let response = api.create_session(&descriptor).await?;
        let jwt = Arc::new(RwLock::new(response.jwt));

        let transmitter = Arc::new(SessionTransmitter {
            api: api.clone(),
            session_id: id,
            jwt: jwt.clone(),
        });
        let dispatcher = EventDispatcher::new(transmitter, dispatcher_config);
        let sender = dispatcher.sender();

        info!(session_id = %id, tags = ?tags, "Session started");

        Ok(Arc::new(Self {
            id,
            api,
            jwt,
            tags,
            init_timestamp: descriptor.init_timestamp,
            state: AtomicU8::new(STATE_RUNNING),
            counts: Mutex::new(EventCounts::default()),
            token_cost: Mutex::new(None),
            sender,
            dispatcher: tokio::sync::Mutex::new(Some(dispatcher)),
        }))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn init_timestamp(&self) -> DateTime<Utc> {
        self.init_timestamp
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => SessionState::Running,
            _ => SessionState::Ended,
        }
    }

    /// Events recorded so far, by kind
    pub fn event_counts(&self) -> EventCounts {
        self.counts.lock().map(|counts| *counts).unwrap_or_default()
    }

    /// Latest server-reported cost, available once the session has ended
    pub fn token_cost(&self) -> Option<f64> {
        self.token_cost.lock().ok().and_then(|cost| *cost)
    }

    /// Record an event
    ///
    /// Stamps the event's end timestamp with the current time (always, even
    /// if one was set before) and enqueues it for transmission. Returns the
    /// event as recorded. Network failures never surface here; transmission
    /// is asynchronous.
    pub fn record(&self, event: impl Into<Event>) -> Result<Event> {
        if self.state() == SessionState::Ended {
            return Err(Error::SessionEnded(self.id).into());
        }

        let mut event = event.into();
        event.stamp_end(Utc::now());
        if let Ok(mut counts) = self.counts.lock() {
            counts.record(event.kind());
        }

        if !self.sender.enqueue(event.clone()) {
            // The channel only closes once end() has flipped the state
            if self.state() == SessionState::Ended {
                return Err(Error::SessionEnded(self.id).into());
            }
            return Err(Error::QueueFull.into());
        }

        debug!(session_id = %self.id, event_type = %event.kind(), "Recorded event");
        Ok(event)
    }

    /// End the session
    ///
    /// Drains and flushes pending events, pushes the final session snapshot,
    /// and absorbs the server's accumulated cost. Ending an already-ended
    /// session is an error.
    pub async fn end(&self, end_state: EndState, reason: Option<String>) -> Result<Option<f64>> {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_ENDED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(Error::SessionEnded(self.id).into());
        }

        // Flush everything recorded before the state flipped
        if let Some(dispatcher) = self.dispatcher.lock().await.take() {
            dispatcher.shutdown().await?;
        }

        let descriptor = self.descriptor().with_end(end_state, reason);
        let snapshot = &descriptor;
        let response = call_with_reauth(&self.api, self.id, &self.jwt, |token| async move {
            self.api.update_session(&token, snapshot).await
        })
        .await?;

        if let Ok(mut cost) = self.token_cost.lock() {
            *cost = response.token_cost;
        }

        info!(
            session_id = %self.id,
            end_state = ?end_state,
            events = self.event_counts().total(),
            token_cost = ?response.token_cost,
            "Session ended"
        );

        Ok(response.token_cost)
    }

    /// Current session snapshot for create/update calls
    fn descriptor(&self) -> SessionDescriptor {
        let mut descriptor =
            SessionDescriptor::new(self.id).with_event_counts(self.event_counts());
        descriptor.init_timestamp = self.init_timestamp;
        descriptor.tags = self.tags.clone();
        descriptor
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("tags", &self.tags)
            .finish()
    }
}
