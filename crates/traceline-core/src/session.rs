//! Session identifiers, state, and the wire-level session snapshot

use crate::events::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identifier (UUID v4, generated client-side)
pub type SessionId = Uuid;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Ended,
}

/// Terminal disposition reported when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EndState {
    Success,
    Fail,
    Indeterminate,
}

/// Events recorded per kind, reported with session updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    #[serde(default)]
    pub actions: u64,
    #[serde(default)]
    pub tools: u64,
    #[serde(default)]
    pub llms: u64,
    #[serde(default)]
    pub errors: u64,
}

impl EventCounts {
    /// Increment the counter for one recorded event
    pub fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Action => self.actions += 1,
            EventKind::Tool => self.tools += 1,
            EventKind::Llm => self.llms += 1,
            EventKind::Error => self.errors += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.actions + self.tools + self.llms + self.errors
    }
}

/// Host environment summary attached to session snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEnv {
    /// SDK version
    pub sdk_version: String,

    /// Operating system family
    pub os: String,
}

impl HostEnv {
    /// Capture the current host environment
    pub fn capture() -> Self {
        Self {
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
        }
    }
}

impl Default for HostEnv {
    fn default() -> Self {
        Self::capture()
    }
}

/// Serialized session snapshot sent with create/update calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Session ID
    pub session_id: SessionId,

    /// Session start time
    pub init_timestamp: DateTime<Utc>,

    /// Session end time, once ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,

    /// Caller-supplied tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Terminal disposition, once ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_state: Option<EndState>,

    /// Free-form reason accompanying the end state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_state_reason: Option<String>,

    /// Events recorded so far, by kind
    #[serde(default)]
    pub event_counts: EventCounts,

    /// Host environment summary
    pub host_env: HostEnv,
}

impl SessionDescriptor {
    /// Create a descriptor for a newly started session
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            init_timestamp: Utc::now(),
            end_timestamp: None,
            tags: Vec::new(),
            end_state: None,
            end_state_reason: None,
            event_counts: EventCounts::default(),
            host_env: HostEnv::capture(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Mark the session as ended
    pub fn with_end(mut self, end_state: EndState, reason: Option<String>) -> Self {
        self.end_timestamp = Some(Utc::now());
        self.end_state = Some(end_state);
        self.end_state_reason = reason;
        self
    }

    pub fn with_event_counts(mut self, event_counts: EventCounts) -> Self {
        self.event_counts = event_counts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counts() {
        let mut counts = EventCounts::default();
        counts.record(EventKind::Action);
        counts.record(EventKind::Action);
        counts.record(EventKind::Error);

        assert_eq!(counts.actions, 2);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.tools, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_descriptor_end() {
        let descriptor = SessionDescriptor::new(Uuid::new_v4())
            .with_tags(vec!["ci".to_string()])
            .with_end(EndState::Success, Some("done".to_string()));

        assert!(descriptor.end_timestamp.is_some());
        assert_eq!(descriptor.end_state, Some(EndState::Success));
        assert_eq!(descriptor.end_state_reason.as_deref(), Some("done"));
    }

    #[test]
    fn test_end_state_wire_names() {
        let json = serde_json::to_value(EndState::Indeterminate).unwrap();
        assert_eq!(json, "Indeterminate");
        let json = serde_json::to_value(EndState::Success).unwrap();
        assert_eq!(json, "Success");
    }

    #[test]
    fn test_descriptor_serialization_omits_unset_end() {
        let descriptor = SessionDescriptor::new(Uuid::new_v4());
        let json = serde_json::to_value(&descriptor).unwrap();

        assert!(json.get("end_timestamp").is_none());
        assert!(json.get("end_state").is_none());
        assert!(json.get("host_env").is_some());
    }
}
