//! Recorded event types
//!
//! Every event carries an `init_timestamp` set at construction and an
//! `end_timestamp` stamped when the event is recorded. The serialized form
//! is tagged with `event_type` using the collection API's plural names
//! (`actions`, `tools`, `llms`, `errors`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Discriminator for the event family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Action,
    Tool,
    Llm,
    Error,
}

impl EventKind {
    /// Wire name used by the collection API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "actions",
            Self::Tool => "tools",
            Self::Llm => "llms",
            Self::Error => "errors",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum Event {
    #[serde(rename = "actions")]
    Action(ActionEvent),

    #[serde(rename = "tools")]
    Tool(ToolEvent),

    #[serde(rename = "llms")]
    Llm(LlmEvent),

    #[serde(rename = "errors")]
    Error(ErrorEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Action(_) => EventKind::Action,
            Self::Tool(_) => EventKind::Tool,
            Self::Llm(_) => EventKind::Llm,
            Self::Error(_) => EventKind::Error,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Action(e) => e.id,
            Self::Tool(e) => e.id,
            Self::Llm(e) => e.id,
            Self::Error(e) => e.id,
        }
    }

    pub fn init_timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Action(e) => e.init_timestamp,
            Self::Tool(e) => e.init_timestamp,
            Self::Llm(e) => e.init_timestamp,
            Self::Error(e) => e.init_timestamp,
        }
    }

    pub fn end_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Action(e) => e.end_timestamp,
            Self::Tool(e) => e.end_timestamp,
            Self::Llm(e) => e.end_timestamp,
            Self::Error(e) => e.end_timestamp,
        }
    }

    /// Stamp the end timestamp at record time
    ///
    /// Always overwrites: recording re-stamps the end time independently of
    /// construction time or any earlier stamp.
    pub fn stamp_end(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Action(e) => e.end_timestamp = Some(at),
            Self::Tool(e) => e.end_timestamp = Some(at),
            Self::Llm(e) => e.end_timestamp = Some(at),
            Self::Error(e) => e.end_timestamp = Some(at),
        }
    }
}

impl From<ActionEvent> for Event {
    fn from(event: ActionEvent) -> Self {
        Self::Action(event)
    }
}

impl From<ToolEvent> for Event {
    fn from(event: ToolEvent) -> Self {
        Self::Tool(event)
    }
}

impl From<LlmEvent> for Event {
    fn from(event: LlmEvent) -> Self {
        Self::Llm(event)
    }
}

impl From<ErrorEvent> for Event {
    fn from(event: ErrorEvent) -> Self {
        Self::Error(event)
    }
}

/// A generic action performed by the instrumented application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    /// Event ID
    pub id: Uuid,

    /// Caller-defined action name
    pub action_type: String,

    /// Action input parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Action return value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,

    /// Diagnostic log context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,

    /// Set at construction
    pub init_timestamp: DateTime<Utc>,

    /// Set when the event is recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl ActionEvent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type: "action".to_string(),
            params: None,
            returns: None,
            logs: None,
            init_timestamp: Utc::now(),
            end_timestamp: None,
        }
    }

    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = action_type.into();
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    pub fn with_logs(mut self, logs: impl Into<String>) -> Self {
        self.logs = Some(logs.into());
        self
    }
}

impl Default for ActionEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// A tool invocation made by the instrumented application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEvent {
    /// Event ID
    pub id: Uuid,

    /// Tool name
    pub name: String,

    /// Tool input parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Tool return value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,

    /// Diagnostic log context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,

    /// Set at construction
    pub init_timestamp: DateTime<Utc>,

    /// Set when the event is recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl ToolEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            params: None,
            returns: None,
            logs: None,
            init_timestamp: Utc::now(),
            end_timestamp: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    pub fn with_logs(mut self, logs: impl Into<String>) -> Self {
        self.logs = Some(logs.into());
        self
    }
}

/// An LLM call made by the instrumented application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEvent {
    /// Event ID
    pub id: Uuid,

    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Prompt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Completion text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,

    /// Prompt token count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,

    /// Completion token count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,

    /// Cost in USD, if known at record time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    /// Set at construction
    pub init_timestamp: DateTime<Utc>,

    /// Set when the event is recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl LlmEvent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            model: None,
            prompt: None,
            completion: None,
            prompt_tokens: None,
            completion_tokens: None,
            cost: None,
            init_timestamp: Utc::now(),
            end_timestamp: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = Some(completion.into());
        self
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.prompt_tokens = Some(prompt_tokens);
        self.completion_tokens = Some(completion_tokens);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl Default for LlmEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// An error observed by the instrumented application
///
/// The `logs` field may be absent; recording an error without diagnostic
/// context is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Event ID
    pub id: Uuid,

    /// Error classification (e.g. exception type name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    /// Application-defined error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Diagnostic log context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,

    /// ID of the event that raised this error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_event_id: Option<Uuid>,

    /// Set at construction
    pub init_timestamp: DateTime<Utc>,

    /// Set when the event is recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl ErrorEvent {
    pub fn new(logs: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            error_type: None,
            code: None,
            details: None,
            logs,
            trigger_event_id: None,
            init_timestamp: Utc::now(),
            end_timestamp: None,
        }
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_trigger_event(mut self, event: &Event) -> Self {
        self.trigger_event_id = Some(event.id());
        self
    }
}
