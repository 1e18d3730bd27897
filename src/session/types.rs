use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Who authored a stored turn. System messages are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One stored conversation turn; `ts` is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub ts: i64,
}

/// Timestamp-free view of a turn, the shape embedded in prompts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TurnView<'a> {
    pub role: TurnRole,
    pub content: &'a str,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            ts: now_ms(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            ts: now_ms(),
        }
    }

    pub fn view(&self) -> TurnView<'_> {
        TurnView {
            role: self.role,
            content: &self.content,
        }
    }
}

pub fn turn_views(turns: &[Turn]) -> Vec<TurnView<'_>> {
    turns.iter().map(Turn::view).collect()
}

/// Long-lived facts about the user's site, kept across incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub tech_stack: Vec<String>,
    pub domain: String,
    pub notes: String,
}

/// Everything persisted for one session under its key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredState {
    pub messages: Vec<Turn>,
    /// Running summary of every turn older than `messages`.
    pub summary: String,
    pub profile: UserProfile,
    pub last_incident_summary: String,
    pub clarifying_questions_asked: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[default]
    Unknown,
}

impl Severity {
    /// Map generator text onto the enumerated set; anything else is `Unknown`.
    pub fn from_loose(value: &str) -> Self {
        match value {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Unknown,
        }
    }
}

/// Normalized incident facts extracted from a single user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentParse {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity_guess: Severity,
    pub timeframe: String,
    pub symptoms: Vec<String>,
    pub stack_hints: Vec<String>,
}

impl Default for IncidentParse {
    fn default() -> Self {
        Self {
            kind: "unknown".into(),
            severity_guess: Severity::Unknown,
            timeframe: String::new(),
            symptoms: Vec::new(),
            stack_hints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    Clarify { question: String },
    Final,
}

/// Which exit of the turn state machine produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Clarify,
    Final,
    ParseFallback,
}

impl TurnOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clarify => "clarify",
            Self::Final => "final",
            Self::ParseFallback => "parse_fallback",
        }
    }
}

/// Response body of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub reply: String,
    pub profile: UserProfile,
    #[serde(skip)]
    pub outcome: TurnOutcome,
}
