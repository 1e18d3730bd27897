use serde::{Deserialize, Serialize};

/// Per-session conversation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// History length above which older turns are folded into the summary.
    #[serde(default = "default_max_messages_before_summary")]
    pub max_messages_before_summary: usize,
    /// Turns kept verbatim after compaction.
    #[serde(default = "default_keep_last_messages")]
    pub keep_last_messages: usize,
    /// Clarifying questions allowed per incident before a final answer is forced.
    #[serde(default = "default_max_clarifying_questions")]
    pub max_clarifying_questions: u32,
}

fn default_max_messages_before_summary() -> usize {
    12
}

fn default_keep_last_messages() -> usize {
    6
}

fn default_max_clarifying_questions() -> u32 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages_before_summary: default_max_messages_before_summary(),
            keep_last_messages: default_keep_last_messages(),
            max_clarifying_questions: default_max_clarifying_questions(),
        }
    }
}
