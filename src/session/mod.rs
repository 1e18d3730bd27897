pub mod answer;
pub mod compaction;
pub mod controller;
pub mod decision;
pub mod fallback;
pub mod incident;
pub mod limits;
pub mod memory;
pub mod registry;
pub mod store;
pub mod types;

pub use compaction::{CompactionOutcome, SUMMARY_UNAVAILABLE, compact};
pub use controller::SessionController;
pub use decision::{DecisionInput, decide};
pub use fallback::{FINAL_ANSWER_FALLBACK, PARSE_FAILURE_REPLY, has_answer_sections};
pub use incident::{normalize_incident, parse_incident};
pub use memory::{MemoryUpdate, merge_memory, merge_tech_stack, update_memory};
pub use registry::{SessionGuard, SessionRegistry};
pub use store::{InMemorySessionStore, SessionStore, SqliteSessionStore};
pub use types::{
    Decision, IncidentParse, Severity, StoredState, Turn, TurnOutcome, TurnReply, TurnRole,
    UserProfile,
};
