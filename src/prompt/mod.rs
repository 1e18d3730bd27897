mod builder;
mod engine;

pub use builder::{
    DecisionPromptArgs, FinalAnswerPromptArgs, JSON_CORRECTION_PROMPT, MemoryPromptArgs,
    PromptLibrary, SYSTEM_PROMPT,
};
pub use engine::TeraEngine;
