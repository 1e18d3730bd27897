use super::engine::TeraEngine;
use crate::error::PromptError;
use serde::Serialize;
use tera::Context;

/// System message shared by every generation stage.
pub const SYSTEM_PROMPT: &str = "\
You are Pocket SRE, an incident helper for websites.
You must be concise, practical, and safe.

Safety rules:
- Do not provide instructions for wrongdoing or abuse (hacking, malware, credential theft).
- When user asks for anything unsafe/illegal, refuse and offer safe alternatives.
- For operational advice, prefer reversible, low-risk steps and clearly label risky steps.

Output rules:
- Use short bullet points.
- Ask at most 2 clarifying questions total across the whole incident.
- If you have enough info, produce the final answer immediately.";

/// Correction instruction sent when structured output could not be parsed.
pub const JSON_CORRECTION_PROMPT: &str = "\
Your previous response was invalid. Return ONLY valid JSON matching the requested schema. No markdown.

Previous response:
";

const INCIDENT_PARSE_TEMPLATE: &str = r#"Extract a STRICT JSON object describing the incident.

Return ONLY valid JSON (no markdown, no code fences).
If the user message is NOT an incident report, still return valid JSON with:
- type: "other"
- severity_guess: "unknown"
Do not ask clarifying questions in this step.
Schema:
{
  "type": string,                       // e.g. "5xx_errors", "latency", "dns", "deploy_regression", "auth"
  "severity_guess": "low"|"medium"|"high"|"critical"|"unknown",
  "timeframe": string,                  // short text; empty string if unknown
  "symptoms": string[],                 // short symptom bullets; empty if unknown
  "stack_hints": string[]               // any detected stack hints; empty if none
}

User message:
{{ user_message }}"#;

const DECISION_TEMPLATE: &str = r#"Decide whether to ask ONE clarifying question or provide the final answer now.

Constraints:
- You may ask a clarifying question only if it would materially change the runbook.
- Never ask more than {{ max_clarifying }} clarifying questions total.
- If clarifyingQuestionsAsked >= {{ max_clarifying }}, you MUST choose "final".

Return ONLY valid JSON:
{ "action": "clarify", "question": string } OR { "action": "final" }

Context:
- clarifyingQuestionsAsked: {{ clarifying_asked }}
- summary (older chat): {% if summary %}{{ summary }}{% else %}(empty){% endif %}
- profile: {{ profile_json }}
- incident: {{ incident_json }}

Latest user message:
{{ user_message }}"#;

const FINAL_ANSWER_TEMPLATE: &str = r#"You are Pocket SRE. Produce a concise, actionable incident response.

Return ONLY plain text (no JSON).

Must include exactly these sections, in this order:
RUNBOOK (3-7 steps)
LIKELY ROOT CAUSES (3 items, each with confidence like 0.55)
STATUS UPDATE (1-2 paragraphs)

Guidance:
- Prefer checks that work for most stacks (DNS, TLS, origin health, deploys, logs, DB).
- Be specific about what to look for and what "good" vs "bad" looks like.
- Mention Cloudflare-specific checks only when relevant (e.g. 52x, WAF, cache).
- Keep it short; no long explanations.

Context:
summary (older chat): {% if summary %}{{ summary }}{% else %}(empty){% endif %}
profile: {{ profile_json }}
incident: {{ incident_json }}
recentMessages: {{ recent_json }}"#;

const SUMMARIZE_TEMPLATE: &str = r#"Create/extend a running summary of this troubleshooting chat.

Return ONLY plain text.
Keep it compact (max ~1200 chars).
Include:
- What the site is
- Stack hints
- Incident symptoms + timeframe
- What was already tried / results
- Any decisions or next steps

Previous summary:
{% if previous_summary %}{{ previous_summary }}{% else %}(empty){% endif %}

Messages to summarize:
{{ messages_json }}"#;

const MEMORY_UPDATE_TEMPLATE: &str = r#"Update long-term memory for this user session.

Return ONLY valid JSON (no markdown):
{
  "profile": {
    "techStack": string[],
    "domain": string,
    "notes": string
  },
  "lastIncidentSummary": string
}

Rules:
- techStack: keep a deduped list of short items (e.g. "Next.js", "Postgres", "Cloudflare", "Kubernetes").
- domain: keep as provided; empty string if unknown.
- notes: 1-3 short sentences with stable facts; avoid repeating ephemeral metrics.
- lastIncidentSummary: 1-3 sentences summarizing the incident + next actions.

Existing profile:
{{ profile_json }}

Running summary:
{% if summary %}{{ summary }}{% else %}(empty){% endif %}

Incident JSON:
{{ incident_json }}

Final answer that was given:
{{ final_answer }}"#;

const INCIDENT_PARSE_NAME: &str = "incident_parse";
const DECISION_NAME: &str = "decision";
const FINAL_ANSWER_NAME: &str = "final_answer";
const SUMMARIZE_NAME: &str = "summarize";
const MEMORY_UPDATE_NAME: &str = "memory_update";

/// Register the default templates in the engine.
fn ensure_defaults(engine: &mut TeraEngine) -> Result<(), PromptError> {
    engine.add_template(INCIDENT_PARSE_NAME, INCIDENT_PARSE_TEMPLATE)?;
    engine.add_template(DECISION_NAME, DECISION_TEMPLATE)?;
    engine.add_template(FINAL_ANSWER_NAME, FINAL_ANSWER_TEMPLATE)?;
    engine.add_template(SUMMARIZE_NAME, SUMMARIZE_TEMPLATE)?;
    engine.add_template(MEMORY_UPDATE_NAME, MEMORY_UPDATE_TEMPLATE)?;
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, PromptError> {
    serde_json::to_string(value).map_err(|e| PromptError::Render(e.to_string()))
}

/// Inputs for the clarify-or-finalize prompt.
pub struct DecisionPromptArgs<'a, I: Serialize, P: Serialize> {
    pub user_message: &'a str,
    pub incident: &'a I,
    pub profile: &'a P,
    pub summary: &'a str,
    pub clarifying_asked: u32,
    pub max_clarifying: u32,
}

/// Inputs for the three-section answer prompt.
pub struct FinalAnswerPromptArgs<'a, I: Serialize, P: Serialize, M: Serialize> {
    pub incident: &'a I,
    pub profile: &'a P,
    pub summary: &'a str,
    pub recent_messages: &'a [M],
}

/// Inputs for the long-term memory prompt.
pub struct MemoryPromptArgs<'a, I: Serialize, P: Serialize> {
    pub profile: &'a P,
    pub incident: &'a I,
    pub final_answer: &'a str,
    pub summary: &'a str,
}

/// Every prompt the session pipeline sends, pre-registered in one engine.
///
/// Structured arguments are embedded as compact JSON.
pub struct PromptLibrary {
    engine: TeraEngine,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, PromptError> {
        let mut engine = TeraEngine::new();
        ensure_defaults(&mut engine)?;
        Ok(Self { engine })
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn incident_parse(&self, user_message: &str) -> Result<String, PromptError> {
        let mut ctx = Context::new();
        ctx.insert("user_message", user_message);
        self.engine.render(INCIDENT_PARSE_NAME, &ctx)
    }

    pub fn decision<I: Serialize, P: Serialize>(
        &self,
        args: &DecisionPromptArgs<'_, I, P>,
    ) -> Result<String, PromptError> {
        let mut ctx = Context::new();
        ctx.insert("user_message", args.user_message);
        ctx.insert("incident_json", &to_json(args.incident)?);
        ctx.insert("profile_json", &to_json(args.profile)?);
        ctx.insert("summary", args.summary);
        ctx.insert("clarifying_asked", &args.clarifying_asked);
        ctx.insert("max_clarifying", &args.max_clarifying);
        self.engine.render(DECISION_NAME, &ctx)
    }

    pub fn final_answer<I: Serialize, P: Serialize, M: Serialize>(
        &self,
        args: &FinalAnswerPromptArgs<'_, I, P, M>,
    ) -> Result<String, PromptError> {
        let mut ctx = Context::new();
        ctx.insert("incident_json", &to_json(args.incident)?);
        ctx.insert("profile_json", &to_json(args.profile)?);
        ctx.insert("summary", args.summary);
        ctx.insert("recent_json", &to_json(args.recent_messages)?);
        self.engine.render(FINAL_ANSWER_NAME, &ctx)
    }

    pub fn summarize<M: Serialize>(
        &self,
        previous_summary: &str,
        messages: &[M],
    ) -> Result<String, PromptError> {
        let mut ctx = Context::new();
        ctx.insert("previous_summary", previous_summary);
        ctx.insert("messages_json", &to_json(messages)?);
        self.engine.render(SUMMARIZE_NAME, &ctx)
    }

    pub fn memory_update<I: Serialize, P: Serialize>(
        &self,
        args: &MemoryPromptArgs<'_, I, P>,
    ) -> Result<String, PromptError> {
        let mut ctx = Context::new();
        ctx.insert("profile_json", &to_json(args.profile)?);
        ctx.insert("incident_json", &to_json(args.incident)?);
        ctx.insert("final_answer", args.final_answer);
        ctx.insert("summary", args.summary);
        self.engine.render(MEMORY_UPDATE_NAME, &ctx)
    }
}
