//! Canned replies used when a generation-backed stage cannot produce one.
//! Both keep the three-section layout of a normal final answer.

/// Sent when the incident parser fails and the turn short-circuits.
pub const PARSE_FAILURE_REPLY: &str = "\
RUNBOOK (3-7 steps)
- Confirm the exact error and scope (URLs, regions, % of traffic)
- Check recent deploys/config changes (last 60 minutes)
- Check origin health (CPU/mem, error logs, upstream timeouts)
LIKELY ROOT CAUSES (3 items, each with confidence like 0.55)
- LLM parsing failed; treat as unknown incident (0.50)
- Transient upstream outage (0.30)
- Misconfiguration or deploy regression (0.20)
STATUS UPDATE (1-2 paragraphs)
I hit an internal parsing error, so I’m falling back to a generic incident checklist. \
If you share the error code (e.g., 502/520) and timeframe, I can tailor the runbook.
";

/// Sent when the answer builder cannot generate a tailored response.
pub const FINAL_ANSWER_FALLBACK: &str = "\
RUNBOOK (3-7 steps)
- Identify the primary symptom (5xx, latency, DNS, auth) and scope (all users vs subset)
- Check recent changes: deploys, config, DNS, certificates
- Validate origin health: error logs, saturation, upstream timeouts
- Validate dependencies: DB, cache, third-party APIs
LIKELY ROOT CAUSES (3 items, each with confidence like 0.55)
- Deploy/config regression (0.45)
- Upstream dependency failure (0.30)
- Traffic spike / resource exhaustion (0.25)
STATUS UPDATE (1-2 paragraphs)
I’m currently unable to generate a tailored response, so I’m providing a generic incident checklist. \
If you share the error code, affected endpoints, and when it started, I can narrow this down.
";

/// Section headings every final answer carries, in order.
pub const ANSWER_SECTIONS: [&str; 3] = [
    "RUNBOOK (3-7 steps)",
    "LIKELY ROOT CAUSES (3 items, each with confidence like 0.55)",
    "STATUS UPDATE (1-2 paragraphs)",
];

/// Parse-failure reply, with a diagnostic suffix when debug output is on.
pub fn parse_failure_reply(error: &dyn std::fmt::Display, debug: bool) -> String {
    if debug {
        format!("{PARSE_FAILURE_REPLY}\n\n(debug) {error}")
    } else {
        PARSE_FAILURE_REPLY.to_string()
    }
}

/// True when `text` contains all three section headings in order.
pub fn has_answer_sections(text: &str) -> bool {
    let mut from = 0;
    for heading in ANSWER_SECTIONS {
        match text[from..].find(heading) {
            Some(at) => from += at + heading.len(),
            None => return false,
        }
    }
    true
}
