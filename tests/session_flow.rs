use pocket_sre::config::SessionConfig;
use pocket_sre::llm::{GenerateFuture, Generator, PromptMessage, ScriptedGenerator};
use pocket_sre::session::{
    InMemorySessionStore, SessionController, SessionStore, SqliteSessionStore, TurnOutcome,
    TurnRole, has_answer_sections,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const INCIDENT_5XX: &str = r#"{"type":"5xx_errors","severity_guess":"high","timeframe":"since 10am","symptoms":["502 everywhere"],"stack_hints":["nginx"]}"#;
const FINAL: &str = r#"{"action":"final"}"#;
const ANSWER: &str = "RUNBOOK (3-7 steps)\n1. Check upstream health\n2. Roll back the last deploy\n3. Watch error rate\n\nLIKELY ROOT CAUSES (3 items, each with confidence like 0.55)\n- bad deploy (0.55)\n- origin saturation (0.25)\n- DNS (0.10)\n\nSTATUS UPDATE (1-2 paragraphs)\nWe are investigating elevated 502 responses.";
const MEMORY: &str = r#"{"profile":{"techStack":["nginx","kubernetes"],"domain":"shop.example.com","notes":"prefers rollbacks"},"lastIncidentSummary":"502s after a deploy at 10am."}"#;

fn clarify(question: &str) -> String {
    format!(r#"{{"action":"clarify","question":"{question}"}}"#)
}

fn controller_with(
    generator: &Arc<ScriptedGenerator>,
    store: Arc<dyn SessionStore>,
) -> SessionController {
    SessionController::new(
        Arc::clone(generator) as Arc<dyn Generator>,
        store,
        SessionConfig::default(),
    )
    .expect("controller should build")
}

fn in_memory(generator: &Arc<ScriptedGenerator>) -> (Arc<InMemorySessionStore>, SessionController) {
    let store = Arc::new(InMemorySessionStore::new());
    let controller = controller_with(generator, Arc::clone(&store) as Arc<dyn SessionStore>);
    (store, controller)
}

#[tokio::test]
async fn outage_report_gets_structured_answer() {
    let generator = Arc::new(ScriptedGenerator::from_texts([INCIDENT_5XX, FINAL, ANSWER, MEMORY]));
    let (_store, controller) = in_memory(&generator);

    let reply = controller
        .handle_turn("shop", "site is down, 502s everywhere since 10am")
        .await
        .expect("turn should succeed");

    assert_eq!(reply.outcome, TurnOutcome::Final);
    assert!(has_answer_sections(&reply.reply));
    assert_eq!(reply.profile.tech_stack, vec!["nginx", "kubernetes"]);
    assert_eq!(reply.profile.domain, "shop.example.com");

    let body = serde_json::to_value(&reply).unwrap();
    assert!(body["profile"].is_object());
    assert!(body.get("outcome").is_none());
}

#[tokio::test]
async fn first_clarify_returns_question_verbatim() {
    let generator = Arc::new(ScriptedGenerator::from_texts([
        INCIDENT_5XX.to_string(),
        clarify("Which region is affected?"),
    ]));
    let (_store, controller) = in_memory(&generator);

    let reply = controller
        .handle_turn("shop", "checkout is failing")
        .await
        .unwrap();
    assert_eq!(reply.reply, "Which region is affected?");

    let state = controller.snapshot("shop").await.unwrap().unwrap();
    assert_eq!(state.clarifying_questions_asked, 1);
    assert_eq!(state.messages.len(), 2);
    let assistant_turns = state
        .messages
        .iter()
        .filter(|turn| turn.role == TurnRole::Assistant)
        .count();
    assert_eq!(assistant_turns, 1);

    let stored = serde_json::to_value(&state).unwrap();
    assert_eq!(stored["clarifyingQuestionsAsked"], 1);
}

#[tokio::test]
async fn third_clarify_is_forced_to_final() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (_store, controller) = in_memory(&generator);

    let mut outcomes = Vec::new();
    for turn in 0..3 {
        generator.push_ok(INCIDENT_5XX);
        generator.push_ok(clarify("Anything else?"));
        if turn == 2 {
            generator.push_ok(ANSWER);
            generator.push_ok(MEMORY);
        }
        let reply = controller.handle_turn("shop", "still down").await.unwrap();
        outcomes.push(reply.outcome);

        let state = controller.snapshot("shop").await.unwrap().unwrap();
        assert!(state.clarifying_questions_asked <= 2);
    }

    assert_eq!(
        outcomes,
        vec![TurnOutcome::Clarify, TurnOutcome::Clarify, TurnOutcome::Final]
    );
    let state = controller.snapshot("shop").await.unwrap().unwrap();
    assert_eq!(state.clarifying_questions_asked, 0);
    assert_eq!(state.last_incident_summary, "502s after a deploy at 10am.");
    assert_eq!(generator.remaining(), 0);
}

#[tokio::test]
async fn oversized_message_is_stored_clamped() {
    let generator = Arc::new(ScriptedGenerator::from_texts([
        INCIDENT_5XX.to_string(),
        clarify("Which service?"),
    ]));
    let (_store, controller) = in_memory(&generator);

    let message = "x".repeat(5000);
    controller.handle_turn("shop", &message).await.unwrap();

    let state = controller.snapshot("shop").await.unwrap().unwrap();
    let stored = &state.messages[0].content;
    assert_eq!(stored.chars().count(), 4000);
    assert!(stored.ends_with('…'));
}

#[tokio::test]
async fn history_stays_bounded_across_many_turns() {
    let generator = Arc::new(ScriptedGenerator::default());
    let (_store, controller) = in_memory(&generator);
    let policy = controller.policy().clone();

    for turn in 0..15 {
        let before = controller
            .snapshot("long")
            .await
            .unwrap()
            .map_or(0, |state| state.messages.len());
        if before + 1 > policy.max_messages_before_summary {
            generator.push_ok(format!("Summary after turn {turn}."));
        }
        generator.push_ok(INCIDENT_5XX);
        generator.push_ok(FINAL);
        generator.push_ok(ANSWER);
        generator.push_ok(MEMORY);

        controller
            .handle_turn("long", &format!("update {turn}"))
            .await
            .unwrap();

        let state = controller.snapshot("long").await.unwrap().unwrap();
        assert!(state.messages.len() <= policy.max_messages_before_summary + 1);
        assert!(state.summary.chars().count() <= 1400);
    }

    let state = controller.snapshot("long").await.unwrap().unwrap();
    assert!(state.summary.starts_with("Summary after turn"));
    assert_eq!(generator.remaining(), 0);
}

/// Sleeps before every reply so a turn is still in flight while another
/// task runs.
struct SlowGenerator {
    inner: Arc<ScriptedGenerator>,
    delay: Duration,
}

impl Generator for SlowGenerator {
    fn name(&self) -> &str {
        "slow"
    }

    fn generate<'a>(&'a self, messages: &'a [PromptMessage]) -> GenerateFuture<'a> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.generate(messages).await
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_turns_on_one_session_are_serialized() {
    let scripted = Arc::new(ScriptedGenerator::from_texts([
        INCIDENT_5XX.to_string(),
        clarify("First?"),
        INCIDENT_5XX.to_string(),
        clarify("Second?"),
    ]));
    let generator = Arc::new(SlowGenerator {
        inner: Arc::clone(&scripted),
        delay: Duration::from_millis(50),
    });
    let store = Arc::new(InMemorySessionStore::new());
    let controller = Arc::new(
        SessionController::new(
            generator as Arc<dyn Generator>,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            SessionConfig::default(),
        )
        .unwrap(),
    );

    let a = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.handle_turn("shared", "one").await })
    };
    let b = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.handle_turn("shared", "two").await })
    };
    let (a, b) = tokio::join!(a, b);
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    // Each turn saw the other's writes: two user and two assistant turns.
    let state = controller.snapshot("shared").await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 4);
    assert_eq!(state.clarifying_questions_asked, 2);
    assert_eq!(scripted.remaining(), 0);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let generator = Arc::new(ScriptedGenerator::from_texts([
        INCIDENT_5XX.to_string(),
        clarify("Which region?"),
    ]));
    let (store, controller) = in_memory(&generator);

    controller.handle_turn("alpha", "api is slow").await.unwrap();

    assert!(controller.snapshot("beta").await.unwrap().is_none());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn sqlite_state_survives_reopen() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("state").join("sessions.db");

    let generator = Arc::new(ScriptedGenerator::from_texts([
        INCIDENT_5XX.to_string(),
        clarify("Which region is affected?"),
    ]));
    {
        let store = SqliteSessionStore::open(&path).await.expect("open store");
        let controller = controller_with(&generator, Arc::new(store));
        controller.handle_turn("shop", "502s on checkout").await.unwrap();
    }

    generator.push_ok(INCIDENT_5XX);
    generator.push_ok(FINAL);
    generator.push_ok(ANSWER);
    generator.push_ok(MEMORY);

    let store = SqliteSessionStore::open(&path).await.expect("reopen store");
    let controller = controller_with(&generator, Arc::new(store));

    let before = controller.snapshot("shop").await.unwrap().unwrap();
    assert_eq!(before.clarifying_questions_asked, 1);
    assert_eq!(before.messages.len(), 2);

    let reply = controller.handle_turn("shop", "us-east-1").await.unwrap();
    assert_eq!(reply.outcome, TurnOutcome::Final);

    let after = controller.snapshot("shop").await.unwrap().unwrap();
    assert_eq!(after.messages.len(), 4);
    assert_eq!(after.clarifying_questions_asked, 0);
    assert_eq!(after.profile.domain, "shop.example.com");
}
