//! Full question-answer turns through the agent, session, and toolkit.
//!
//! The LLM is scripted and the database is mocked, so these exercise the
//! wiring between the pieces rather than any one of them.

use querybuddy::agent::{Agent, AgentEvent};
use querybuddy::db::{DatabaseHandle, FailingDatabaseHandle, MockDatabaseHandle, Value};
use querybuddy::error::AppError;
use querybuddy::llm::{LlmResponse, MockLlmClient};
use querybuddy::session::{Session, Speaker, GREETING};
use std::sync::Arc;
use tokio::sync::mpsc;

fn users_handle() -> Arc<dyn DatabaseHandle> {
    Arc::new(
        MockDatabaseHandle::new()
            .with_table("users", &[("id", "integer"), ("email", "text")])
            .with_scalar_result("count(*)", "count", Value::Int(42)),
    )
}

#[tokio::test]
async fn test_successful_turn_updates_transcript() {
    let llm = MockLlmClient::new()
        .with_scripted_query("call_1", "SELECT COUNT(*) FROM users")
        .with_scripted(LlmResponse::text("There are 42 users."));
    let agent = Agent::new(users_handle(), Arc::new(llm));
    let mut session = Session::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.begin_turn("How many users are there?");
    let outcome = agent.ask("How many users are there?", &tx).await;
    session.complete_turn(&outcome);

    let entries = session.transcript().entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].content, GREETING);
    assert_eq!(entries[1].speaker, Speaker::User);
    assert_eq!(entries[2].content, "There are 42 users.");

    // The tool round was streamed while the turn ran.
    let first = rx.try_recv().unwrap();
    assert!(matches!(first, AgentEvent::ToolCall { ref name, .. } if name == "run_sql_query"));
    let second = rx.try_recv().unwrap();
    assert!(matches!(second, AgentEvent::ToolResult { ref summary, .. } if summary == "1 row(s)"));
}

#[tokio::test]
async fn test_failed_turn_keeps_question_only() {
    let llm = MockLlmClient::failing("Rate limited. Try again later.");
    let agent = Agent::new(users_handle(), Arc::new(llm));
    let mut session = Session::new();
    let (tx, _rx) = mpsc::unbounded_channel();

    session.begin_turn("How many users are there?");
    let outcome = agent.ask("How many users are there?", &tx).await;
    assert!(matches!(outcome, Err(AppError::Query(_))));
    session.complete_turn(&outcome);

    let entries = session.transcript().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.last().unwrap().speaker, Speaker::User);
}

#[tokio::test]
async fn test_database_error_is_fed_back_to_the_model() {
    // The tool fails, the model sees the error payload and answers anyway.
    let handle: Arc<dyn DatabaseHandle> =
        Arc::new(FailingDatabaseHandle::new("no such table: orders"));
    let llm = MockLlmClient::new()
        .with_scripted_query("call_1", "SELECT COUNT(*) FROM orders")
        .with_scripted(LlmResponse::text("I could not find an orders table."));
    let agent = Agent::new(handle, Arc::new(llm));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let answer = agent.ask("How many orders?", &tx).await.unwrap();
    assert_eq!(answer, "I could not find an orders table.");

    let _call = rx.try_recv().unwrap();
    let result = rx.try_recv().unwrap();
    match result {
        AgentEvent::ToolResult { summary, .. } => {
            assert!(summary.starts_with("error:"));
            assert!(summary.contains("no such table"));
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
}

#[tokio::test]
async fn test_turns_are_independent() {
    // The second question is answered without any memory of the first.
    let llm = MockLlmClient::new()
        .with_response("first", "Answer one.")
        .with_response("second", "Answer two.");
    let agent = Agent::new(users_handle(), Arc::new(llm));
    let mut session = Session::new();
    let (tx, _rx) = mpsc::unbounded_channel();

    for (question, expected) in [("first question", "Answer one."), ("second question", "Answer two.")] {
        session.begin_turn(question);
        let outcome = agent.ask(question, &tx).await;
        assert_eq!(outcome.as_deref().unwrap(), expected);
        session.complete_turn(&outcome);
    }

    assert_eq!(session.transcript().len(), 5);
}
