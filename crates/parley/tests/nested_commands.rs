//! Integration tests for nested commands, the recursion guard and custom
//! variables.

use std::sync::Arc;
use std::time::Duration;

use parley::{MemoryStore, ResolutionContext, Sender};
use serde_json::{Value as Json, json};
use tokio::time::sleep;

fn store(fixture: Json) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(serde_json::from_value(fixture).unwrap()))
}

fn ctx() -> ResolutionContext {
    ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .build()
}

fn ctx_with_param(param: &str) -> ResolutionContext {
    ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .param(param)
        .build()
}

fn command(name: &str, responses: &[&str]) -> Json {
    json!({
        "id": name,
        "command": name,
        "responses": responses
            .iter()
            .map(|r| json!({"response": r}))
            .collect::<Vec<_>>(),
    })
}

// =============================================================================
// Recursion guard
// =============================================================================

#[tokio::test]
async fn test_self_reference_is_expanded_once() {
    let store = store(json!({"commands": [command("!a", &["(!a)"])]}));
    let ctx = ctx();
    let result = store.resolver().resolve("(!a)", &ctx).await;
    assert_eq!(result, "");
    assert_eq!(ctx.processed.snapshot(), vec!["!a".to_string()]);
}

#[tokio::test]
async fn test_cycle_through_silent_command() {
    let store = store(json!({
        "commands": [command("!a", &["(!!b)"]), command("!b", &["(!a)"])]
    }));
    let ctx = ctx();
    let result = store.resolver().resolve("Go (!a)", &ctx).await;
    assert_eq!(result, "Go");
    assert_eq!(
        ctx.processed.snapshot(),
        vec!["!a".to_string(), "!b".to_string()]
    );
    assert!(store.replies().is_empty());
}

#[tokio::test]
async fn test_unknown_nested_command_resolves_empty() {
    let store = store(json!({}));
    assert_eq!(
        store.resolver().resolve("Before (!!nothing) after", &ctx()).await,
        "Before  after"
    );
}

// =============================================================================
// Forwarded responses
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_visible_command_forwards_responses_in_order() {
    let store = store(json!({
        "commands": [command("!hello", &["Hello $sender", "Second for $param"])]
    }));
    let result = store
        .resolver()
        .resolve("Start (!hello $param)", &ctx_with_param("friend"))
        .await;
    assert_eq!(result, "Start");

    sleep(Duration::from_secs(2)).await;
    let replies: Vec<String> = store.replies().into_iter().map(|r| r.message).collect();
    assert_eq!(
        replies,
        vec!["Hello @viewer".to_string(), "Second for friend".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_forwarded_responses_are_staggered() {
    let store = store(json!({
        "commands": [command("!hello", &["First", "Second", "Third"])]
    }));
    let result = store.resolver().resolve("(!hello)", &ctx()).await;
    assert_eq!(result, "");
    assert!(store.replies().is_empty());

    sleep(Duration::from_millis(1)).await;
    assert_eq!(store.replies().len(), 1);

    sleep(Duration::from_millis(498)).await;
    assert_eq!(store.replies().len(), 1);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(store.replies().len(), 2);

    sleep(Duration::from_millis(500)).await;
    let replies: Vec<String> = store.replies().into_iter().map(|r| r.message).collect();
    assert_eq!(replies, vec!["First", "Second", "Third"]);
}

#[tokio::test(start_paused = true)]
async fn test_silent_command_discards_responses() {
    let store = store(json!({"commands": [command("!hello", &["Hello $sender"])]}));
    let result = store.resolver().resolve("(!!hello) Done", &ctx()).await;
    assert_eq!(result, "Done");

    sleep(Duration::from_secs(2)).await;
    assert!(store.replies().is_empty());
}

// =============================================================================
// Custom variables
// =============================================================================

#[tokio::test]
async fn test_variable_read() {
    let store = store(json!({"variables": [{"name": "$_score", "value": "3"}]}));
    assert_eq!(
        store.resolver().resolve("Score: $_score", &ctx()).await,
        "Score: 3"
    );
}

#[tokio::test]
async fn test_verbose_write_replies() {
    let store = store(json!({
        "translations": {"filters.setVariable": "$variable set to $value"},
        "variables": [{"name": "$_score", "value": "3"}]
    }));
    let result = store
        .resolver()
        .resolve("Score: $_score", &ctx_with_param("10"))
        .await;
    assert_eq!(result, "Score: 10");
    assert_eq!(store.variable("$_score").as_deref(), Some("10"));
    let replies: Vec<String> = store.replies().into_iter().map(|r| r.message).collect();
    assert_eq!(replies, vec!["$_score set to 10".to_string()]);
}

#[tokio::test]
async fn test_custom_response_write() {
    let store = store(json!({
        "variables": [{
            "name": "$_mood",
            "value": "calm",
            "response": {"mode": "custom", "text": "Mood is now $value"}
        }]
    }));
    let result = store
        .resolver()
        .resolve("Mood: $_mood", &ctx_with_param("happy"))
        .await;
    assert_eq!(result, "");
    let replies: Vec<String> = store.replies().into_iter().map(|r| r.message).collect();
    assert_eq!(replies, vec!["Mood is now happy".to_string()]);
}

#[tokio::test]
async fn test_quiet_write_returns_current_value() {
    let store = store(json!({"variables": [{"name": "$_score", "value": "3"}]}));
    assert_eq!(
        store
            .resolver()
            .resolve("Now $!_score", &ctx_with_param("7"))
            .await,
        "Now 7"
    );
    assert!(store.replies().is_empty());
}

#[tokio::test]
async fn test_silent_write_blanks_response() {
    let store = store(json!({"variables": [{"name": "$_score", "value": "3"}]}));
    assert_eq!(
        store
            .resolver()
            .resolve("Saved $!!_score", &ctx_with_param("9"))
            .await,
        ""
    );
    assert_eq!(store.variable("$_score").as_deref(), Some("9"));
}

#[tokio::test]
async fn test_pass_through_of_eval_variable() {
    let store = store(json!({
        "variables": [{
            "name": "$_uptime",
            "value": "1h",
            "eval": true,
            "response": {"mode": "pass_through"}
        }]
    }));
    assert_eq!(
        store
            .resolver()
            .resolve("Up $_uptime", &ctx_with_param("2h"))
            .await,
        "Up 1h"
    );
}
