//! Integration tests for `(list.…)` placeholders.

use std::sync::Arc;

use parley::{MemoryStore, ResolutionContext, Sender};
use serde_json::json;

fn store() -> Arc<MemoryStore> {
    let fixture = json!({
        "translations": {"core.months": "month|months"},
        "permissions": [
            {"id": "mods-id", "name": "Moderators"},
            {"id": "viewers-id", "name": "Viewers"}
        ],
        "aliases": [
            {"alias": "!hug"},
            {"alias": "!dance", "group": "fun"}
        ],
        "prices": [{"command": "!hug", "price": 5}],
        "cooldowns": [{"name": "!hug", "millis": 30000}, {"name": "!dance", "millis": 1500}],
        "ranks": [
            {"rank": "Regular", "value": 10, "kind": "viewer"},
            {"rank": "Newbie", "value": 0, "kind": "viewer"},
            {"rank": "Fan", "value": 3, "kind": "follower"},
            {"rank": "Loyal", "value": 1, "kind": "subscriber"}
        ],
        "core_commands": [
            {"id": "c1", "command": "!uptime", "permission": "viewers-id"},
            {"id": "c2", "command": "!title", "permission": "mods-id"},
            {"id": "c3", "command": "!game", "permission": "viewers-id"}
        ],
        "command_permissions": {"c1": "mods-id"},
        "commands": [
            {"id": "1", "command": "!lurk", "responses": [{"response": "lurking", "permission": "viewers-id"}]},
            {"id": "2", "command": "!ban", "responses": [{"response": "banned", "permission": "mods-id"}]}
        ]
    });
    Arc::new(MemoryStore::new(serde_json::from_value(fixture).unwrap()))
}

async fn resolve(template: &str) -> String {
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .build();
    store().resolver().resolve(template, &ctx).await
}

// =============================================================================
// Aliases and commands
// =============================================================================

#[tokio::test]
async fn test_aliases_with_prices() {
    assert_eq!(
        resolve("Aliases: (list.alias)").await,
        "Aliases: dance, hug(5 points)"
    );
    assert_eq!(
        resolve("(list.!alias)").await,
        "!dance, !hug(5 points)"
    );
}

#[tokio::test]
async fn test_alias_groups() {
    assert_eq!(resolve("(list.alias|fun)").await, "dance");
    assert_eq!(resolve("(list.alias|)").await, "hug(5 points)");
}

#[tokio::test]
async fn test_custom_commands() {
    assert_eq!(resolve("(list.command)").await, "ban, lurk");
    assert_eq!(resolve("(list.!command.moderators)").await, "!ban");
    assert_eq!(resolve("Nothing: (list.command.nobody)").await, "Nothing:");
}

#[tokio::test]
async fn test_core_commands_use_effective_permission() {
    assert_eq!(resolve("(list.!core.moderators)").await, "!title, !uptime");
    assert_eq!(resolve("(list.core.viewers)").await, "game");
}

#[tokio::test]
async fn test_core_commands_need_permission() {
    assert_eq!(resolve("Core: (list.core)").await, "");
    assert_eq!(resolve("Core: (list.core.nobody)").await, "");
}

// =============================================================================
// Cooldowns, prices and ranks
// =============================================================================

#[tokio::test]
async fn test_cooldowns() {
    assert_eq!(resolve("(list.cooldown)").await, "!dance: 1.5s, !hug: 30s");
}

#[tokio::test]
async fn test_prices() {
    assert_eq!(resolve("(list.price)").await, "!hug (5 points)");
}

#[tokio::test]
async fn test_ranks() {
    assert_eq!(resolve("(list.ranks)").await, "Newbie (0h), Regular (10h)");
    assert_eq!(resolve("(list.ranks.follow)").await, "Fan (3 months)");
    assert_eq!(resolve("(list.ranks.sub)").await, "Loyal (1 month)");
}

// =============================================================================
// Empty and unknown systems
// =============================================================================

#[tokio::test]
async fn test_empty_listing_keeps_message() {
    let store = Arc::new(MemoryStore::from_json("{}").unwrap());
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .build();
    assert_eq!(
        store
            .resolver()
            .resolve("Cooldowns: (list.cooldown)", &ctx)
            .await,
        "Cooldowns:"
    );
}

#[tokio::test]
async fn test_unknown_system_clears_message() {
    assert_eq!(resolve("Aliases: (list.alais)").await, "");
}
