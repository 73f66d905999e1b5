//! Integration tests for resolving templates through the stage pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use parley::{MemoryStore, ResolutionContext, Sender};
use serde_json::{Value as Json, json};

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

async fn resolve(store: &Arc<MemoryStore>, template: &str, ctx: &ResolutionContext) -> String {
    store.resolver().resolve(template, ctx).await
}

// =============================================================================
// Pipeline
// =============================================================================

#[tokio::test]
async fn test_template_without_placeholders_is_unchanged() {
    let store = store(json!({}));
    let template = "  Just a plain message, nothing to see.  ";
    assert_eq!(resolve(&store, template, &ctx()).await, template);
}

#[tokio::test]
async fn test_entities_are_decoded() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "Fish &amp; chips &#38; more", &ctx()).await,
        "Fish & chips & more"
    );
}

#[tokio::test]
async fn test_named_html5_entities_are_decoded() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "It&rsquo;s &laquo;caf&eacute;&raquo; time", &ctx()).await,
        "It\u{2019}s \u{ab}caf\u{e9}\u{bb} time"
    );
}

#[tokio::test]
async fn test_empty_required_value_clears_message() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "Hi $param, welcome", &ctx()).await, "");
}

#[tokio::test]
async fn test_cleared_message_skips_later_stages() {
    let store = store(json!({
        "http": {"https://api.test/x": {"status": 200, "body": "\"pong\""}}
    }));
    let result = resolve(
        &store,
        "(onlineonly) (api._response) (api|https://api.test/x)",
        &ctx(),
    )
    .await;
    assert_eq!(result, "");
}

// =============================================================================
// Parameters and attributes
// =============================================================================

#[tokio::test]
async fn test_touser_addresses_param() {
    let store = store(json!({}));
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("someone"))
        .param("viewer123")
        .attributes(BTreeMap::from([("points".to_string(), "5".to_string())]))
        .build();
    assert_eq!(
        resolve(&store, "Hello $touser, you have $points points", &ctx).await,
        "Hello @viewer123, you have 5 points"
    );
}

#[tokio::test]
async fn test_touser_falls_back_to_sender() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "Hi $touser", &ctx()).await, "Hi @viewer");
    assert_eq!(
        resolve(&store, "Hi $touser", &ctx_with_param("two words")).await,
        "Hi @viewer"
    );
}

#[tokio::test]
async fn test_optional_param_is_not_available() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "Target: $!param", &ctx()).await, "Target: n/a");
}

#[tokio::test]
async fn test_sender_without_at() {
    let store = store(json!({}));
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .force_without_at(true)
        .build();
    assert_eq!(resolve(&store, "Bye $sender", &ctx).await, "Bye viewer");
}

#[tokio::test]
async fn test_mentions_respect_config() {
    let store = store(json!({"config": {"show_with_at": false}}));
    assert_eq!(resolve(&store, "Bye $sender", &ctx()).await, "Bye viewer");
}

// =============================================================================
// Conditionals and math
// =============================================================================

#[tokio::test]
async fn test_conditional_without_param() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "(if $param>2|big|small)", &ctx()).await,
        "small"
    );
}

#[tokio::test]
async fn test_conditional_with_param() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "(if $param>2|big|small)", &ctx_with_param("5")).await,
        "big"
    );
}

#[tokio::test]
async fn test_conditional_without_branches_is_left() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "(if true) ok", &ctx()).await, "(if true) ok");
}

#[tokio::test]
async fn test_math_example() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "(math.2+2)", &ctx()).await, "4");
}

#[tokio::test]
async fn test_math_with_variable() {
    let store = store(json!({
        "variables": [{"name": "$_points", "value": "7"}]
    }));
    assert_eq!(
        resolve(&store, "Double: (math.$_points*2)", &ctx()).await,
        "Double: 14"
    );
}

#[tokio::test]
async fn test_invalid_math_clears_message() {
    let store = store(json!({}));
    assert_eq!(resolve(&store, "Result (math.2+)", &ctx()).await, "");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_long_parameter_chain_in_math_clears_message() {
    let store = store(json!({}));
    for param in [vec!["1"; 2_000].join("^"), vec!["1"; 200_000].join("+")] {
        assert_eq!(
            resolve(&store, "Result (math.$param)", &ctx_with_param(&param)).await,
            ""
        );
    }
}

// =============================================================================
// Stream state and events
// =============================================================================

#[tokio::test]
async fn test_online_gate_blanks_when_closed() {
    let store = store(json!({"stream": {"online": false}}));
    assert_eq!(resolve(&store, "(onlineonly) Live!", &ctx()).await, "");
    assert_eq!(
        resolve(&store, "(offlineonly) Back later", &ctx()).await,
        "Back later"
    );
}

#[tokio::test]
async fn test_online_gate_opens_when_live() {
    let store = store(json!({"stream": {"online": true}}));
    assert_eq!(resolve(&store, "(onlineonly) Live!", &ctx()).await, "Live!");
}

#[tokio::test]
async fn test_stats_tokens() {
    let store = store(json!({
        "stream": {"stats": {"game": "Chess", "viewers": 12}}
    }));
    assert_eq!(
        resolve(&store, "$game with $viewers viewers, $title", &ctx()).await,
        "Chess with 12 viewers, n/a"
    );
}

#[tokio::test]
async fn test_latest_events() {
    let store = store(json!({
        "events": [
            {"kind": "follow", "username": "fan1", "timestamp": "2026-01-01T00:00:00Z"},
            {"kind": "follow", "username": "fan2", "timestamp": "2026-02-01T00:00:00Z"},
            {"kind": "resub", "username": "sub1", "timestamp": "2026-01-15T00:00:00Z"},
            {
                "kind": "tip",
                "username": "tipper",
                "timestamp": "2026-01-10T00:00:00Z",
                "values": {"amount": 4.5, "currency": "EUR", "message": "gg"}
            }
        ]
    }));
    assert_eq!(
        resolve(&store, "Thanks $latestFollower and $latestSubscriber", &ctx()).await,
        "Thanks fan2 and sub1"
    );
    assert_eq!(
        resolve(
            &store,
            "$latestTip: $latestTipAmount $latestTipCurrency ($latestTipMessage)",
            &ctx()
        )
        .await,
        "tipper: 4.50 EUR (gg)"
    );
    assert_eq!(resolve(&store, "Cheer: $latestCheer", &ctx()).await, "Cheer: n/a");
}

#[tokio::test]
async fn test_top_tip_uses_exchanged_amount() {
    let store = store(json!({
        "rates": {"EUR": 2.0},
        "events": [
            {
                "kind": "tip",
                "username": "euro",
                "timestamp": "2026-01-01T00:00:00Z",
                "values": {"amount": 5.0, "currency": "EUR"}
            },
            {
                "kind": "tip",
                "username": "dollar",
                "timestamp": "2026-01-02T00:00:00Z",
                "values": {"amount": 8.0, "currency": "USD"}
            }
        ]
    }));
    assert_eq!(
        resolve(
            &store,
            "$toptip.overall.username $toptip.overall.amount $toptip.overall.currency",
            &ctx()
        )
        .await,
        "euro 5.00 EUR"
    );
    assert_eq!(
        resolve(&store, "Top: $toptip.overall.username!", &ctx()).await,
        "Top: euro!"
    );
}

#[tokio::test]
async fn test_top_tip_of_offline_stream_clears() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "Top: $toptip.stream.username", &ctx()).await,
        ""
    );
}

#[tokio::test]
async fn test_now_playing() {
    let store = store(json!({
        "spotify": {"song": "Song", "artist": "Band"},
        "translations": {"songs.not-playing": "nothing"}
    }));
    assert_eq!(
        resolve(&store, "Now: $spotifySong / $ytSong", &ctx()).await,
        "Now: Song - Band / nothing"
    );
}

#[tokio::test]
async fn test_game_and_status_fallback() {
    let store = store(json!({"stream": {"stats": {"title": "Speedruns"}}}));
    assert_eq!(
        resolve(&store, "(game) / (status)", &ctx()).await,
        "n/a / Speedruns"
    );
}

// =============================================================================
// Random picks
// =============================================================================

#[tokio::test]
async fn test_random_pick_without_candidates() {
    let store = store(json!({
        "config": {"bot_username": "parleybot"},
        "users": [{"username": "ParleyBot", "is_online": true}]
    }));
    assert_eq!(
        resolve(&store, "Winner: (random.online.viewer)", &ctx()).await,
        "Winner: unknown"
    );
}

#[tokio::test]
async fn test_random_pick_respects_role() {
    let store = store(json!({
        "users": [
            {"username": "alice", "is_online": true, "is_follower": true},
            {"username": "bob", "is_online": true},
            {"username": "carol", "is_follower": true, "is_ignored": true}
        ]
    }));
    assert_eq!(
        resolve(&store, "(random.online.follower)", &ctx()).await,
        "alice"
    );
    assert_eq!(resolve(&store, "(random.follower)", &ctx()).await, "alice");
}

#[tokio::test]
async fn test_random_number_from_param() {
    let store = store(json!({}));
    assert_eq!(
        resolve(&store, "(random.number-4-to-max)", &ctx_with_param("4")).await,
        "4"
    );
    assert_eq!(
        resolve(&store, "Roll: (random.number-1-to-max)", &ctx()).await,
        "Roll: 0"
    );
}

// =============================================================================
// Prices, counts and queries
// =============================================================================

#[tokio::test]
async fn test_price_of_command() {
    let store = store(json!({"prices": [{"command": "!hug", "price": 5}]}));
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .command("!hug")
        .build();
    assert_eq!(
        resolve(&store, "It costs (price)", &ctx).await,
        "It costs 5 points"
    );
    assert_eq!(resolve(&store, "Free: (price)", &self::ctx()).await, "Free: 0 points");
}

#[tokio::test]
async fn test_usage_counts() {
    let store = store(json!({"usage": {"!hi": 3}}));
    let ctx = ResolutionContext::builder()
        .sender(Sender::new("viewer"))
        .command("!hi")
        .build();
    assert_eq!(
        resolve(&store, "$count('!hi') and $count", &ctx).await,
        "3 and 3"
    );
    assert_eq!(resolve(&store, "$count('!nope')", &ctx).await, "0");
}

#[tokio::test]
async fn test_query_encoding() {
    let store = store(json!({}));
    assert_eq!(
        resolve(
            &store,
            "https://x.test/?q=$querystring (url|a b)",
            &ctx_with_param("a b&c")
        )
        .await,
        "https://x.test/?q=a%20b%26c a%20b"
    );
}

// =============================================================================
// Channels and API calls
// =============================================================================

#[tokio::test]
async fn test_stream_lookup() {
    let store = store(json!({
        "channels": {"someone": {"game": "Chess", "viewers": 42}}
    }));
    assert_eq!(
        resolve(
            &store,
            "(stream|@Someone|game) (stream|someone|viewers) (stream|someone|title)",
            &ctx()
        )
        .await,
        "Chess 42 n/a"
    );
    assert_eq!(
        resolve(&store, "Viewers: (stream|nobody|viewers)", &ctx()).await,
        "Viewers: 0"
    );
}

#[tokio::test]
async fn test_api_projection() {
    let store = store(json!({
        "http": {
            "https://api.test/weather?city=x&units=m": {
                "status": 200,
                "body": "{\"temp\": 21, \"tags\": [{\"name\": \"sunny\"}]}"
            }
        }
    }));
    assert_eq!(
        resolve(
            &store,
            "Temp (api.temp)C, (api.tags[0].name) (api.missing) (api|https://api.test/weather?city=x&amp;units=m)",
            &ctx()
        )
        .await,
        "Temp 21C, sunny core.api.not-available"
    );
}

#[tokio::test]
async fn test_api_whole_response() {
    let store = store(json!({
        "http": {"https://api.test/ping": {"status": 200, "body": "\"pong\""}}
    }));
    assert_eq!(
        resolve(&store, "Reply: (api._response) (api|https://api.test/ping)", &ctx()).await,
        "Reply: pong"
    );
}

#[tokio::test]
async fn test_api_failure_replaces_message() {
    let store = store(json!({
        "translations": {"core.api.error": "API is down"},
        "http": {"https://api.test/x": {"status": 500, "body": ""}}
    }));
    assert_eq!(
        resolve(&store, "Value (api.x) (api|https://api.test/x)", &ctx()).await,
        "API is down"
    );
    assert_eq!(
        resolve(&store, "Value (api.x) (api|https://api.test/unknown)", &ctx()).await,
        "API is down"
    );
}
