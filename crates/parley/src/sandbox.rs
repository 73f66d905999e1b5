//! `(eval …)`: sandboxed script expressions.
//!
//! The expression text is scanned before evaluation so that only the data
//! it mentions is loaded. The script sees nothing but the context built here
//! plus the `_` and `Math` namespaces.

use std::collections::BTreeMap;

use parley_script::{EvalError, Scope, ScriptError, Value, evaluate_with_depth};
use rand::seq::SliceRandom;
use rand::{Rng, thread_rng};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::context::ResolutionContext;
use crate::error::SandboxError;
use crate::model::{UserFilter, UserRecord};
use crate::pipeline::Resolver;

/// A `url("…")` call found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLiteral {
    /// The call as written, e.g. `url('https://x')`.
    pub text: String,
    pub url: String,
}

/// Data sources an expression refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Needs {
    pub users: bool,
    pub random: bool,
    pub online: bool,
    pub urls: Vec<UrlLiteral>,
}

/// Decide which data an expression needs from its text alone.
pub fn scan(expression: &str) -> Needs {
    let without_numeric_random = expression.replace("Math.random", "").replace("_.random", "");
    Needs {
        users: expression.contains("users"),
        random: without_numeric_random.contains("random"),
        online: expression.contains("online"),
        urls: url_literals(expression),
    }
}

/// Find `url("…")` and `url('…')` calls; either quote may close either.
fn url_literals(expression: &str) -> Vec<UrlLiteral> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(start) = expression[offset..].find("url(") {
        let call_start = offset + start;
        let after_paren = call_start + "url(".len();
        offset = after_paren;
        if !expression[after_paren..].starts_with(['"', '\'']) {
            continue;
        }
        let url_start = after_paren + 1;
        let Some(close) = closing_quote(&expression[url_start..]) else {
            continue;
        };
        let url_end = url_start + close;
        let call_end = url_end + 2;
        found.push(UrlLiteral {
            text: expression[call_start..call_end].to_string(),
            url: expression[url_start..url_end].to_string(),
        });
        offset = call_end;
    }
    found
}

/// Byte offset of the first quote followed by `)`.
fn closing_quote(text: &str) -> Option<usize> {
    text.match_indices(['"', '\''])
        .map(|(i, _)| i)
        .find(|&i| text[i + 1..].starts_with(')'))
}

/// The expression inside `(eval …)`.
pub fn expression_of(matched: &str) -> &str {
    let body = matched.strip_prefix("(eval").unwrap_or(matched);
    let body = body.strip_prefix(' ').unwrap_or(body);
    body.strip_suffix(')').unwrap_or(body)
}

/// Resolve an `(eval …)` placeholder. Failures are logged and resolve to an
/// empty string.
pub(crate) async fn resolve(resolver: &Resolver, matched: &str, ctx: &ResolutionContext) -> String {
    let expression = expression_of(matched);
    match evaluate(resolver, expression, ctx).await {
        Ok(Value::Null) => String::new(),
        Ok(value) => value.to_string(),
        Err(e) => {
            error!(expression, error = %e, "sandbox evaluation failed");
            String::new()
        }
    }
}

/// Evaluate `expression` against a freshly built sandbox context.
pub async fn evaluate(
    resolver: &Resolver,
    expression: &str,
    ctx: &ResolutionContext,
) -> Result<Value, SandboxError> {
    let needs = scan(expression);
    debug!(?needs, "building sandbox context");
    let (expression, urls) = fetch_urls(resolver, expression, &needs.urls).await?;
    let scope = build_scope(resolver, &needs, ctx, urls).await?;
    let value = evaluate_with_depth(&expression, &scope, resolver.config().max_depth)?;
    if matches!(value, Value::Number(n) if !n.is_finite()) {
        return Err(ScriptError::from(EvalError::NonFinite).into());
    }
    Ok(value)
}

/// Fetch every URL literal and rewrite it to `url.<id>`.
async fn fetch_urls(
    resolver: &Resolver,
    expression: &str,
    literals: &[UrlLiteral],
) -> Result<(String, BTreeMap<String, Value>), SandboxError> {
    let mut rewritten = expression.to_string();
    let mut bound = BTreeMap::new();
    for literal in literals {
        let response = resolver.collaborators().http.get(&literal.url).await?;
        let value = match response.json() {
            Some(data) => Value::from(json!({ "data": data, "status": response.status })),
            None => Value::String(response.body),
        };
        let id = format!("url{:05x}", thread_rng().gen_range(0..0x10_0000_u32));
        rewritten = rewritten.replacen(&literal.text, &format!("url.{id}"), 1);
        bound.insert(id, value);
    }
    Ok((rewritten, bound))
}

async fn build_scope(
    resolver: &Resolver,
    needs: &Needs,
    ctx: &ResolutionContext,
    urls: BTreeMap<String, Value>,
) -> Result<Scope, SandboxError> {
    let config = resolver.config();
    let users = &resolver.collaborators().users;

    let load_all = async {
        if needs.users || needs.random {
            users.users(&UserFilter::default()).await
        } else {
            Ok(Vec::new())
        }
    };
    let load_online = async {
        if needs.online {
            let filter = UserFilter {
                online: true,
                exclude: config.excluded_usernames(),
                exclude_ignored: true,
                ..UserFilter::default()
            };
            users.users(&filter).await
        } else {
            Ok(Vec::new())
        }
    };
    let load_sender = users.user(&ctx.sender.username);
    let (all, online, sender) = tokio::join!(load_all, load_online, load_sender);
    let all = all?;
    let online = online?;
    let sender = sender.unwrap_or_else(|e| {
        warn!(error = %e, "failed to load sender flags");
        None
    });

    let is = sender.unwrap_or_default();
    let random = json!({
        "online": {
            "viewer": sample(online.iter()),
            "follower": sample(online.iter().filter(|u| u.is_follower)),
            "subscriber": sample(online.iter().filter(|u| u.is_subscriber)),
        },
        "viewer": sample(all.iter()),
        "follower": sample(all.iter().filter(|u| u.is_follower)),
        "subscriber": sample(all.iter().filter(|u| u.is_subscriber)),
    });

    let sender_display = if config.show_with_at {
        format!("@{}", ctx.sender.username)
    } else {
        ctx.sender.username.clone()
    };

    Ok(Scope::new()
        .with(
            "users",
            Value::Array(all.iter().map(|u| Value::from(u.to_script_json())).collect()),
        )
        .with(
            "is",
            Value::from(json!({
                "follower": is.is_follower,
                "subscriber": is.is_subscriber,
                "moderator": is.is_moderator,
                "vip": is.is_vip,
                "online": is.is_online,
            })),
        )
        .with("random", Value::from(random))
        .with("sender", sender_display)
        .with("param", ctx.raw_param())
        .with("url", Value::Object(urls)))
}

fn sample<'a>(users: impl Iterator<Item = &'a UserRecord>) -> Option<String> {
    let names: Vec<&str> = users.map(|u| u.username.as_str()).collect();
    names.choose(&mut thread_rng()).map(|name| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_detects_keywords() {
        let needs = scan("_.sample(users).username");
        assert!(needs.users);
        assert!(!needs.random);
        assert!(!needs.online);

        let needs = scan("Math.random() > 0.5 ? random.online.viewer : 'x'");
        assert!(needs.random);
        assert!(needs.online);

        assert!(!scan("_.random(1, 5)").random);
    }

    #[test]
    fn scan_finds_url_literals() {
        let needs = scan(r#"url("https://a.test/x?y=1").data.name + url('https://b.test')"#);
        assert_eq!(
            needs.urls,
            vec![
                UrlLiteral {
                    text: r#"url("https://a.test/x?y=1")"#.to_string(),
                    url: "https://a.test/x?y=1".to_string(),
                },
                UrlLiteral {
                    text: "url('https://b.test')".to_string(),
                    url: "https://b.test".to_string(),
                },
            ]
        );
        assert!(scan("url.x + url(param)").urls.is_empty());
    }

    #[test]
    fn expression_is_unwrapped() {
        assert_eq!(expression_of("(eval return 1 + 1)"), "return 1 + 1");
    }
}
