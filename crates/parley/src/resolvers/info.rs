//! `$toptip.<scope>.<field>`, `(game)` and `(status)`.

use tracing::warn;

use crate::model::{EventKind, EventRecord};
use crate::pipeline::Resolver;

/// Fallback for values that are unknown.
pub const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipScope {
    Overall,
    /// Only tips received since the stream went online.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipField {
    Username,
    Amount,
    Message,
    Currency,
}

/// Parse `$toptip.stream.amount` into its scope and field.
pub fn parse_top_tip(matched: &str) -> Option<(TipScope, TipField)> {
    let rest = matched.strip_prefix("$toptip.")?;
    let (scope, field) = rest.split_once('.')?;
    let scope = match scope {
        "overall" => TipScope::Overall,
        "stream" => TipScope::Stream,
        _ => return None,
    };
    let field = match field {
        "username" => TipField::Username,
        "amount" => TipField::Amount,
        "message" => TipField::Message,
        "currency" => TipField::Currency,
        _ => return None,
    };
    Some((scope, field))
}

pub(crate) async fn top_tip(resolver: &Resolver, matched: &str) -> String {
    let Some((scope, field)) = parse_top_tip(matched) else {
        return String::new();
    };
    let collaborators = resolver.collaborators();
    let mut tips = match collaborators.events.events(EventKind::Tip).await {
        Ok(tips) => tips,
        Err(e) => {
            warn!(error = %e, "failed to load tips");
            return String::new();
        }
    };

    if scope == TipScope::Stream {
        let since = if collaborators.stream.is_online().await {
            collaborators.stream.online_since().await
        } else {
            None
        };
        let Some(since) = since else {
            return String::new();
        };
        tips.retain(|tip| tip.timestamp >= since);
    }

    let main = collaborators.currency.main_currency();
    let value_of = |tip: &EventRecord| {
        collaborators.currency.exchange(
            tip.values.amount.unwrap_or_default(),
            tip.values.currency.as_deref().unwrap_or(&main),
            &main,
        )
    };
    let Some(top) = tips
        .iter()
        .max_by(|a, b| value_of(a).total_cmp(&value_of(b)))
    else {
        return String::new();
    };

    match field {
        TipField::Username => top.username.clone(),
        TipField::Amount => format!("{:.2}", top.values.amount.unwrap_or_default()),
        TipField::Message => top.values.message.clone().unwrap_or_default(),
        TipField::Currency => top.values.currency.clone().unwrap_or_default(),
    }
}

pub(crate) async fn game(resolver: &Resolver) -> String {
    or_not_available(resolver.collaborators().stream.stats().await.game)
}

pub(crate) async fn status(resolver: &Resolver) -> String {
    or_not_available(resolver.collaborators().stream.stats().await.title)
}

fn or_not_available(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_tip_selectors() {
        assert_eq!(
            parse_top_tip("$toptip.stream.amount"),
            Some((TipScope::Stream, TipField::Amount))
        );
        assert_eq!(parse_top_tip("$toptip.week.amount"), None);
        assert_eq!(parse_top_tip("$toptip.overall"), None);
    }
}
