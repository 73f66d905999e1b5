//! `$touser`, `$param`, `$!param` and attribute substitution.

use crate::config::ResolverConfig;
use crate::context::ResolutionContext;

use super::info::NOT_AVAILABLE;

/// The addressed user: a single-word parameter, else the sender.
pub fn to_user(config: &ResolverConfig, ctx: &ResolutionContext) -> String {
    let param = ctx.param().trim();
    let target = param.strip_prefix('@').unwrap_or(param);
    if target.is_empty() || target.contains(char::is_whitespace) {
        config.mention(&ctx.sender.username)
    } else {
        config.mention(target)
    }
}

pub fn param_or_na(ctx: &ResolutionContext) -> String {
    if ctx.has_param() {
        ctx.param().to_string()
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Replace `$sender`, then every extra attribute as `$key`.
pub fn substitute_attributes(
    buffer: String,
    config: &ResolverConfig,
    ctx: &ResolutionContext,
) -> String {
    let sender = if ctx.force_without_at {
        ctx.sender.username.clone()
    } else {
        config.mention(&ctx.sender.username)
    };
    let mut buffer = buffer.replace("$sender", &sender);
    for (key, value) in &ctx.attributes {
        buffer = buffer.replace(&format!("${key}"), value);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Sender;

    fn ctx(param: Option<&str>) -> ResolutionContext {
        ResolutionContext::builder()
            .sender(Sender::new("viewer123"))
            .maybe_param(param.map(str::to_string))
            .build()
    }

    #[test]
    fn single_word_param_is_addressed() {
        let config = ResolverConfig::default();
        assert_eq!(to_user(&config, &ctx(Some("@friend"))), "@friend");
        assert_eq!(to_user(&config, &ctx(Some("friend"))), "@friend");
    }

    #[test]
    fn sender_is_addressed_otherwise() {
        let config = ResolverConfig::builder().show_with_at(false).build();
        assert_eq!(to_user(&config, &ctx(None)), "viewer123");
        assert_eq!(to_user(&config, &ctx(Some("two words"))), "viewer123");
    }

    #[test]
    fn missing_param_is_not_available() {
        assert_eq!(param_or_na(&ctx(None)), "n/a");
        assert_eq!(param_or_na(&ctx(Some(""))), "n/a");
        assert_eq!(param_or_na(&ctx(Some("x"))), "x");
    }

    #[test]
    fn attributes_follow_sender() {
        let config = ResolverConfig::default();
        let ctx = ResolutionContext::builder()
            .sender(Sender::new("viewer123"))
            .attributes(BTreeMap::from([("points".to_string(), "5".to_string())]))
            .force_without_at(true)
            .build();
        assert_eq!(
            substitute_attributes("$sender has $points".to_string(), &config, &ctx),
            "viewer123 has 5"
        );
    }
}
