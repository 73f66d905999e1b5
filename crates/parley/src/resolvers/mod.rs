//! Resolvers for every placeholder kind.
//!
//! Each stage owns a table of [`crate::PlaceholderRule`]s naming a
//! [`ResolverKind`]; [`resolve`] routes a matched placeholder to its
//! resolver. `None` means "no result" and is interpreted by the rule's
//! [`crate::EmptyPolicy`].

pub mod api;
pub mod command;
pub mod conditional;
pub mod global;
pub mod info;
pub mod list;
pub mod math;
pub mod online;
pub mod params;
pub mod price;
pub mod query;
pub mod random;
pub mod stream;
pub mod variables;

use strsim::levenshtein;

use crate::context::ResolutionContext;
use crate::pipeline::Resolver;
use crate::sandbox;

pub use command::CommandForm;
pub use online::Gate;
pub use random::{Role, UserPool};
pub use stream::ChannelField;
pub use variables::VariableForm;

/// Every kind of placeholder resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Price,
    TopTip,
    Game,
    Status,
    RandomUser(UserPool),
    RandomNumber,
    RandomBool,
    Conditional,
    Variable(VariableForm),
    Sandbox,
    ToUser,
    Param,
    ParamOrNa,
    Math,
    Online(Gate),
    CountOf,
    Count,
    Command(CommandForm),
    QueryString,
    UrlEncode,
    List,
    Stream(ChannelField),
}

/// Resolve one matched placeholder.
pub(crate) async fn resolve(
    resolver: &Resolver,
    kind: ResolverKind,
    matched: &str,
    ctx: &ResolutionContext,
) -> Option<String> {
    match kind {
        ResolverKind::Price => Some(price::price(resolver, ctx).await),
        ResolverKind::TopTip => Some(info::top_tip(resolver, matched).await),
        ResolverKind::Game => Some(info::game(resolver).await),
        ResolverKind::Status => Some(info::status(resolver).await),
        ResolverKind::RandomUser(pool) => Some(random::random_user(resolver, pool).await),
        ResolverKind::RandomNumber => Some(random::random_number(matched, ctx.raw_param())),
        ResolverKind::RandomBool => Some(random::random_bool()),
        ResolverKind::Conditional => conditional::conditional(matched, ctx.param()),
        ResolverKind::Variable(form) => variables::variable(resolver, form, matched, ctx).await,
        ResolverKind::Sandbox => Some(sandbox::resolve(resolver, matched, ctx).await),
        ResolverKind::ToUser => Some(params::to_user(resolver.config(), ctx)),
        ResolverKind::Param => Some(ctx.param().to_string()),
        ResolverKind::ParamOrNa => Some(params::param_or_na(ctx)),
        ResolverKind::Math => math::math(resolver, matched, ctx).await,
        ResolverKind::Online(gate) => online::gate(resolver, gate).await,
        ResolverKind::CountOf => Some(command::count_of(resolver, matched).await),
        ResolverKind::Count => Some(command::count(resolver, ctx).await),
        ResolverKind::Command(form) => Some(command::expand(resolver, form, matched, ctx).await),
        ResolverKind::QueryString => Some(query::query_string(ctx)),
        ResolverKind::UrlEncode => Some(query::url_encode(matched)),
        ResolverKind::List => Some(list::list(resolver, matched).await),
        ResolverKind::Stream(field) => Some(stream::lookup(resolver, field, matched).await),
    }
}

/// Strip a placeholder's fixed prefix and closing `)`.
pub(crate) fn placeholder_body<'m>(matched: &'m str, prefix: &str) -> &'m str {
    let body = matched.strip_prefix(prefix).unwrap_or(matched);
    body.strip_suffix(')').unwrap_or(body)
}

/// Up to three of `available` within a small edit distance of `key`,
/// closest first.
pub fn suggestions(key: &str, available: &[&str]) -> Vec<String> {
    let max_distance = if key.chars().count() <= 3 { 1 } else { 2 };
    let mut close: Vec<(usize, &str)> = available
        .iter()
        .map(|candidate| (levenshtein(key, candidate), *candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    close.sort_by_key(|(distance, _)| *distance);
    close
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_strips_prefix_and_close() {
        assert_eq!(placeholder_body("(list.alias|fun)", "(list."), "alias|fun");
        assert_eq!(placeholder_body("(if a|b)", "(if "), "a|b");
    }

    #[test]
    fn suggestions_prefer_closest() {
        let available = ["alias", "!alias", "core", "cooldown"];
        assert_eq!(suggestions("alis", &available), vec!["alias", "!alias"]);
        assert!(suggestions("zzzzzz", &available).is_empty());
    }
}
