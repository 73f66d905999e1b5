//! `(list.system[|group][.permission])` listings.

use parley_script::format_number;
use tracing::{error, warn};

use crate::collaborators::CollaboratorResult;
use crate::model::{GroupFilter, PriceRecord, RankKind, RankRecord};
use crate::pipeline::Resolver;

/// Listed in place of an empty listing so the message is not cleared.
pub const EMPTY_LISTING: &str = " ";

/// Translation key with the `singular|plural` noun for months.
pub const MONTHS_KEY: &str = "core.months";

/// Every system `(list.…)` understands.
pub const SYSTEMS: [&str; 11] = [
    "alias",
    "!alias",
    "core",
    "!core",
    "command",
    "!command",
    "cooldown",
    "price",
    "ranks",
    "ranks.follow",
    "ranks.sub",
];

/// A parsed `(list.…)` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSpec {
    pub system: String,
    pub group: GroupFilter,
    pub permission: Option<String>,
}

impl ListSpec {
    /// Parse the text of a `(list.…)` placeholder.
    ///
    /// `ranks.follow` and `ranks.sub` are systems of their own; everywhere
    /// else the text after the first `.` names a permission.
    pub fn parse(matched: &str) -> Self {
        let body = super::placeholder_body(matched, "(list.");
        let (main, permission) = if body == "ranks.follow" || body == "ranks.sub" {
            (body, None)
        } else {
            match body.split_once('.') {
                Some((main, rest)) => {
                    let permission = rest.split('.').next().unwrap_or_default();
                    (main, (!permission.is_empty()).then(|| permission.to_string()))
                }
                None => (body, None),
            }
        };
        let (system, group) = match main.split_once('|') {
            Some((system, group)) => {
                let group = group.split('|').next().unwrap_or_default().trim();
                let group = if group.is_empty() {
                    GroupFilter::Ungrouped
                } else {
                    GroupFilter::Named(group.to_string())
                };
                (system, group)
            }
            None => (main, GroupFilter::Any),
        };
        Self {
            system: system.to_string(),
            group,
            permission,
        }
    }
}

pub(crate) async fn list(resolver: &Resolver, matched: &str) -> String {
    let spec = ListSpec::parse(matched);
    let collaborators = resolver.collaborators();

    if !SYSTEMS.contains(&spec.system.as_str()) {
        warn!(
            system = %spec.system,
            suggestions = ?super::suggestions(&spec.system, &SYSTEMS),
            "unknown list system"
        );
        return String::new();
    }

    let (aliases, commands, cooldowns, ranks, prices, prices_enabled) = tokio::join!(
        collaborators.aliases.aliases(&spec.group),
        collaborators.catalog.custom_commands(),
        collaborators.cooldowns.cooldowns(),
        collaborators.ranks.ranks(),
        collaborators.prices.prices(),
        collaborators.prices.is_enabled(),
    );
    let prices = or_empty(prices, "prices");
    let priced = |command: &str, display: &str| -> String {
        match prices.iter().find(|p| p.command == command) {
            Some(price) if prices_enabled => {
                format!("{display}({})", price_text(resolver, price))
            }
            _ => display.to_string(),
        }
    };

    let entries: Vec<String> = match spec.system.as_str() {
        "alias" | "!alias" => {
            let keep_bang = spec.system.starts_with('!');
            let mut entries: Vec<String> = or_empty(aliases, "aliases")
                .iter()
                .map(|a| priced(&a.alias, &display_name(&a.alias, keep_bang)))
                .collect();
            entries.sort();
            entries
        }
        "core" | "!core" => {
            return core_listing(resolver, &spec).await.unwrap_or_default();
        }
        "command" | "!command" => {
            let keep_bang = spec.system.starts_with('!');
            let mut commands = or_empty(commands, "custom commands");
            if let Some(permission) = &spec.permission {
                match collaborators.permissions.find(permission).await {
                    Ok(Some(found)) => commands.retain(|c| {
                        c.responses
                            .iter()
                            .any(|r| r.permission.as_deref() == Some(found.id.as_str()))
                    }),
                    Ok(None) => commands.clear(),
                    Err(e) => {
                        warn!(permission = %permission, error = %e, "permission lookup failed");
                        commands.clear();
                    }
                }
            }
            let mut entries: Vec<String> = commands
                .iter()
                .map(|c| priced(&c.command, &display_name(&c.command, keep_bang)))
                .collect();
            entries.sort();
            entries
        }
        "cooldown" => {
            let mut entries: Vec<String> = or_empty(cooldowns, "cooldowns")
                .iter()
                .map(|c| format!("{}: {}s", c.name, format_number(c.millis as f64 / 1000.0)))
                .collect();
            entries.sort();
            entries
        }
        "price" => prices
            .iter()
            .map(|p| format!("{} ({})", p.command, price_text(resolver, p)))
            .collect(),
        "ranks" => rank_entries(or_empty(ranks, "ranks"), RankKind::Viewer, |rank| {
            format!("{} ({}h)", rank.rank, rank.value)
        }),
        "ranks.follow" | "ranks.sub" => {
            let kind = if spec.system == "ranks.follow" {
                RankKind::Follower
            } else {
                RankKind::Subscriber
            };
            rank_entries(or_empty(ranks, "ranks"), kind, |rank| {
                let months = collaborators
                    .translator
                    .localized_name(rank.value, MONTHS_KEY);
                format!("{} ({} {months})", rank.rank, rank.value)
            })
        }
        _ => Vec::new(),
    };

    if entries.is_empty() {
        EMPTY_LISTING.to_string()
    } else {
        entries.join(", ")
    }
}

/// Core commands whose effective permission is the requested one.
async fn core_listing(resolver: &Resolver, spec: &ListSpec) -> Option<String> {
    let collaborators = resolver.collaborators();
    let Some(permission) = &spec.permission else {
        error!(system = %spec.system, "missing permission for core command listing");
        return None;
    };
    let found = match collaborators.permissions.find(permission).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            error!(permission = %permission, "permission for core command listing not found");
            return None;
        }
        Err(e) => {
            error!(permission = %permission, error = %e, "permission lookup failed");
            return None;
        }
    };

    let keep_bang = spec.system.starts_with('!');
    let mut entries = Vec::new();
    for command in or_empty(collaborators.catalog.core_commands().await, "core commands") {
        let effective = match collaborators.permissions.command_permission(&command.id).await {
            Ok(Some(custom)) => Some(custom),
            Ok(None) => command.permission.clone(),
            Err(e) => {
                warn!(command = %command.command, error = %e, "command permission lookup failed");
                command.permission.clone()
            }
        };
        if effective.as_deref() == Some(found.id.as_str()) {
            entries.push(display_name(&command.command, keep_bang));
        }
    }
    entries.sort();
    Some(if entries.is_empty() {
        EMPTY_LISTING.to_string()
    } else {
        entries.join(", ")
    })
}

fn display_name(command: &str, keep_bang: bool) -> String {
    if keep_bang {
        command.to_string()
    } else {
        command.replacen('!', "", 1)
    }
}

fn price_text(resolver: &Resolver, price: &PriceRecord) -> String {
    format!(
        "{} {}",
        price.price,
        resolver.collaborators().points.points_name(price.price)
    )
}

fn rank_entries(
    mut ranks: Vec<RankRecord>,
    kind: RankKind,
    render: impl Fn(&RankRecord) -> String,
) -> Vec<String> {
    ranks.retain(|rank| rank.kind == kind);
    ranks.sort_by_key(|rank| rank.value);
    ranks.iter().map(render).collect()
}

fn or_empty<T>(result: CollaboratorResult<Vec<T>>, what: &'static str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(what, error = %e, "listing query failed");
        Vec::new()
    })
}
