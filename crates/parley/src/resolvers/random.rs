//! `(random.…)` selectors.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::warn;

use crate::model::UserFilter;
use crate::pipeline::Resolver;

/// Result of a random pick with no candidates.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Follower,
    Subscriber,
}

/// Which users a random pick draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPool {
    pub online: bool,
    pub role: Role,
}

impl UserPool {
    pub const fn new(online: bool, role: Role) -> Self {
        Self { online, role }
    }
}

/// Pick a username from `pool`, leaving out the bot, the broadcaster and
/// ignored users.
pub(crate) async fn random_user(resolver: &Resolver, pool: UserPool) -> String {
    let filter = UserFilter {
        online: pool.online,
        follower: pool.role == Role::Follower,
        subscriber: pool.role == Role::Subscriber,
        exclude: resolver.config().excluded_usernames(),
        exclude_ignored: true,
    };
    match resolver.collaborators().users.users(&filter).await {
        Ok(users) => users
            .choose(&mut thread_rng())
            .map_or_else(|| UNKNOWN.to_string(), |user| user.username.clone()),
        Err(e) => {
            warn!(?pool, error = %e, "failed to load users for random pick");
            UNKNOWN.to_string()
        }
    }
}

/// Bounds of `(random.number-A-to-B)`. A bound that is not a number is
/// taken from the next word of `param`. `None` when a bound is missing or
/// malformed.
pub fn number_bounds(matched: &str, param: Option<&str>) -> Option<(i64, i64)> {
    let body = matched
        .strip_prefix("(random.number-")?
        .strip_suffix(')')?;
    let (low, high) = body.split_once("-to-")?;
    let mut words = param.unwrap_or_default().split_whitespace();
    let mut bound = |literal: &str| -> Option<i64> {
        match literal.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => words.next()?.parse().ok(),
        }
    };
    let low = bound(low)?;
    let high = bound(high)?;
    Some(if low <= high { (low, high) } else { (high, low) })
}

/// A uniformly drawn integer in the inclusive range, or `0` when the range
/// cannot be read.
pub fn random_number(matched: &str, param: Option<&str>) -> String {
    match number_bounds(matched, param) {
        Some((low, high)) => thread_rng().gen_range(low..=high).to_string(),
        None => "0".to_string(),
    }
}

pub fn random_bool() -> String {
    thread_rng().gen_bool(0.5).to_string()
}
