//! `(if condition|then|else)`.

use parley_script::{Scope, evaluate};
use tracing::debug;

/// Resolve a conditional placeholder.
///
/// `$param` and `$!param` are substituted into the placeholder first. A
/// condition that starts with a comparison operator has no left-hand side
/// and is treated as `false`. Returns `None` when there is no `then` branch,
/// which leaves the placeholder untouched.
pub fn conditional(matched: &str, param: &str) -> Option<String> {
    let body = super::placeholder_body(matched, "(if ")
        .replace("$!param", param)
        .replace("$param", param);
    let mut parts = body.splitn(3, '|');
    let condition = parts.next().unwrap_or_default().trim();
    let then = parts.next()?;
    let otherwise = parts.next().unwrap_or_default();

    let condition = if condition.starts_with(['>', '<', '=']) {
        "false"
    } else {
        condition
    };
    match evaluate(condition, &Scope::new()) {
        Ok(value) if value.is_truthy() => Some(then.to_string()),
        Ok(_) => Some(otherwise.to_string()),
        Err(e) => {
            debug!(condition, error = %e, "condition failed to evaluate");
            Some(String::new())
        }
    }
}
