//! `(math.expr)`: arithmetic over numbers and custom variables.

use std::cmp::Reverse;

use parley_script::format_number;
use parley_script::math::evaluate;
use tracing::debug;

use crate::context::ResolutionContext;
use crate::pipeline::Resolver;

/// Evaluate the expression after replacing `$_name` tokens with the
/// variables' current values. `None` when it does not evaluate.
pub(crate) async fn math(
    resolver: &Resolver,
    matched: &str,
    ctx: &ResolutionContext,
) -> Option<String> {
    let expression = super::placeholder_body(matched, "(math.");
    let mut substituted = expression.to_string();
    for name in variable_names(expression) {
        let value = resolver
            .collaborators()
            .variables
            .get(&name, &ctx.sender, ctx.raw_param())
            .await
            .unwrap_or_default();
        let number = if value.trim().parse::<f64>().is_ok() {
            value.trim().to_string()
        } else {
            "0".to_string()
        };
        substituted = substituted.replace(&name, &number);
    }
    match evaluate(&substituted) {
        Ok(n) => Some(format_number(n)),
        Err(e) => {
            debug!(expression = %substituted, error = %e, "math expression failed");
            None
        }
    }
}

/// Distinct `$_name` tokens, longest first so that `$_a` never clobbers
/// part of `$_ab`.
pub fn variable_names(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = expression;
    while let Some(start) = rest.find("$_") {
        let tail = &rest[start + 2..];
        let len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        if len > 0 {
            let name = format!("$_{}", &tail[..len]);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        rest = &tail[len..];
    }
    names.sort_by_key(|name| Reverse(name.len()));
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_variable_tokens() {
        assert_eq!(
            variable_names("$_a + $_ab * 2 - $_a"),
            vec!["$_ab".to_string(), "$_a".to_string()]
        );
        assert!(variable_names("2 + $ 3").is_empty());
    }
}
