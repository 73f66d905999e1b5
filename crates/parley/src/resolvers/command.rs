//! Nested commands `(!cmd)`, `(!!cmd)` and usage counts `$count`.

use std::sync::Arc;

use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, warn};

use crate::collaborators::CommandInvocation;
use crate::context::ResolutionContext;
use crate::model::{CommandResponse, Reply};
use crate::pipeline::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandForm {
    /// `(!!cmd)`: run and discard the responses.
    Silent,
    /// `(!cmd)`: run and forward the responses as replies.
    Visible,
}

impl CommandForm {
    /// The command text inside the placeholder, with `$param` substituted.
    pub fn body(self, matched: &str, param: &str) -> String {
        let prefix = match self {
            CommandForm::Silent => "(!",
            CommandForm::Visible => "(",
        };
        super::placeholder_body(matched, prefix).replace("$param", param)
    }
}

/// Run a nested command. Always resolves to `""`; visible responses are
/// delivered later by the reply dispatcher.
pub(crate) async fn expand(
    resolver: &Resolver,
    form: CommandForm,
    matched: &str,
    ctx: &ResolutionContext,
) -> String {
    let body = form.body(matched, ctx.param());
    if let Err(chain) = ctx.processed.enter(&body) {
        error!(chain = %chain.join(" -> "), "command expansion cycle");
        return String::new();
    }
    debug!(command = %body, ?form, "running nested command");

    let collaborators = resolver.collaborators();
    let invocation = CommandInvocation {
        sender: &ctx.sender,
        message: &body,
        param: body.split_once(' ').map(|(_, param)| param),
        quiet: form == CommandForm::Silent || ctx.quiet,
        processed: ctx.processed.clone(),
        resolver,
    };
    let responses = match collaborators.runner.run(invocation).await {
        Ok(responses) => responses,
        Err(e) => {
            warn!(command = %body, error = %e, "nested command failed");
            return String::new();
        }
    };

    if form == CommandForm::Visible {
        forward(resolver, responses, ctx.quiet);
    }
    String::new()
}

/// Send each response `i` once `i` stagger intervals have passed since the
/// command expanded, without waiting.
fn forward(resolver: &Resolver, responses: Vec<CommandResponse>, quiet: bool) {
    let stagger = resolver.config().reply_stagger();
    let start = Instant::now();
    let replies = Arc::clone(&resolver.collaborators().replies);
    for (i, response) in (0_u32..).zip(responses) {
        let replies = Arc::clone(&replies);
        let due = start + stagger * i;
        tokio::spawn(async move {
            sleep_until(due).await;
            let reply = Reply {
                message: response.response,
                sender: response.sender,
                attributes: response.attributes,
                quiet,
            };
            if let Err(e) = replies.send(reply).await {
                warn!(error = %e, "failed to forward nested command response");
            }
        });
    }
}

/// Usage count of the command named in `$count('!cmd')`.
pub(crate) async fn count_of(resolver: &Resolver, matched: &str) -> String {
    match counted_command(matched) {
        Some(command) => usage(resolver, command).await,
        None => "0".to_string(),
    }
}

/// Usage count of the originating command.
pub(crate) async fn count(resolver: &Resolver, ctx: &ResolutionContext) -> String {
    match &ctx.command {
        Some(command) => usage(resolver, command).await,
        None => "0".to_string(),
    }
}

/// The `!cmd` of `$count('!cmd')`, when it is a single command word.
pub fn counted_command(matched: &str) -> Option<&str> {
    let command = matched.strip_prefix("$count('")?.strip_suffix("')")?;
    (command.starts_with('!') && !command.contains(char::is_whitespace)).then_some(command)
}

async fn usage(resolver: &Resolver, command: &str) -> String {
    match resolver.collaborators().usage.count(command).await {
        Ok(count) => count.to_string(),
        Err(e) => {
            warn!(command, error = %e, "usage count failed");
            "0".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_strip_markers() {
        assert_eq!(CommandForm::Silent.body("(!!so $param)", "friend"), "!so friend");
        assert_eq!(CommandForm::Visible.body("(!points)", ""), "!points");
    }

    #[test]
    fn counted_command_needs_single_word() {
        assert_eq!(counted_command("$count('!hi')"), Some("!hi"));
        assert_eq!(counted_command("$count('hi')"), None);
        assert_eq!(counted_command("$count('!a b')"), None);
    }
}
