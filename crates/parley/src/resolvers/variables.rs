//! Custom variables: `$_name`, `$!_name` and `$!!_name`.
//!
//! Without a parameter each form reads the variable. With one, it writes the
//! parameter and differs in what it says about it.

use std::collections::BTreeMap;

use tracing::warn;

use crate::context::ResolutionContext;
use crate::model::{Reply, ResponseMode};
use crate::pipeline::Resolver;

/// Translation key of the default "variable set" reply.
pub const SET_VARIABLE_KEY: &str = "filters.setVariable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableForm {
    /// `$_name`: writes answer according to the variable's response mode.
    Verbose,
    /// `$!_name`: writes never reply; resolves to the current value.
    Quiet,
    /// `$!!_name`: writes never reply; resolves to nothing.
    Silent,
}

impl VariableForm {
    /// Normalize a matched token to the stored `$_name` form.
    pub fn variable_name(self, matched: &str) -> String {
        let sigil = match self {
            VariableForm::Verbose => "$_",
            VariableForm::Quiet => "$!_",
            VariableForm::Silent => "$!!_",
        };
        match matched.strip_prefix(sigil) {
            Some(name) => format!("$_{name}"),
            None => matched.to_string(),
        }
    }
}

pub(crate) async fn variable(
    resolver: &Resolver,
    form: VariableForm,
    matched: &str,
    ctx: &ResolutionContext,
) -> Option<String> {
    let name = form.variable_name(matched);
    let store = &resolver.collaborators().variables;

    if !ctx.has_param() {
        if form == VariableForm::Silent {
            return Some(String::new());
        }
        return match store.get(&name, &ctx.sender, ctx.raw_param()).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(variable = %name, error = %e, "failed to read variable");
                None
            }
        };
    }

    let state = match store.set(&name, ctx.param(), &ctx.sender).await {
        Ok(state) => state,
        Err(e) => {
            warn!(variable = %name, error = %e, "failed to set variable");
            return if form == VariableForm::Silent {
                Some(String::new())
            } else {
                None
            };
        }
    };

    match form {
        VariableForm::Silent => Some(String::new()),
        VariableForm::Quiet => Some(state.current_value),
        VariableForm::Verbose => match &state.response {
            ResponseMode::Verbose => {
                if state.is_ok && !state.is_eval {
                    let message = resolver
                        .collaborators()
                        .translator
                        .translate(SET_VARIABLE_KEY)
                        .replace("$value", &state.set_value)
                        .replace("$variable", &name);
                    send(resolver, message, ctx).await;
                }
                Some(state.current_value)
            }
            ResponseMode::Custom(text) => {
                if !text.is_empty() {
                    send(resolver, text.replacen("$value", &state.set_value, 1), ctx).await;
                }
                Some(String::new())
            }
            ResponseMode::PassThrough => Some(if state.is_ok && !state.is_eval {
                state.set_value
            } else {
                state.current_value
            }),
        },
    }
}

async fn send(resolver: &Resolver, message: String, ctx: &ResolutionContext) {
    let reply = Reply {
        message,
        sender: ctx.sender.clone(),
        attributes: BTreeMap::from([("skip".to_string(), "true".to_string())]),
        quiet: ctx.quiet,
    };
    if let Err(e) = resolver.collaborators().replies.send(reply).await {
        warn!(error = %e, "failed to send variable reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        assert_eq!(VariableForm::Verbose.variable_name("$_score"), "$_score");
        assert_eq!(VariableForm::Quiet.variable_name("$!_score"), "$_score");
        assert_eq!(VariableForm::Silent.variable_name("$!!_score"), "$_score");
    }
}
