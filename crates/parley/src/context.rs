//! Per-call resolution state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bon::Builder;

use crate::model::Sender;

/// Command bodies already expanded during one top-level resolution.
///
/// Clones share the same list, so a nested expansion handed a clone extends
/// its parent's record and a cycle anywhere in the expansion tree is seen.
#[derive(Debug, Clone, Default)]
pub struct ProcessedCommands {
    bodies: Arc<Mutex<Vec<String>>>,
}

impl ProcessedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.bodies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `body` as expanded.
    ///
    /// Returns the cycle chain, ending in `body`, if it was already recorded.
    pub fn enter(&self, body: &str) -> Result<(), Vec<String>> {
        let mut bodies = self.lock();
        if bodies.iter().any(|b| b == body) {
            let mut chain = bodies.clone();
            chain.push(body.to_string());
            return Err(chain);
        }
        bodies.push(body.to_string());
        Ok(())
    }

    pub fn contains(&self, body: &str) -> bool {
        self.lock().iter().any(|b| b == body)
    }

    /// The expanded bodies in expansion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Everything a template may refer to about the message being answered.
///
/// # Example
///
/// ```
/// use parley::{ResolutionContext, Sender};
///
/// let ctx = ResolutionContext::builder()
///     .sender(Sender::new("viewer123"))
///     .param("5 points")
///     .command("!points")
///     .build();
/// assert_eq!(ctx.param(), "5 points");
/// assert!(ctx.has_param());
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct ResolutionContext {
    pub sender: Sender,

    /// Free text following the command.
    param: Option<String>,

    /// The command whose response is being resolved.
    pub command: Option<String>,

    /// Suppress replies emitted while resolving.
    #[builder(default)]
    pub quiet: bool,

    /// Render `$sender` without `@` even when mentions are enabled.
    #[builder(default)]
    pub force_without_at: bool,

    /// Extra `$key` substitutions applied after parameters.
    #[builder(default)]
    pub attributes: BTreeMap<String, String>,

    #[builder(default)]
    pub processed: ProcessedCommands,
}

impl ResolutionContext {
    /// The parameter, or `""` when none was given.
    pub fn param(&self) -> &str {
        self.param.as_deref().unwrap_or_default()
    }

    /// The parameter if one was given, even when empty.
    pub fn raw_param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    /// A non-empty parameter was given.
    pub fn has_param(&self) -> bool {
        self.param.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_processed_commands() {
        let parent = ProcessedCommands::new();
        let child = parent.clone();
        child.enter("!a").unwrap();
        assert!(parent.contains("!a"));
        assert_eq!(
            parent.enter("!a"),
            Err(vec!["!a".to_string(), "!a".to_string()])
        );
        assert_eq!(parent.len(), 1);
    }
}
