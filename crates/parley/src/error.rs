//! Error types for collaborators, the sandbox and fixture loading.
//!
//! None of these escape [`crate::Resolver::resolve`]: every stage converts a
//! failure into its fallback literal and logs it.

use std::io;
use std::path::PathBuf;

use parley_script::ScriptError;
use thiserror::Error;

/// A collaborator could not answer a query.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// No implementation was configured for this collaborator.
    #[error("no {collaborator} configured")]
    Unconfigured { collaborator: &'static str },

    /// The backing store failed.
    #[error("{collaborator} failed: {message}")]
    Store {
        collaborator: &'static str,
        message: String,
    },

    /// An HTTP request could not be completed.
    #[error("request to '{url}' failed: {message}")]
    Http { url: String, message: String },
}

/// An `(eval …)` expression could not be evaluated.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("failed to build sandbox context: {0}")]
    Context(#[from] CollaboratorError),
}

/// A fixture file could not be loaded.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),
}
