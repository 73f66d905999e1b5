//! CLI command implementations.

mod eval;
mod resolve;
mod stages;

use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;

use miette::miette;
use parley::{Fixture, FixtureError, HttpFetcher, MemoryStore, ReqwestFetcher, Resolver};
use tracing::debug;

use crate::output::FixtureDiagnostic;

pub use eval::{run_eval, EvalArgs};
pub use resolve::{run_resolve, ResolveArgs};
pub use stages::{run_stages, StagesArgs};

/// Load a fixture file, or an empty fixture when no path is given.
fn load_store(path: Option<&Path>) -> miette::Result<Arc<MemoryStore>> {
    let Some(path) = path else {
        debug!("no fixture given, using an empty one");
        return Ok(Arc::new(MemoryStore::new(Fixture::default())));
    };
    let content = read_to_string(path)
        .map_err(|e| miette!("Cannot read fixture file {}: {}", path.display(), e))?;
    match MemoryStore::from_json(&content) {
        Ok(store) => {
            debug!(path = %path.display(), "fixture loaded");
            Ok(Arc::new(store))
        }
        Err(FixtureError::Json(e)) => {
            Err(FixtureDiagnostic::from_json_error(path, &content, &e).into())
        }
        Err(e) => Err(miette!("{}", e)),
    }
}

/// A resolver over `store`, optionally sending `(api|…)` and `url(…)`
/// requests over the network instead of the fixture's canned responses.
fn resolver_for(store: &Arc<MemoryStore>, live_http: bool) -> miette::Result<Resolver> {
    let mut collaborators = store.collaborators();
    if live_http {
        let fetcher = ReqwestFetcher::new()
            .map_err(|e| miette!("Failed to build HTTP client: {}", e))?;
        collaborators.http = Arc::new(fetcher) as Arc<dyn HttpFetcher>;
        debug!("fetching URLs over the network");
    }
    Ok(Resolver::new(store.fixture().config.clone(), collaborators))
}

/// Parse a key=value argument.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid attribute format '{}': expected name=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
