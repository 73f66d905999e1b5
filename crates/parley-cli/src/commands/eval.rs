//! Implementation of the `parley eval` command.

use std::path::PathBuf;

use clap::Args;
use parley::sandbox::evaluate;
use parley::{ResolutionContext, SandboxError, Sender};
use parley_script::ScriptError;

use super::{load_store, resolver_for};
use crate::output::ScriptDiagnostic;

/// Arguments for the eval command.
#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Expression to evaluate, as written inside `(eval …)`
    pub expression: String,

    /// Fixture file (JSON) backing every collaborator
    #[arg(long, env = "PARLEY_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Username of the sender
    #[arg(long, default_value = "viewer")]
    pub sender: String,

    /// Text following the command, bound to `param`
    #[arg(long)]
    pub param: Option<String>,

    /// Fetch URLs over the network instead of from the fixture
    #[arg(long)]
    pub live_http: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the eval command.
pub async fn run_eval(args: EvalArgs) -> miette::Result<i32> {
    let store = load_store(args.fixture.as_deref())?;
    let resolver = resolver_for(&store, args.live_http)?;
    let ctx = ResolutionContext::builder()
        .sender(Sender::new(args.sender))
        .maybe_param(args.param)
        .build();

    match evaluate(&resolver, &args.expression, &ctx).await {
        Ok(value) => {
            if args.json {
                let output = serde_json::json!({ "result": value.to_json() });
                let json = serde_json::to_string_pretty(&output)
                    .map_err(|e| miette::miette!("Failed to serialize result: {}", e))?;
                println!("{json}");
            } else {
                println!("{value}");
            }
            Ok(exitcode::OK)
        }
        Err(SandboxError::Script(ScriptError::Parse(e))) if !args.json => {
            match ScriptDiagnostic::from_parse_error(&args.expression, &e) {
                Some(diagnostic) => Err(diagnostic.into()),
                None => {
                    eprintln!("Evaluation error: {e}");
                    Ok(exitcode::DATAERR)
                }
            }
        }
        Err(e) => {
            if args.json {
                let output = serde_json::json!({ "error": e.to_string() });
                let json = serde_json::to_string_pretty(&output)
                    .map_err(|e| miette::miette!("Failed to serialize error: {}", e))?;
                eprintln!("{json}");
            } else {
                eprintln!("Evaluation error: {e}");
            }
            Ok(exitcode::DATAERR)
        }
    }
}
