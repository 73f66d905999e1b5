//! Implementation of the `parley resolve` command.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use owo_colors::OwoColorize;
use parley::{MemoryStore, Platform, Reply, ResolutionContext, Sender};
use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use super::{load_store, parse_key_val, resolver_for};

/// Arguments for the resolve command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Template to resolve
    pub template: String,

    /// Fixture file (JSON) backing every collaborator
    #[arg(long, env = "PARLEY_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Username of the sender
    #[arg(long, default_value = "viewer")]
    pub sender: String,

    /// Platform the sender writes from
    #[arg(long, value_enum, default_value_t = PlatformArg::Twitch)]
    pub platform: PlatformArg,

    /// Text following the command
    #[arg(long)]
    pub param: Option<String>,

    /// Command whose response is being resolved
    #[arg(long)]
    pub command: Option<String>,

    /// Suppress replies emitted while resolving
    #[arg(long)]
    pub quiet: bool,

    /// Extra substitutions in name=value format (repeatable)
    #[arg(short = 'a', long = "attr", value_parser = parse_key_val)]
    pub attributes: Vec<(String, String)>,

    /// Print the result without waiting for staggered replies
    #[arg(long)]
    pub no_wait: bool,

    /// Fetch URLs over the network instead of from the fixture
    #[arg(long)]
    pub live_http: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Twitch,
    Discord,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Twitch => Platform::Twitch,
            PlatformArg::Discord => Platform::Discord,
        }
    }
}

/// JSON output for resolve results.
#[derive(Serialize)]
pub struct ResolveResult {
    pub result: String,
    pub cleared: bool,
    pub replies: Vec<Reply>,
}

/// Run the resolve command.
pub async fn run_resolve(args: ResolveArgs) -> miette::Result<i32> {
    let store = load_store(args.fixture.as_deref())?;
    let resolver = resolver_for(&store, args.live_http)?;

    let ctx = ResolutionContext::builder()
        .sender(Sender::new(args.sender).on(args.platform.into()))
        .maybe_param(args.param)
        .maybe_command(args.command)
        .quiet(args.quiet)
        .attributes(args.attributes.into_iter().collect::<BTreeMap<_, _>>())
        .build();

    let result = resolver.resolve(&args.template, &ctx).await;
    let replies = if args.no_wait {
        store.replies()
    } else {
        settle(&store, resolver.config().reply_stagger()).await
    };

    let cleared = result.trim().is_empty() && !args.template.trim().is_empty();
    if args.json {
        let output = ResolveResult {
            result,
            cleared,
            replies,
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| miette::miette!("Failed to serialize result: {}", e))?;
        println!("{json}");
    } else {
        if cleared {
            eprintln!("{}", "(message cleared)".dimmed());
        } else {
            println!("{result}");
        }
        for reply in &replies {
            let marker = if reply.quiet { "reply (quiet)" } else { "reply" };
            println!("{} {}", format!("{marker}:").cyan(), reply.message);
        }
    }
    Ok(exitcode::OK)
}

/// Wait until no new reply arrives for one stagger interval.
async fn settle(store: &MemoryStore, stagger: Duration) -> Vec<Reply> {
    let interval = stagger + Duration::from_millis(50);
    let mut seen = store.replies().len();
    loop {
        sleep(interval).await;
        let replies = store.replies();
        if replies.len() == seen {
            debug!(replies = seen, "replies settled");
            return replies;
        }
        seen = replies.len();
    }
}
