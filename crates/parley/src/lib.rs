//! Response template resolution for chat command bots.
//!
//! A [`Resolver`] turns a template such as
//! `"Hello $touser, you have (math.$_points * 2) points"` into the text sent
//! to chat. Placeholders are resolved in fixed [`STAGES`] against the
//! systems exposed through [`Collaborators`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use parley::{MemoryStore, ResolutionContext, Sender};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::from_json("{}").unwrap());
//! let resolver = store.resolver();
//! let ctx = ResolutionContext::builder().sender(Sender::new("viewer")).build();
//! assert_eq!(resolver.resolve("2 + 2 = (math.2+2)", &ctx).await, "2 + 2 = 4");
//! # }
//! ```

mod collaborators;
mod config;
mod context;
mod dispatch;
pub mod entities;
mod error;
pub mod http;
pub mod memory;
mod model;
mod pipeline;
pub mod resolvers;
pub mod sandbox;

pub use collaborators::{
    AliasLookup, ChannelDirectory, CollaboratorResult, Collaborators, CommandCatalog,
    CommandInvocation, CommandRunner, CommandUsage, CooldownLookup, CurrencyExchange, EventStore,
    HttpFetcher, MediaPlayer, PermissionResolver, PointsNamer, PriceLookup, RankLookup,
    ReplyDispatcher, StreamState, Translator, Unconfigured, UserStore, VariableStore,
};
pub use config::{DEFAULT_SPOTIFY_FORMAT, ResolverConfig};
pub use context::{ProcessedCommands, ResolutionContext};
pub use dispatch::{EmptyPolicy, PlaceholderRule, WILDCARD, WildcardMode, compile_pattern};
pub use error::{CollaboratorError, FixtureError, SandboxError};
pub use http::ReqwestFetcher;
pub use memory::{Fixture, MemoryStore};
pub use model::{
    AliasRecord, ChannelInfo, CommandResponse, CooldownRecord, CoreCommand, CustomCommand,
    CustomResponse, EventKind, EventRecord, EventValues, GroupFilter, HttpResponse, NowPlaying,
    Permission, Platform, PriceRecord, RankKind, RankRecord, Reply, ResponseMode, Sender,
    StreamStats, UserFilter, UserRecord, VariableWrite,
};
pub use pipeline::{Resolver, STAGES, Stage, StageBody};
pub use resolvers::ResolverKind;
