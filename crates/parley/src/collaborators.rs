//! Interfaces to the systems a template can read from.
//!
//! Every trait is object safe and shared as `Arc<dyn …>`. Reads are snapshot
//! reads: two stages of one resolution may observe different states.

use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};

use crate::context::ProcessedCommands;
use crate::error::CollaboratorError;
use crate::model::{
    AliasRecord, ChannelInfo, CommandResponse, CooldownRecord, CoreCommand, CustomCommand,
    EventKind, EventRecord, GroupFilter, HttpResponse, NowPlaying, Permission, PriceRecord,
    RankRecord, Reply, Sender, StreamStats, UserFilter, UserRecord, VariableWrite,
};
use crate::pipeline::Resolver;

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

#[async_trait]
pub trait StreamState: Send + Sync {
    async fn stats(&self) -> StreamStats;
    async fn is_online(&self) -> bool;
    /// When the stream last went online, `None` while offline.
    async fn online_since(&self) -> Option<DateTime<Utc>>;
}

#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// The Spotify track, when the integration is enabled and playing.
    async fn spotify_song(&self) -> Option<NowPlaying>;
    /// Title of the current song request, when song requests are playing.
    async fn song_request(&self) -> Option<String>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Most recent event of any of `kinds`.
    async fn latest(&self, kinds: &[EventKind]) -> CollaboratorResult<Option<EventRecord>>;
    async fn events(&self, kind: EventKind) -> CollaboratorResult<Vec<EventRecord>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn users(&self, filter: &UserFilter) -> CollaboratorResult<Vec<UserRecord>>;
    async fn user(&self, username: &str) -> CollaboratorResult<Option<UserRecord>>;
}

#[async_trait]
pub trait VariableStore: Send + Sync {
    /// Current value of `$_name`, rendered for `sender`.
    async fn get(
        &self,
        name: &str,
        sender: &Sender,
        param: Option<&str>,
    ) -> CollaboratorResult<String>;
    async fn set(&self, name: &str, value: &str, sender: &Sender)
    -> CollaboratorResult<VariableWrite>;
}

/// A nested command run requested by `(!cmd)` or `(!!cmd)`.
pub struct CommandInvocation<'a> {
    pub sender: &'a Sender,
    /// Full command text, e.g. `!so streamer`.
    pub message: &'a str,
    pub param: Option<&'a str>,
    /// Internal runs must not reply on their own.
    pub quiet: bool,
    /// Shared with the invoking resolution.
    pub processed: ProcessedCommands,
    /// Resolver to expand the responses of the nested command with.
    pub resolver: &'a Resolver,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: CommandInvocation<'_>)
    -> CollaboratorResult<Vec<CommandResponse>>;
}

#[async_trait]
pub trait CommandUsage: Send + Sync {
    async fn count(&self, command: &str) -> CollaboratorResult<u64>;
}

#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Find a permission group by name or id.
    async fn find(&self, name: &str) -> CollaboratorResult<Option<Permission>>;
    /// Permission id overriding a core command's default.
    async fn command_permission(&self, command_id: &str) -> CollaboratorResult<Option<String>>;
}

#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Enabled prices.
    async fn prices(&self) -> CollaboratorResult<Vec<PriceRecord>>;
    /// Whether the price system as a whole is enabled.
    async fn is_enabled(&self) -> bool;
}

#[async_trait]
pub trait RankLookup: Send + Sync {
    async fn ranks(&self) -> CollaboratorResult<Vec<RankRecord>>;
}

#[async_trait]
pub trait AliasLookup: Send + Sync {
    /// Visible, enabled aliases in `group`.
    async fn aliases(&self, group: &GroupFilter) -> CollaboratorResult<Vec<AliasRecord>>;
}

#[async_trait]
pub trait CooldownLookup: Send + Sync {
    /// Enabled cooldowns.
    async fn cooldowns(&self) -> CollaboratorResult<Vec<CooldownRecord>>;
}

#[async_trait]
pub trait CommandCatalog: Send + Sync {
    async fn core_commands(&self) -> CollaboratorResult<Vec<CoreCommand>>;
    /// Visible, enabled custom commands.
    async fn custom_commands(&self) -> CollaboratorResult<Vec<CustomCommand>>;
}

pub trait CurrencyExchange: Send + Sync {
    fn main_currency(&self) -> String;
    fn exchange(&self, amount: f64, from: &str, to: &str) -> f64;
}

pub trait PointsNamer: Send + Sync {
    /// Name of the points currency, inflected for `amount`.
    fn points_name(&self, amount: i64) -> String;
}

#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn channel(&self, name: &str) -> CollaboratorResult<Option<ChannelInfo>>;
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> CollaboratorResult<HttpResponse>;
}

pub trait Translator: Send + Sync {
    /// Localized text for `key`, or the key itself when unknown.
    fn translate(&self, key: &str) -> String;

    /// Localized noun for `count`, from a `singular|plural` translation.
    fn localized_name(&self, count: u64, key: &str) -> String {
        let text = self.translate(key);
        let mut forms = text.split('|');
        let singular = forms.next().unwrap_or_default();
        match forms.next() {
            Some(plural) if count != 1 => plural.to_string(),
            _ => singular.to_string(),
        }
    }
}

#[async_trait]
pub trait ReplyDispatcher: Send + Sync {
    async fn send(&self, reply: Reply) -> CollaboratorResult<()>;
}

/// Stand-in for collaborators that were not configured. Reads come back
/// empty or fail with [`CollaboratorError::Unconfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

fn unconfigured<T>(collaborator: &'static str) -> CollaboratorResult<T> {
    Err(CollaboratorError::Unconfigured { collaborator })
}

#[async_trait]
impl StreamState for Unconfigured {
    async fn stats(&self) -> StreamStats {
        StreamStats::default()
    }

    async fn is_online(&self) -> bool {
        false
    }

    async fn online_since(&self) -> Option<DateTime<Utc>> {
        None
    }
}

#[async_trait]
impl MediaPlayer for Unconfigured {
    async fn spotify_song(&self) -> Option<NowPlaying> {
        None
    }

    async fn song_request(&self) -> Option<String> {
        None
    }
}

#[async_trait]
impl EventStore for Unconfigured {
    async fn latest(&self, _kinds: &[EventKind]) -> CollaboratorResult<Option<EventRecord>> {
        unconfigured("event store")
    }

    async fn events(&self, _kind: EventKind) -> CollaboratorResult<Vec<EventRecord>> {
        unconfigured("event store")
    }
}

#[async_trait]
impl UserStore for Unconfigured {
    async fn users(&self, _filter: &UserFilter) -> CollaboratorResult<Vec<UserRecord>> {
        unconfigured("user store")
    }

    async fn user(&self, _username: &str) -> CollaboratorResult<Option<UserRecord>> {
        unconfigured("user store")
    }
}

#[async_trait]
impl VariableStore for Unconfigured {
    async fn get(
        &self,
        _name: &str,
        _sender: &Sender,
        _param: Option<&str>,
    ) -> CollaboratorResult<String> {
        unconfigured("variable store")
    }

    async fn set(
        &self,
        _name: &str,
        _value: &str,
        _sender: &Sender,
    ) -> CollaboratorResult<VariableWrite> {
        unconfigured("variable store")
    }
}

#[async_trait]
impl CommandRunner for Unconfigured {
    async fn run(
        &self,
        _invocation: CommandInvocation<'_>,
    ) -> CollaboratorResult<Vec<CommandResponse>> {
        unconfigured("command runner")
    }
}

#[async_trait]
impl CommandUsage for Unconfigured {
    async fn count(&self, _command: &str) -> CollaboratorResult<u64> {
        unconfigured("command usage")
    }
}

#[async_trait]
impl PermissionResolver for Unconfigured {
    async fn find(&self, _name: &str) -> CollaboratorResult<Option<Permission>> {
        unconfigured("permission resolver")
    }

    async fn command_permission(&self, _command_id: &str) -> CollaboratorResult<Option<String>> {
        unconfigured("permission resolver")
    }
}

#[async_trait]
impl PriceLookup for Unconfigured {
    async fn prices(&self) -> CollaboratorResult<Vec<PriceRecord>> {
        Ok(Vec::new())
    }

    async fn is_enabled(&self) -> bool {
        false
    }
}

#[async_trait]
impl RankLookup for Unconfigured {
    async fn ranks(&self) -> CollaboratorResult<Vec<RankRecord>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl AliasLookup for Unconfigured {
    async fn aliases(&self, _group: &GroupFilter) -> CollaboratorResult<Vec<AliasRecord>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl CooldownLookup for Unconfigured {
    async fn cooldowns(&self) -> CollaboratorResult<Vec<CooldownRecord>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl CommandCatalog for Unconfigured {
    async fn core_commands(&self) -> CollaboratorResult<Vec<CoreCommand>> {
        Ok(Vec::new())
    }

    async fn custom_commands(&self) -> CollaboratorResult<Vec<CustomCommand>> {
        Ok(Vec::new())
    }
}

impl CurrencyExchange for Unconfigured {
    fn main_currency(&self) -> String {
        "USD".to_string()
    }

    fn exchange(&self, amount: f64, _from: &str, _to: &str) -> f64 {
        amount
    }
}

impl PointsNamer for Unconfigured {
    fn points_name(&self, _amount: i64) -> String {
        "points".to_string()
    }
}

#[async_trait]
impl ChannelDirectory for Unconfigured {
    async fn channel(&self, _name: &str) -> CollaboratorResult<Option<ChannelInfo>> {
        unconfigured("channel directory")
    }
}

#[async_trait]
impl HttpFetcher for Unconfigured {
    async fn get(&self, url: &str) -> CollaboratorResult<HttpResponse> {
        Err(CollaboratorError::Http {
            url: url.to_string(),
            message: "no HTTP fetcher configured".to_string(),
        })
    }
}

impl Translator for Unconfigured {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

#[async_trait]
impl ReplyDispatcher for Unconfigured {
    async fn send(&self, _reply: Reply) -> CollaboratorResult<()> {
        unconfigured("reply dispatcher")
    }
}

/// The full set of collaborators a [`Resolver`] consults.
///
/// Unset slots default to [`Unconfigured`].
#[derive(Clone, Builder)]
pub struct Collaborators {
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn StreamState>)]
    pub stream: Arc<dyn StreamState>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn MediaPlayer>)]
    pub media: Arc<dyn MediaPlayer>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn EventStore>)]
    pub events: Arc<dyn EventStore>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn UserStore>)]
    pub users: Arc<dyn UserStore>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn VariableStore>)]
    pub variables: Arc<dyn VariableStore>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn CommandRunner>)]
    pub runner: Arc<dyn CommandRunner>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn CommandUsage>)]
    pub usage: Arc<dyn CommandUsage>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn PermissionResolver>)]
    pub permissions: Arc<dyn PermissionResolver>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn PriceLookup>)]
    pub prices: Arc<dyn PriceLookup>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn RankLookup>)]
    pub ranks: Arc<dyn RankLookup>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn AliasLookup>)]
    pub aliases: Arc<dyn AliasLookup>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn CooldownLookup>)]
    pub cooldowns: Arc<dyn CooldownLookup>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn CommandCatalog>)]
    pub catalog: Arc<dyn CommandCatalog>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn CurrencyExchange>)]
    pub currency: Arc<dyn CurrencyExchange>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn PointsNamer>)]
    pub points: Arc<dyn PointsNamer>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn ChannelDirectory>)]
    pub channels: Arc<dyn ChannelDirectory>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn HttpFetcher>)]
    pub http: Arc<dyn HttpFetcher>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn Translator>)]
    pub translator: Arc<dyn Translator>,
    #[builder(default = Arc::new(Unconfigured) as Arc<dyn ReplyDispatcher>)]
    pub replies: Arc<dyn ReplyDispatcher>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::builder().build()
    }
}
