//! In-memory collaborators backed by a JSON fixture.
//!
//! [`MemoryStore`] answers every collaborator query from a [`Fixture`] and
//! records the replies it is asked to send. Variable writes are kept for the
//! lifetime of the store. Nested commands resolve the fixture's custom
//! command responses with the invoking resolver.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::collaborators::{
    AliasLookup, ChannelDirectory, CollaboratorResult, Collaborators, CommandCatalog,
    CommandInvocation, CommandRunner, CommandUsage, CooldownLookup, CurrencyExchange, EventStore,
    HttpFetcher, MediaPlayer, PermissionResolver, PointsNamer, PriceLookup, RankLookup,
    ReplyDispatcher, StreamState, Translator, UserStore, VariableStore,
};
use crate::config::ResolverConfig;
use crate::context::ResolutionContext;
use crate::error::{CollaboratorError, FixtureError};
use crate::model::{
    AliasRecord, ChannelInfo, CommandResponse, CooldownRecord, CoreCommand, CustomCommand,
    EventKind, EventRecord, GroupFilter, HttpResponse, NowPlaying, Permission, PriceRecord,
    RankRecord, Reply, ResponseMode, Sender, StreamStats, UserFilter, UserRecord, VariableWrite,
};
use crate::pipeline::Resolver;

/// Live stream state of a fixture.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamFixture {
    pub online: bool,
    pub online_since: Option<DateTime<Utc>>,
    pub stats: StreamStats,
}

/// A stored custom variable.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableFixture {
    /// Name including the sigil, e.g. `$_score`.
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub response: ResponseMode,
    /// Computed variables reject writes.
    #[serde(default)]
    pub eval: bool,
}

/// Everything a [`MemoryStore`] knows, as read from JSON. Every section is
/// optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub config: ResolverConfig,
    pub stream: StreamFixture,
    pub spotify: Option<NowPlaying>,
    pub song_request: Option<String>,
    pub events: Vec<EventRecord>,
    pub users: Vec<UserRecord>,
    pub variables: Vec<VariableFixture>,
    pub commands: Vec<CustomCommand>,
    pub core_commands: Vec<CoreCommand>,
    /// Permission id overrides for core commands, by command id.
    pub command_permissions: BTreeMap<String, String>,
    /// Usage counts by command, e.g. `"!hi": 3`.
    pub usage: BTreeMap<String, u64>,
    pub permissions: Vec<Permission>,
    pub prices: Vec<PriceRecord>,
    pub prices_enabled: bool,
    pub ranks: Vec<RankRecord>,
    pub aliases: Vec<AliasRecord>,
    pub cooldowns: Vec<CooldownRecord>,
    /// Other channels, by lowercased name.
    pub channels: BTreeMap<String, ChannelInfo>,
    /// Canned HTTP responses, by URL.
    pub http: BTreeMap<String, HttpResponse>,
    pub translations: BTreeMap<String, String>,
    pub main_currency: String,
    /// Value of one unit of each currency in the main currency.
    pub rates: BTreeMap<String, f64>,
    /// Points name, or `singular|plural`.
    pub points_name: String,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            config: ResolverConfig::default(),
            stream: StreamFixture::default(),
            spotify: None,
            song_request: None,
            events: Vec::new(),
            users: Vec::new(),
            variables: Vec::new(),
            commands: Vec::new(),
            core_commands: Vec::new(),
            command_permissions: BTreeMap::new(),
            usage: BTreeMap::new(),
            permissions: Vec::new(),
            prices: Vec::new(),
            prices_enabled: true,
            ranks: Vec::new(),
            aliases: Vec::new(),
            cooldowns: Vec::new(),
            channels: BTreeMap::new(),
            http: BTreeMap::new(),
            translations: BTreeMap::new(),
            main_currency: "USD".to_string(),
            rates: BTreeMap::new(),
            points_name: "point|points".to_string(),
        }
    }
}

/// Collaborators answering from a [`Fixture`].
#[derive(Debug)]
pub struct MemoryStore {
    fixture: Fixture,
    variables: Mutex<BTreeMap<String, VariableFixture>>,
    replies: Mutex<Vec<Reply>>,
    user_queries: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new(fixture: Fixture) -> Self {
        let variables = fixture
            .variables
            .iter()
            .map(|v| (v.name.clone(), v.clone()))
            .collect();
        Self {
            fixture,
            variables: Mutex::new(variables),
            user_queries: AtomicUsize::new(0),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Read a fixture file.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let json = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Replies sent so far, oldest first.
    pub fn replies(&self) -> Vec<Reply> {
        lock(&self.replies).clone()
    }

    /// How many user listings have been requested from this store.
    pub fn user_queries(&self) -> usize {
        self.user_queries.load(Ordering::Relaxed)
    }

    /// Current value of a variable, if it exists.
    pub fn variable(&self, name: &str) -> Option<String> {
        lock(&self.variables).get(name).map(|v| v.value.clone())
    }

    /// Every collaborator slot filled by this store.
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators::builder()
            .stream(Arc::clone(self) as Arc<dyn StreamState>)
            .media(Arc::clone(self) as Arc<dyn MediaPlayer>)
            .events(Arc::clone(self) as Arc<dyn EventStore>)
            .users(Arc::clone(self) as Arc<dyn UserStore>)
            .variables(Arc::clone(self) as Arc<dyn VariableStore>)
            .runner(Arc::clone(self) as Arc<dyn CommandRunner>)
            .usage(Arc::clone(self) as Arc<dyn CommandUsage>)
            .permissions(Arc::clone(self) as Arc<dyn PermissionResolver>)
            .prices(Arc::clone(self) as Arc<dyn PriceLookup>)
            .ranks(Arc::clone(self) as Arc<dyn RankLookup>)
            .aliases(Arc::clone(self) as Arc<dyn AliasLookup>)
            .cooldowns(Arc::clone(self) as Arc<dyn CooldownLookup>)
            .catalog(Arc::clone(self) as Arc<dyn CommandCatalog>)
            .currency(Arc::clone(self) as Arc<dyn CurrencyExchange>)
            .points(Arc::clone(self) as Arc<dyn PointsNamer>)
            .channels(Arc::clone(self) as Arc<dyn ChannelDirectory>)
            .http(Arc::clone(self) as Arc<dyn HttpFetcher>)
            .translator(Arc::clone(self) as Arc<dyn Translator>)
            .replies(Arc::clone(self) as Arc<dyn ReplyDispatcher>)
            .build()
    }

    /// A resolver over this store using the fixture's configuration.
    pub fn resolver(self: &Arc<Self>) -> Resolver {
        Resolver::new(self.fixture.config.clone(), self.collaborators())
    }
}

#[async_trait]
impl StreamState for MemoryStore {
    async fn stats(&self) -> StreamStats {
        self.fixture.stream.stats.clone()
    }

    async fn is_online(&self) -> bool {
        self.fixture.stream.online
    }

    async fn online_since(&self) -> Option<DateTime<Utc>> {
        if self.fixture.stream.online {
            self.fixture.stream.online_since
        } else {
            None
        }
    }
}

#[async_trait]
impl MediaPlayer for MemoryStore {
    async fn spotify_song(&self) -> Option<NowPlaying> {
        self.fixture.spotify.clone()
    }

    async fn song_request(&self) -> Option<String> {
        self.fixture.song_request.clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn latest(&self, kinds: &[EventKind]) -> CollaboratorResult<Option<EventRecord>> {
        Ok(self
            .fixture
            .events
            .iter()
            .filter(|e| kinds.contains(&e.kind))
            .max_by_key(|e| e.timestamp)
            .cloned())
    }

    async fn events(&self, kind: EventKind) -> CollaboratorResult<Vec<EventRecord>> {
        Ok(self
            .fixture
            .events
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn users(&self, filter: &UserFilter) -> CollaboratorResult<Vec<UserRecord>> {
        self.user_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .fixture
            .users
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }

    async fn user(&self, username: &str) -> CollaboratorResult<Option<UserRecord>> {
        Ok(self
            .fixture
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }
}

#[async_trait]
impl VariableStore for MemoryStore {
    async fn get(
        &self,
        name: &str,
        _sender: &Sender,
        _param: Option<&str>,
    ) -> CollaboratorResult<String> {
        Ok(self.variable(name).unwrap_or_default())
    }

    async fn set(
        &self,
        name: &str,
        value: &str,
        _sender: &Sender,
    ) -> CollaboratorResult<VariableWrite> {
        let mut variables = lock(&self.variables);
        let Some(variable) = variables.get_mut(name) else {
            return Err(CollaboratorError::Store {
                collaborator: "variable store",
                message: format!("unknown variable '{name}'"),
            });
        };
        if !variable.eval {
            variable.value = value.to_string();
        }
        Ok(VariableWrite {
            is_ok: !variable.eval,
            is_eval: variable.eval,
            set_value: value.to_string(),
            current_value: variable.value.clone(),
            response: variable.response.clone(),
        })
    }
}

#[async_trait]
impl CommandRunner for MemoryStore {
    async fn run(
        &self,
        invocation: CommandInvocation<'_>,
    ) -> CollaboratorResult<Vec<CommandResponse>> {
        let name = invocation.message.split_whitespace().next().unwrap_or_default();
        let Some(command) = self
            .fixture
            .commands
            .iter()
            .find(|c| c.command.eq_ignore_ascii_case(name))
        else {
            debug!(command = name, "no such custom command");
            return Ok(Vec::new());
        };

        let ctx = ResolutionContext::builder()
            .sender(invocation.sender.clone())
            .maybe_param(invocation.param.map(str::to_string))
            .command(command.command.clone())
            .quiet(invocation.quiet)
            .processed(invocation.processed.clone())
            .build();
        let mut responses = Vec::new();
        for response in &command.responses {
            let text = invocation.resolver.resolve(&response.response, &ctx).await;
            if !text.is_empty() {
                responses.push(CommandResponse {
                    response: text,
                    sender: invocation.sender.clone(),
                    attributes: BTreeMap::new(),
                });
            }
        }
        Ok(responses)
    }
}

#[async_trait]
impl CommandUsage for MemoryStore {
    async fn count(&self, command: &str) -> CollaboratorResult<u64> {
        Ok(self.fixture.usage.get(command).copied().unwrap_or_default())
    }
}

#[async_trait]
impl PermissionResolver for MemoryStore {
    async fn find(&self, name: &str) -> CollaboratorResult<Option<Permission>> {
        Ok(self
            .fixture
            .permissions
            .iter()
            .find(|p| p.id == name || p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn command_permission(&self, command_id: &str) -> CollaboratorResult<Option<String>> {
        Ok(self.fixture.command_permissions.get(command_id).cloned())
    }
}

#[async_trait]
impl PriceLookup for MemoryStore {
    async fn prices(&self) -> CollaboratorResult<Vec<PriceRecord>> {
        Ok(self.fixture.prices.clone())
    }

    async fn is_enabled(&self) -> bool {
        self.fixture.prices_enabled
    }
}

#[async_trait]
impl RankLookup for MemoryStore {
    async fn ranks(&self) -> CollaboratorResult<Vec<RankRecord>> {
        Ok(self.fixture.ranks.clone())
    }
}

#[async_trait]
impl AliasLookup for MemoryStore {
    async fn aliases(&self, group: &GroupFilter) -> CollaboratorResult<Vec<AliasRecord>> {
        Ok(self
            .fixture
            .aliases
            .iter()
            .filter(|a| match group {
                GroupFilter::Any => true,
                GroupFilter::Ungrouped => a.group.is_none(),
                GroupFilter::Named(name) => a.group.as_deref() == Some(name.as_str()),
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CooldownLookup for MemoryStore {
    async fn cooldowns(&self) -> CollaboratorResult<Vec<CooldownRecord>> {
        Ok(self.fixture.cooldowns.clone())
    }
}

#[async_trait]
impl CommandCatalog for MemoryStore {
    async fn core_commands(&self) -> CollaboratorResult<Vec<CoreCommand>> {
        Ok(self.fixture.core_commands.clone())
    }

    async fn custom_commands(&self) -> CollaboratorResult<Vec<CustomCommand>> {
        Ok(self.fixture.commands.clone())
    }
}

impl CurrencyExchange for MemoryStore {
    fn main_currency(&self) -> String {
        self.fixture.main_currency.clone()
    }

    fn exchange(&self, amount: f64, from: &str, to: &str) -> f64 {
        let rate = |currency: &str| {
            if currency == self.fixture.main_currency {
                1.0
            } else {
                self.fixture.rates.get(currency).copied().unwrap_or(1.0)
            }
        };
        amount * rate(from) / rate(to)
    }
}

impl PointsNamer for MemoryStore {
    fn points_name(&self, amount: i64) -> String {
        let name = &self.fixture.points_name;
        match name.split_once('|') {
            Some((singular, _)) if amount.abs() == 1 => singular.to_string(),
            Some((_, plural)) => plural.to_string(),
            None => name.clone(),
        }
    }
}

#[async_trait]
impl ChannelDirectory for MemoryStore {
    async fn channel(&self, name: &str) -> CollaboratorResult<Option<ChannelInfo>> {
        Ok(self.fixture.channels.get(&name.to_lowercase()).cloned())
    }
}

#[async_trait]
impl HttpFetcher for MemoryStore {
    async fn get(&self, url: &str) -> CollaboratorResult<HttpResponse> {
        self.fixture
            .http
            .get(url)
            .cloned()
            .ok_or_else(|| CollaboratorError::Http {
                url: url.to_string(),
                message: "no canned response".to_string(),
            })
    }
}

impl Translator for MemoryStore {
    fn translate(&self, key: &str) -> String {
        self.fixture
            .translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[async_trait]
impl ReplyDispatcher for MemoryStore {
    async fn send(&self, reply: Reply) -> CollaboratorResult<()> {
        debug!(message = %reply.message, quiet = reply.quiet, "reply recorded");
        lock(&self.replies).push(reply);
        Ok(())
    }
}
