//! Records exchanged with collaborators.
//!
//! All of these deserialize from fixture JSON, which is how the in-memory
//! store and the CLI populate them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};

/// Chat platform a sender writes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Twitch,
    Discord,
}

/// The user whose message triggered a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub platform: Platform,
}

impl Sender {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: None,
            platform: Platform::Twitch,
        }
    }

    pub fn on(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

/// Live channel statistics used by the global `$game`, `$viewers`, … tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamStats {
    pub game: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub viewers: u64,
    pub views: u64,
    pub followers: u64,
    pub hosts: u64,
    pub subscribers: u64,
    pub bits: u64,
}

/// Kinds of stored channel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Follow,
    Sub,
    Resub,
    SubGift,
    Tip,
    Cheer,
}

impl EventKind {
    /// Every kind counted as a subscription by `$latestSubscriber`.
    pub const SUBSCRIPTIONS: [EventKind; 3] = [EventKind::Sub, EventKind::Resub, EventKind::SubGift];
}

/// Structured payload attached to tips and cheers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventValues {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub values: EventValues,
}

/// A known chat user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub username: String,
    pub user_id: Option<String>,
    pub is_online: bool,
    pub is_follower: bool,
    pub is_subscriber: bool,
    pub is_moderator: bool,
    pub is_vip: bool,
    pub is_ignored: bool,
}

impl UserRecord {
    /// Shape exposed to sandbox expressions as an element of `users`.
    pub fn to_script_json(&self) -> Json {
        json!({
            "username": self.username,
            "userId": self.user_id,
            "is": {
                "online": self.is_online,
                "follower": self.is_follower,
                "subscriber": self.is_subscriber,
                "moderator": self.is_moderator,
                "vip": self.is_vip,
            },
        })
    }
}

/// Snapshot filter for [`crate::UserStore::users`]. Every flag that is set
/// must hold for a user to be returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub online: bool,
    pub follower: bool,
    pub subscriber: bool,
    /// Lowercased usernames to leave out.
    pub exclude: Vec<String>,
    /// Leave out users marked as ignored.
    pub exclude_ignored: bool,
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        (!self.online || user.is_online)
            && (!self.follower || user.is_follower)
            && (!self.subscriber || user.is_subscriber)
            && !(self.exclude_ignored && user.is_ignored)
            && !self.exclude.contains(&user.username.to_lowercase())
    }
}

/// How a custom variable answers a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "text")]
pub enum ResponseMode {
    /// Reply with the `filters.setVariable` message.
    #[default]
    Verbose,
    /// Reply with custom text where `$value` is the written value.
    Custom(String),
    /// No reply; the placeholder becomes the written value.
    PassThrough,
}

/// Outcome of [`crate::VariableStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableWrite {
    pub is_ok: bool,
    /// The variable is computed and cannot be written directly.
    pub is_eval: bool,
    pub set_value: String,
    pub current_value: String,
    pub response: ResponseMode,
}

/// One reply produced by a command run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response: String,
    pub sender: Sender,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// An out-of-band message for the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub message: String,
    pub sender: Sender,
    pub attributes: BTreeMap<String, String>,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub command: String,
    pub price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankKind {
    Viewer,
    Follower,
    Subscriber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub rank: String,
    /// Hours watched for viewer ranks, months for follower and subscriber ranks.
    pub value: u64,
    pub kind: RankKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub alias: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Group selector of `(list.alias|group)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    Any,
    Ungrouped,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub name: String,
    pub millis: u64,
}

/// A built-in command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreCommand {
    pub id: String,
    pub command: String,
    /// Default permission id.
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomResponse {
    pub response: String,
    #[serde(default)]
    pub permission: Option<String>,
}

/// A user-defined command with its response templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub responses: Vec<CustomResponse>,
}

/// Public metadata of another channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelInfo {
    pub game: Option<String>,
    pub title: Option<String>,
    /// Current viewers, `None` when the channel is offline.
    pub viewers: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub song: String,
    pub artist: String,
}

/// Status and body of an HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Json> {
        serde_json::from_str(&self.body).ok()
    }
}
