//! `(stream|channel|game)`, `(stream|channel|title)` and
//! `(stream|channel|viewers)`.

use tracing::warn;

use crate::pipeline::Resolver;

use super::info::NOT_AVAILABLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelField {
    Game,
    Title,
    Viewers,
}

impl ChannelField {
    pub fn name(self) -> &'static str {
        match self {
            ChannelField::Game => "game",
            ChannelField::Title => "title",
            ChannelField::Viewers => "viewers",
        }
    }

    /// Result when the channel or the field is unavailable.
    pub fn fallback(self) -> &'static str {
        match self {
            ChannelField::Game | ChannelField::Title => NOT_AVAILABLE,
            ChannelField::Viewers => "0",
        }
    }
}

/// The channel named in a stream placeholder, without a leading `@`.
pub fn channel_name(matched: &str, field: ChannelField) -> Option<&str> {
    let name = matched
        .strip_prefix("(stream|")?
        .strip_suffix(')')?
        .strip_suffix(field.name())?
        .strip_suffix('|')?
        .trim();
    let name = name.strip_prefix('@').unwrap_or(name);
    (!name.is_empty()).then_some(name)
}

pub(crate) async fn lookup(resolver: &Resolver, field: ChannelField, matched: &str) -> String {
    let Some(name) = channel_name(matched, field) else {
        return field.fallback().to_string();
    };
    let info = match resolver.collaborators().channels.channel(name).await {
        Ok(Some(info)) => info,
        Ok(None) => return field.fallback().to_string(),
        Err(e) => {
            warn!(channel = name, field = field.name(), error = %e, "channel lookup failed");
            return field.fallback().to_string();
        }
    };
    let value = match field {
        ChannelField::Game => info.game,
        ChannelField::Title => info.title,
        ChannelField::Viewers => info.viewers.map(|v| v.to_string()),
    };
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| field.fallback().to_string())
}
