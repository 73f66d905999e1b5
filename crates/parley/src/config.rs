//! Resolver configuration.

use std::time::Duration;

use bon::Builder;
use parley_script::DEFAULT_MAX_DEPTH;
use serde::Deserialize;

/// Format used for `$spotifySong` unless configured otherwise.
pub const DEFAULT_SPOTIFY_FORMAT: &str = "$song - $artist";

/// Settings shared by every resolution call.
///
/// Deserializes from a partial JSON object; missing keys take the same
/// defaults as the builder.
///
/// ```
/// use parley::ResolverConfig;
///
/// let config = ResolverConfig::builder().bot_username("parleybot").build();
/// assert!(config.show_with_at);
/// assert_eq!(config.reply_stagger_ms, 500);
/// ```
#[derive(Debug, Clone, Builder, Deserialize)]
#[builder(on(String, into))]
#[serde(default)]
pub struct ResolverConfig {
    /// Prefix mentions with `@`.
    #[builder(default = true)]
    pub show_with_at: bool,

    /// Value substituted for `$version`.
    #[builder(default = env!("CARGO_PKG_VERSION").to_string())]
    pub version: String,

    /// Excluded from random picks and online listings.
    #[builder(default)]
    pub bot_username: String,

    /// Excluded from random picks and online listings.
    #[builder(default)]
    pub broadcaster_username: String,

    /// Delay between forwarded responses of a visible nested command.
    #[builder(default = 500)]
    pub reply_stagger_ms: u64,

    /// Template for `$spotifySong`, with `$song` and `$artist` tokens.
    #[builder(default = DEFAULT_SPOTIFY_FORMAT.to_string())]
    pub spotify_format: String,

    /// Nesting limit for sandbox expressions.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl ResolverConfig {
    pub fn reply_stagger(&self) -> Duration {
        Duration::from_millis(self.reply_stagger_ms)
    }

    /// Lowercased bot and broadcaster names, skipping unset ones.
    pub fn excluded_usernames(&self) -> Vec<String> {
        [&self.bot_username, &self.broadcaster_username]
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_lowercase())
            .collect()
    }

    /// Render a username as a mention.
    pub fn mention(&self, username: &str) -> String {
        if self.show_with_at {
            format!("@{username}")
        } else {
            username.to_string()
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"show_with_at": false, "bot_username": "Bot"}"#).unwrap();
        assert!(!config.show_with_at);
        assert_eq!(config.reply_stagger_ms, 500);
        assert_eq!(config.spotify_format, DEFAULT_SPOTIFY_FORMAT);
        assert_eq!(config.excluded_usernames(), vec!["bot".to_string()]);
        assert_eq!(config.mention("viewer"), "viewer");
    }
}
