//! Global `$token` substitution applied once before the stages run.
//!
//! Each token family is only looked up when one of its tokens is present,
//! and the lookups run concurrently.

use parley_script::format_number;
use tracing::warn;

use crate::model::{EventKind, EventRecord, StreamStats};
use crate::pipeline::Resolver;

use super::info::NOT_AVAILABLE;

/// Translation key used when no song is playing.
pub const NOT_PLAYING_KEY: &str = "songs.not-playing";

/// Tokens filled from the stream statistics.
pub const STATS_TOKENS: [&str; 9] = [
    "$game",
    "$language",
    "$viewers",
    "$views",
    "$followers",
    "$hosts",
    "$subscribers",
    "$bits",
    "$title",
];

pub(crate) async fn substitute(resolver: &Resolver, template: String) -> String {
    let collaborators = resolver.collaborators();
    let config = resolver.config();
    let has = |token: &str| template.contains(token);

    let stats = async {
        if STATS_TOKENS.iter().any(|token| has(token)) {
            Some(collaborators.stream.stats().await)
        } else {
            None
        }
    };
    let follower = event_tokens(resolver, has("$latestFollower"), &[EventKind::Follow], |e| {
        vec![("$latestFollower", username(e))]
    });
    let subscriber = event_tokens(
        resolver,
        has("$latestSubscriber"),
        &EventKind::SUBSCRIPTIONS,
        |e| vec![("$latestSubscriber", username(e))],
    );
    let tip = event_tokens(resolver, has("$latestTip"), &[EventKind::Tip], |e| {
        vec![
            (
                "$latestTipAmount",
                field(e, |e| e.values.amount.map(|a| format!("{a:.2}"))),
            ),
            ("$latestTipCurrency", field(e, |e| e.values.currency.clone())),
            ("$latestTipMessage", field(e, |e| e.values.message.clone())),
            ("$latestTip", username(e)),
        ]
    });
    let cheer = event_tokens(resolver, has("$latestCheer"), &[EventKind::Cheer], |e| {
        vec![
            ("$latestCheerAmount", field(e, |e| e.values.amount.map(format_number))),
            ("$latestCheerMessage", field(e, |e| e.values.message.clone())),
            ("$latestCheer", username(e)),
        ]
    });
    let spotify = async {
        if has("$spotifySong") {
            Some(match collaborators.media.spotify_song().await {
                Some(playing) => config
                    .spotify_format
                    .replace("$song", &playing.song)
                    .replace("$artist", &playing.artist),
                None => collaborators.translator.translate(NOT_PLAYING_KEY),
            })
        } else {
            None
        }
    };
    let song_request = async {
        if has("$ytSong") {
            Some(
                collaborators
                    .media
                    .song_request()
                    .await
                    .unwrap_or_else(|| collaborators.translator.translate(NOT_PLAYING_KEY)),
            )
        } else {
            None
        }
    };

    let (stats, follower, subscriber, tip, cheer, spotify, song_request) =
        tokio::join!(stats, follower, subscriber, tip, cheer, spotify, song_request);

    let mut text = template;
    if let Some(stats) = stats {
        text = replace_stats(text, &stats);
    }
    text = text.replace("$version", &config.version);
    for (token, value) in [follower, subscriber, tip, cheer].into_iter().flatten() {
        text = text.replace(token, &value);
    }
    if let Some(song) = spotify {
        text = text.replace("$spotifySong", &song);
    }
    if let Some(song) = song_request {
        text = text.replace("$ytSong", &song);
    }
    text
}

fn replace_stats(text: String, stats: &StreamStats) -> String {
    let or_na = |value: &Option<String>| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    text.replace("$game", &or_na(&stats.game))
        .replace("$language", &or_na(&stats.language))
        .replace("$viewers", &stats.viewers.to_string())
        .replace("$views", &stats.views.to_string())
        .replace("$followers", &stats.followers.to_string())
        .replace("$hosts", &stats.hosts.to_string())
        .replace("$subscribers", &stats.subscribers.to_string())
        .replace("$bits", &stats.bits.to_string())
        .replace("$title", &or_na(&stats.title))
}

/// Replacements for one event family, empty when none of its tokens is
/// present. A missing event renders every token as `n/a`.
async fn event_tokens(
    resolver: &Resolver,
    requested: bool,
    kinds: &[EventKind],
    render: impl Fn(Option<&EventRecord>) -> Vec<(&'static str, String)>,
) -> Vec<(&'static str, String)> {
    if !requested {
        return Vec::new();
    }
    let event = match resolver.collaborators().events.latest(kinds).await {
        Ok(event) => event,
        Err(e) => {
            warn!(?kinds, error = %e, "latest event lookup failed");
            None
        }
    };
    render(event.as_ref())
}

fn username(event: Option<&EventRecord>) -> String {
    event.map_or_else(|| NOT_AVAILABLE.to_string(), |e| e.username.clone())
}

fn field(event: Option<&EventRecord>, get: impl Fn(&EventRecord) -> Option<String>) -> String {
    event
        .and_then(get)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
