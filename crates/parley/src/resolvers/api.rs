//! Trailing `(api|url)` call with `(api._response)` and `(api.path)`
//! projections.

use std::sync::OnceLock;

use parley_script::Value;
use parley_script::path::lookup;
use regex::Regex;
use serde_json::Value as Json;
use tracing::{error, warn};

use crate::pipeline::Resolver;

pub const API_ERROR_KEY: &str = "core.api.error";
pub const NOT_AVAILABLE_KEY: &str = "core.api.not-available";

/// Placeholder replaced by the whole response.
pub const RESPONSE_TAG: &str = "(api._response)";

static API_CALL: OnceLock<Option<Regex>> = OnceLock::new();
static API_TAG: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            error!(source, error = %e, "invalid api pattern");
            None
        }
    })
    .as_ref()
}

/// The first `(api|http…)` call: its full text and the decoded URL.
pub fn find_call(buffer: &str) -> Option<(String, String)> {
    let captures = compiled(&API_CALL, r"(?i)\(api\|(http\S+)\)")?.captures(buffer)?;
    let call = captures.get(0)?.as_str().to_string();
    let url = captures.get(1)?.as_str().replace("&amp;", "&");
    Some((call, url))
}

/// Projection tags other than `(api._response)`, in order of appearance.
pub fn projection_tags(buffer: &str) -> Vec<(String, String)> {
    let Some(regex) = compiled(&API_TAG, r"\(api\.(\S*?)\)") else {
        return Vec::new();
    };
    regex
        .captures_iter(buffer)
        .filter_map(|captures| {
            let tag = captures.get(0)?.as_str();
            let path = captures.get(1)?.as_str();
            (!path.starts_with("_response")).then(|| (tag.to_string(), path.to_string()))
        })
        .collect()
}

/// Run the first API call in `buffer` and fill in its projections.
pub(crate) async fn project(resolver: &Resolver, buffer: String) -> String {
    let Some((call, url)) = find_call(&buffer) else {
        return buffer;
    };
    let mut buffer = buffer.replacen(&call, "", 1).trim().to_string();
    let translator = &resolver.collaborators().translator;

    let response = match resolver.collaborators().http.get(&url).await {
        Ok(response) if response.status == 200 => response,
        Ok(response) => {
            warn!(url = %url, status = response.status, "api call was not successful");
            return translator.translate(API_ERROR_KEY);
        }
        Err(e) => {
            warn!(url = %url, error = %e, "api call failed");
            return translator.translate(API_ERROR_KEY);
        }
    };

    let data = response.json();
    let tags = projection_tags(&buffer);
    if tags.is_empty() {
        let text = match data {
            Some(json @ (Json::Object(_) | Json::Array(_))) => json.to_string(),
            Some(Json::String(text)) => text,
            Some(other) => other.to_string(),
            None => strip_quotes(&response.body).to_string(),
        };
        return buffer.replacen(RESPONSE_TAG, &text, 1);
    }

    let root = data.map_or(Value::Null, Value::from);
    for (tag, path) in tags {
        let value = match lookup(&root, &path) {
            Value::Null => translator.translate(NOT_AVAILABLE_KEY),
            value => value.to_string(),
        };
        buffer = buffer.replacen(&tag, &value, 1);
    }
    buffer
}

fn strip_quotes(body: &str) -> &str {
    body.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_is_found_and_decoded() {
        assert_eq!(
            find_call("Weather: (api.temp) (api|https://w.test/?a=1&amp;b=2)"),
            Some((
                "(api|https://w.test/?a=1&amp;b=2)".to_string(),
                "https://w.test/?a=1&b=2".to_string()
            ))
        );
        assert_eq!(find_call("(api|ftp://x)"), None);
    }

    #[test]
    fn response_tag_is_not_a_projection() {
        assert_eq!(
            projection_tags("(api._response) (api.a.b[0]) (api.c)"),
            vec![
                ("(api.a.b[0])".to_string(), "a.b[0]".to_string()),
                ("(api.c)".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(strip_quotes("\"hi\""), "hi");
        assert_eq!(strip_quotes("hi"), "hi");
    }
}
