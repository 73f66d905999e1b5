//! HTML entity decoding for stored templates.

use html_escape::decode_html_entities;

/// Decode HTML5 named and numeric character references in one pass.
/// Unknown or malformed references are kept verbatim.
pub fn decode(input: &str) -> String {
    decode_html_entities(input).into_owned()
}
