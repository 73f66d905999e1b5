//! `$querystring` and `(url|text)`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::context::ResolutionContext;

/// Everything `encodeURI` escapes: all but ASCII alphanumerics and the URI
/// reserved and unreserved marks.
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// The parameter encoded as a URL component.
pub fn query_string(ctx: &ResolutionContext) -> String {
    urlencoding::encode(ctx.param()).into_owned()
}

/// The text of `(url|text)` encoded as a whole URI.
pub fn url_encode(matched: &str) -> String {
    encode_uri(super::placeholder_body(matched, "(url|"))
}

/// Percent-encode everything outside the URI reserved and unreserved sets.
pub fn encode_uri(text: &str) -> String {
    utf8_percent_encode(text, URI).to_string()
}
