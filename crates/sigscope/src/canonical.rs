//! Canonical request construction.
//!
//! Signer and verifier must derive the exact same byte string from a request,
//! so every step here is deterministic:
//!
//! ```text
//! METHOD\n
//! NormalizedPath\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! hex(hash(payload))
//! ```
//!
//! Query canonicalization carries one compatibility quirk inherited from
//! existing signers: a key containing a raw space is truncated at the first
//! space and its value dropped. This is not standard URL semantics, but
//! interoperability requires matching it bit for bit.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::sign::HashAlgo;

/// The set of characters percent-encoded in canonical query components.
///
/// Everything except RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full canonical request string.
///
/// `uri` is the request target: a path plus optional `?query`. The signed
/// header names must be lowercase; they are sorted here before use.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    payload: &[u8],
    headers: &[(String, String)],
    signed_headers: &[String],
    algo: HashAlgo,
) -> String {
    let (path, query) = split_uri(uri);
    format!(
        "{method}\n{path}\n{query}\n{headers}\n\n{signed}\n{payload_hash}",
        method = method.to_ascii_uppercase(),
        path = normalize_path(path),
        query = build_canonical_query(query),
        headers = build_canonical_headers(headers, signed_headers),
        signed = build_signed_headers_string(signed_headers),
        payload_hash = algo.hash_hex(payload),
    )
}

/// Split a request target into its path and raw query parts.
#[must_use]
pub fn split_uri(uri: &str) -> (&str, &str) {
    match uri.split_once('?') {
        Some((path, query)) => (path, query),
        None => (uri, ""),
    }
}

/// Normalize a request path without touching percent-encoding.
///
/// `.` segments are dropped, `..` removes the preceding non-empty segment,
/// repeated slashes collapse, a trailing slash survives, and an empty result
/// becomes `/`.
///
/// # Examples
///
/// ```
/// use sigscope::canonical::normalize_path;
///
/// assert_eq!(normalize_path(""), "/");
/// assert_eq!(normalize_path("//foo//"), "/foo/");
/// assert_eq!(normalize_path("/foo/bar/.."), "/foo");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trailing_slash = path.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    normalized.push('/');
    normalized.push_str(&segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Canonicalize a raw query string.
///
/// Pairs are split on the first `=` (a missing value is empty). A key with a
/// raw space is truncated at the space and its value emptied (compatibility
/// quirk, see the module docs). Each component is normalized by substituting
/// `+` with space, percent-decoding, and re-encoding with the unreserved
/// set, so differently-encoded inputs canonicalize identically. The encoded
/// `key=value` strings are byte-sorted and joined with `&`.
#[must_use]
pub fn build_canonical_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (key, value) = match key.find(' ') {
                Some(space) => (&key[..space], ""),
                None => (key, value),
            };
            format!(
                "{}={}",
                encode_query_component(key),
                encode_query_component(value)
            )
        })
        .collect();

    pairs.sort_unstable();
    pairs.join("&")
}

/// Canonicalize request headers.
///
/// Only headers named in `signed_headers` (lowercase) are kept. Names are
/// lowercased, values trimmed of ASCII whitespace but otherwise untouched.
/// Values sharing a name are sorted and joined with `,`; the groups are
/// emitted sorted by name, one `name:value` line each.
#[must_use]
pub fn build_canonical_headers(headers: &[(String, String)], signed_headers: &[String]) -> String {
    let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        let lower = name.to_ascii_lowercase();
        if signed_headers.iter().any(|signed| *signed == lower) {
            groups.entry(lower).or_default().push(value.trim_ascii());
        }
    }

    groups
        .into_iter()
        .map(|(name, mut values)| {
            values.sort_unstable();
            format!("{name}:{}", values.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The signed-headers list: sorted lowercase names joined with `;`.
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[String]) -> String {
    let mut sorted: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(";")
}

fn encode_query_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = percent_decode_str(&spaced).decode_utf8_lossy();
    utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
}

/// Percent-encode a raw value with the unreserved set, without decoding.
///
/// Used when appending presigned parameter values to a URL.
pub(crate) fn encode_uri_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn test_should_normalize_empty_path_to_slash() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_should_collapse_repeated_slashes_keeping_trailing() {
        assert_eq!(normalize_path("//"), "/");
        assert_eq!(normalize_path("//foo//"), "/foo/");
        assert_eq!(normalize_path("/a//b"), "/a/b");
    }

    #[test]
    fn test_should_resolve_dot_segments() {
        assert_eq!(normalize_path("/./"), "/");
        assert_eq!(normalize_path("/./foo"), "/foo");
        assert_eq!(normalize_path("/foo/.."), "/");
        assert_eq!(normalize_path("/foo/bar/../.."), "/");
        assert_eq!(normalize_path("/foo/bar/../baz"), "/foo/baz");
        assert_eq!(normalize_path("/../foo"), "/foo");
    }

    #[test]
    fn test_should_not_touch_percent_encoding_in_paths() {
        assert_eq!(normalize_path("/hello%20world"), "/hello%20world");
        assert_eq!(normalize_path("/a%2Fb/c"), "/a%2Fb/c");
    }

    #[test]
    fn test_should_be_idempotent_on_paths() {
        for path in ["", "/", "//foo//", "/a/./b/../c", "/x%20y/"] {
            let once = normalize_path(path);
            assert_eq!(normalize_path(&once), once, "not idempotent for {path:?}");
        }
    }

    #[test]
    fn test_should_return_empty_canonical_query_for_empty_input() {
        assert_eq!(build_canonical_query(""), "");
    }

    #[test]
    fn test_should_sort_query_pairs_bytewise() {
        assert_eq!(build_canonical_query("b=2&a=1&c=3"), "a=1&b=2&c=3");
        assert_eq!(
            build_canonical_query("foo=bar&X-Last=1"),
            "X-Last=1&foo=bar"
        );
    }

    #[test]
    fn test_should_be_order_independent_on_query_input() {
        assert_eq!(
            build_canonical_query("foo=bar&baz=barbaz"),
            build_canonical_query("baz=barbaz&foo=bar")
        );
    }

    #[test]
    fn test_should_default_missing_query_values_to_empty() {
        assert_eq!(build_canonical_query("flag"), "flag=");
        assert_eq!(build_canonical_query("flag&a=1"), "a=1&flag=");
    }

    #[test]
    fn test_should_truncate_keys_containing_spaces() {
        assert_eq!(build_canonical_query("a b=c"), "a=");
        assert_eq!(build_canonical_query("key part=value&x=y"), "key=&x=y");
    }

    #[test]
    fn test_should_substitute_plus_with_space_before_encoding() {
        assert_eq!(build_canonical_query("k=a+b"), "k=a%20b");
        assert_eq!(build_canonical_query("k=a%2Bb"), "k=a%2Bb");
    }

    #[test]
    fn test_should_normalize_percent_encoded_query_components() {
        assert_eq!(build_canonical_query("k=a%2Fb"), "k=a%2Fb");
        assert_eq!(build_canonical_query("k=a/b"), "k=a%2Fb");
        assert_eq!(
            build_canonical_query("cred=th3K3y%2F20110511%2Fus-east-1"),
            "cred=th3K3y%2F20110511%2Fus-east-1"
        );
    }

    #[test]
    fn test_should_lowercase_names_and_trim_values_in_headers() {
        let headers = owned(&[
            ("Host", "  iam.amazonaws.com  "),
            ("Content-Type", "application/x-www-form-urlencoded; charset=utf-8"),
        ]);
        let signed = names(&["content-type", "host"]);
        assert_eq!(
            build_canonical_headers(&headers, &signed),
            "content-type:application/x-www-form-urlencoded; charset=utf-8\n\
             host:iam.amazonaws.com"
        );
    }

    #[test]
    fn test_should_keep_inner_whitespace_in_header_values() {
        let headers = owned(&[("X-Note", "a   b")]);
        let signed = names(&["x-note"]);
        assert_eq!(build_canonical_headers(&headers, &signed), "x-note:a   b");
    }

    #[test]
    fn test_should_sort_values_within_a_header_group() {
        let headers = owned(&[("X-Tag", "zeta"), ("x-tag", "alpha"), ("X-TAG", "mid")]);
        let signed = names(&["x-tag"]);
        assert_eq!(
            build_canonical_headers(&headers, &signed),
            "x-tag:alpha,mid,zeta"
        );
    }

    #[test]
    fn test_should_drop_headers_outside_signed_list() {
        let headers = owned(&[("Host", "example.com"), ("User-Agent", "tests")]);
        let signed = names(&["host"]);
        assert_eq!(build_canonical_headers(&headers, &signed), "host:example.com");
    }

    #[test]
    fn test_should_join_sorted_signed_header_names() {
        assert_eq!(
            build_signed_headers_string(&names(&["x-ems-date", "host", "content-type"])),
            "content-type;host;x-ems-date"
        );
    }

    #[test]
    fn test_should_assemble_canonical_request() {
        let headers = owned(&[
            ("Content-Type", "application/x-www-form-urlencoded; charset=utf-8"),
            ("Host", "iam.amazonaws.com"),
            ("X-Ems-Date", "20110909T233600Z"),
        ]);
        let signed = names(&["content-type", "host", "x-ems-date"]);
        let canonical = build_canonical_request(
            "POST",
            "/",
            b"Action=ListUsers&Version=2010-05-08",
            &headers,
            &signed,
            HashAlgo::Sha256,
        );

        let expected = "POST\n\
                        /\n\
                        \n\
                        content-type:application/x-www-form-urlencoded; charset=utf-8\n\
                        host:iam.amazonaws.com\n\
                        x-ems-date:20110909T233600Z\n\
                        \n\
                        content-type;host;x-ems-date\n\
                        b6359072c78d70ebee1e81adcbab4f01bf2c23245fa365ef83fe8f1f955085e2";
        assert_eq!(canonical, expected);
    }
}
