//! The server-side view of an incoming request.
//!
//! Verification never reads ambient process state: the transport adapter
//! hands over an explicit [`RequestView`] carrying everything the checks
//! need, including the server-side timestamp, so the core stays pure and
//! tests can inject fixed values.

use chrono::{DateTime, Utc};

/// An incoming request as seen by the verifier.
///
/// `server_name`, `port`, and `scheme` describe the transport endpoint the
/// request actually arrived on; they are deliberately separate from the
/// `Host` header, which is attacker-controlled input.
#[derive(Debug, Clone)]
pub struct RequestView {
    /// Uppercase HTTP method.
    pub method: String,
    /// Request target: path plus optional raw `?query`.
    pub uri: String,
    /// Transport scheme, `http` or `https`.
    pub scheme: String,
    /// Effective server name from the transport.
    pub server_name: String,
    /// Transport port, if one was explicit.
    pub port: Option<u16>,
    /// All request headers in arrival order. Multi-valued headers repeat
    /// their name.
    pub headers: Vec<(String, String)>,
    /// Server-side timestamp the freshness check compares against.
    pub timestamp: DateTime<Utc>,
}

impl RequestView {
    /// The first value of a header, by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The path part of the request target.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri
            .split_once('?')
            .map_or(self.uri.as_str(), |(path, _)| path)
    }

    /// The raw query part of the request target, without the `?`.
    #[must_use]
    pub fn query(&self) -> &str {
        self.uri.split_once('?').map_or("", |(_, query)| query)
    }
}

/// The default port for a transport scheme.
pub(crate) fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}
