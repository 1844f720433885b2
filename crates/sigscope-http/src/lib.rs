//! `http`-crate adapter for `sigscope`.
//!
//! The core crate verifies an explicit [`RequestView`]; this crate builds
//! one from [`http::request::Parts`] plus the transport facts only the
//! server knows (scheme, effective server name, port, and the current
//! time). It also applies a client's signed headers to an
//! [`http::HeaderMap`] for outgoing requests.

use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use sigscope::{Client, RequestView};

/// Adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Signing failed in the core library.
    #[error(transparent)]
    Auth(#[from] sigscope::AuthError),

    /// A signed header cannot be represented as an HTTP header.
    #[error("header {0} cannot be represented in HTTP")]
    InvalidHeader(String),
}

/// Build a [`RequestView`] from parsed request parts and transport facts.
///
/// `scheme`, `server_name`, and `port` must come from the transport, not
/// from request headers: the host check exists to catch requests whose
/// `Host` header disagrees with the endpoint they arrived on. Header values
/// that are not valid UTF-8 are dropped; such headers cannot take part in a
/// signature anyway.
#[must_use]
pub fn request_view(
    parts: &http::request::Parts,
    scheme: &str,
    server_name: &str,
    port: Option<u16>,
    timestamp: DateTime<Utc>,
) -> RequestView {
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |target| target.as_str().to_owned());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect();

    RequestView {
        method: parts.method.as_str().to_owned(),
        uri,
        scheme: scheme.to_owned(),
        server_name: server_name.to_owned(),
        port,
        headers,
        timestamp,
    }
}

/// Sign a request and return the full header map to send.
///
/// # Errors
///
/// Returns [`AdapterError::Auth`] when signing fails and
/// [`AdapterError::InvalidHeader`] when a produced header cannot be encoded.
pub fn sign_into_header_map(
    client: &Client,
    method: &Method,
    url: &str,
    body: &[u8],
    headers_to_sign: &[&str],
    date: DateTime<Utc>,
) -> Result<HeaderMap, AdapterError> {
    let signed = client.sign_headers(method.as_str(), url, body, &[], headers_to_sign, date)?;

    let mut map = HeaderMap::with_capacity(signed.len());
    for (name, value) in &signed {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AdapterError::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| AdapterError::InvalidHeader(name.clone()))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}
