//! The signing side.
//!
//! A [`Client`] holds one credential and the party it signs for. It presents
//! signatures in either of the two supported shapes: an authorization header
//! added to the request headers, or presigned query parameters appended to a
//! URL.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::canonical::{self, build_canonical_request, build_signed_headers_string};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::parse::{
    PARAM_ALGORITHM, PARAM_CREDENTIALS, PARAM_DATE, PARAM_EXPIRES, PARAM_SIGNATURE,
    PARAM_SIGNED_HEADERS,
};
use crate::request::default_port;
use crate::scope::Party;
use crate::sign::{
    UNSIGNED_PAYLOAD, build_string_to_sign, compute_signature, derive_signing_key,
};
use crate::time;

/// An access key id and its secret.
#[derive(Clone)]
pub struct ClientCredential {
    /// The public access key id embedded in credential strings.
    pub access_key_id: String,
    /// The shared secret the signing key is derived from.
    pub secret: String,
}

impl ClientCredential {
    /// Create a credential pair.
    pub fn new(access_key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A configured request signer.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sigscope::{Client, ClientCredential, Party};
///
/// let client = Client::new(
///     ClientCredential::new("AKIDEXAMPLE", "secret"),
///     Party::new("us-east-1", "iam", "aws4_request"),
/// );
/// let date = Utc.with_ymd_and_hms(2011, 9, 9, 23, 36, 0).unwrap();
/// let headers = client
///     .sign_headers("POST", "http://iam.amazonaws.com/", b"body", &[], &[], date)
///     .unwrap();
/// assert!(headers.iter().any(|(name, _)| name == "X-Ems-Auth"));
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    credential: ClientCredential,
    party: Party,
    config: AuthConfig,
}

impl Client {
    /// Create a client with the default configuration.
    #[must_use]
    pub fn new(credential: ClientCredential, party: Party) -> Self {
        Self {
            credential,
            party,
            config: AuthConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Sign a request for header presentation.
    ///
    /// Returns `extra_headers` augmented with `host` (derived from the URL),
    /// the date header, and the authorization header. `host` and the date
    /// header always end up in the signed set; pass additional names through
    /// `headers_to_sign`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] when the URL cannot be parsed or
    /// has no host.
    pub fn sign_headers(
        &self,
        method: &str,
        url: &str,
        body: &[u8],
        extra_headers: &[(String, String)],
        headers_to_sign: &[&str],
        date: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, AuthError> {
        let target = parse_url(url)?;
        let long_date = time::format_long_date(&date);

        let mut headers: Vec<(String, String)> = extra_headers.to_vec();
        if !has_header(&headers, "host") {
            headers.push(("host".to_owned(), target.host_header.clone()));
        }
        if !has_header(&headers, &self.config.date_header_name) {
            headers.push((self.config.date_header_name.clone(), long_date.clone()));
        }

        let signed = self.signed_header_names(headers_to_sign, true);
        let signature = self.signature_over(
            method,
            &target.path_and_query,
            body,
            &headers,
            &signed,
            &long_date,
        );

        let authorization = format!(
            "{algorithm} Credential={credential}, SignedHeaders={signed_list}, Signature={signature}",
            algorithm = self.config.algorithm_id(),
            credential = self.credential_string(&long_date),
            signed_list = build_signed_headers_string(&signed),
        );
        headers.push((self.config.auth_header_name.clone(), authorization));
        Ok(headers)
    }

    /// Presign a GET URL.
    ///
    /// Appends the algorithm, credentials, date, expiry, and signed-headers
    /// parameters, signs the resulting URL with the `UNSIGNED-PAYLOAD`
    /// sentinel as payload, and appends the signature parameter last. The
    /// only mandatory signed header is `host`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] when the URL cannot be parsed or
    /// has no host.
    pub fn sign_url(
        &self,
        url: &str,
        date: DateTime<Utc>,
        expires_seconds: u64,
        extra_headers: &[(String, String)],
        headers_to_sign: &[&str],
    ) -> Result<String, AuthError> {
        let target = parse_url(url)?;
        let long_date = time::format_long_date(&date);

        let mut headers: Vec<(String, String)> = extra_headers.to_vec();
        if !has_header(&headers, "host") {
            headers.push(("host".to_owned(), target.host_header.clone()));
        }
        let signed = self.signed_header_names(headers_to_sign, false);

        let signing_params = [
            (PARAM_ALGORITHM, self.config.algorithm_id()),
            (PARAM_CREDENTIALS, self.credential_string(&long_date)),
            (PARAM_DATE, long_date.clone()),
            (PARAM_EXPIRES, expires_seconds.to_string()),
            (PARAM_SIGNED_HEADERS, build_signed_headers_string(&signed)),
        ]
        .iter()
        .map(|(name, value)| {
            format!(
                "{key}={value}",
                key = self.config.query_key(name),
                value = canonical::encode_uri_component(value),
            )
        })
        .collect::<Vec<_>>()
        .join("&");

        let glue = if target.path_and_query.contains('?') { '&' } else { '?' };
        let request_target = format!("{}{glue}{signing_params}", target.path_and_query);
        let signature = self.signature_over(
            "GET",
            &request_target,
            UNSIGNED_PAYLOAD.as_bytes(),
            &headers,
            &signed,
            &long_date,
        );

        Ok(format!(
            "{url}{glue}{signing_params}&{signature_key}={signature}",
            signature_key = self.config.query_key(PARAM_SIGNATURE),
        ))
    }

    /// The five-part credential string for a signing date.
    fn credential_string(&self, long_date: &str) -> String {
        format!(
            "{}/{}/{}",
            self.credential.access_key_id,
            time::short_date_of(long_date),
            self.party.scope(),
        )
    }

    /// The lowercase, sorted, deduplicated signed-header set.
    fn signed_header_names(&self, requested: &[&str], include_date_header: bool) -> Vec<String> {
        let mut names: Vec<String> = requested
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        names.push("host".to_owned());
        if include_date_header {
            names.push(self.config.date_header_name.to_ascii_lowercase());
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    fn signature_over(
        &self,
        method: &str,
        request_target: &str,
        payload: &[u8],
        headers: &[(String, String)],
        signed: &[String],
        long_date: &str,
    ) -> String {
        let canonical = build_canonical_request(
            method,
            request_target,
            payload,
            headers,
            signed,
            self.config.algorithm,
        );
        debug!(canonical_request = %canonical, "built canonical request");

        let string_to_sign = build_string_to_sign(
            &self.config.vendor_prefix,
            self.config.algorithm,
            long_date,
            &self.party.scope(),
            &canonical,
        );
        let signing_key = derive_signing_key(
            &self.credential.secret,
            time::short_date_of(long_date),
            &self.party,
            self.config.algorithm,
            &self.config.vendor_prefix,
        );
        compute_signature(&signing_key, &string_to_sign, self.config.algorithm)
    }
}

struct RequestTarget {
    host_header: String,
    path_and_query: String,
}

/// Parse an absolute URL into the host-header value and request target.
///
/// The port is dropped from the host header when it is the scheme default.
fn parse_url(url: &str) -> Result<RequestTarget, AuthError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|_| AuthError::InvalidUrl(url.to_owned()))?;
    let host = uri.host().ok_or_else(|| AuthError::InvalidUrl(url.to_owned()))?;
    let scheme = uri.scheme_str().unwrap_or("http");

    let host_header = match uri.port_u16() {
        Some(port) if port != default_port(scheme) => format!("{host}:{port}"),
        _ => host.to_owned(),
    };
    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| "/".to_owned(), |target| target.as_str().to_owned());

    Ok(RequestTarget {
        host_header,
        path_and_query,
    })
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers
        .iter()
        .any(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
}
