//! The verification side.
//!
//! [`Server::authenticate`] runs a fixed pipeline of checks over an incoming
//! request. Each check aborts verification with its own error; the order is
//! part of the contract:
//!
//! 1. extract auth elements (authorization header preferred, presigned
//!    query parameters accepted for GET requests)
//! 2. mandatory signed headers (`host`, plus the date header for header
//!    origin)
//! 3. algorithm allow-list
//! 4. date shape, credential-date match, freshness window
//! 5. transport host against the signed `Host` header
//! 6. credential scope against the configured party
//! 7. key lookup, signature recomputation, constant-time comparison
//!
//! Verification is stateless; every call is an independent pipeline over its
//! inputs.

use std::fmt;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::build_canonical_request;
use crate::config::AuthConfig;
use crate::credentials::KeyProvider;
use crate::error::AuthError;
use crate::parse::{
    AuthElements, AuthHeaderGrammar, AuthSource, PARAM_SIGNATURE, parse_header_auth,
    parse_query_auth, parse_query_pairs,
};
use crate::request::{RequestView, default_port};
use crate::scope::Party;
use crate::sign::{
    HashAlgo, UNSIGNED_PAYLOAD, build_string_to_sign, compute_signature, derive_signing_key,
};
use crate::time;

/// Tolerated distance between the declared request date and the server time.
///
/// Forward drift (a request dated in the future) is bounded by this value in
/// both presentation modes; backward drift uses it only for header origin,
/// where no explicit expiry travels with the request.
const ALLOWED_CLOCK_SKEW_SECS: i64 = 900;

/// A configured request verifier.
pub struct Server {
    party: Party,
    keys: Box<dyn KeyProvider>,
    config: AuthConfig,
    grammar: AuthHeaderGrammar,
}

impl Server {
    /// Create a verifier with the default configuration.
    #[must_use]
    pub fn new(party: Party, keys: Box<dyn KeyProvider>) -> Self {
        let config = AuthConfig::default();
        Self {
            grammar: AuthHeaderGrammar::new(&config.vendor_prefix),
            party,
            keys,
            config,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.grammar = AuthHeaderGrammar::new(&config.vendor_prefix);
        self.config = config;
        self
    }

    /// Verify a request and return the access key id that signed it.
    ///
    /// `body` is the raw request body; it is ignored for presigned requests,
    /// which sign the `UNSIGNED-PAYLOAD` sentinel instead.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing check.
    pub fn authenticate(&self, request: &RequestView, body: &[u8]) -> Result<String, AuthError> {
        let elements = self.extract_auth_elements(request)?;
        self.check_mandatory_signed_headers(&elements)?;
        let algo = HashAlgo::from_token(&elements.algorithm)?;
        self.check_dates(&elements, request.timestamp)?;
        self.check_host(&elements, request)?;
        self.check_party(&elements)?;
        self.check_signature(&elements, algo, request, body)
    }

    /// Locate the signature material: authorization header first, presigned
    /// query parameters for GET requests second.
    fn extract_auth_elements(&self, request: &RequestView) -> Result<AuthElements, AuthError> {
        if let Some(header_value) = request.header(&self.config.auth_header_name) {
            debug!(header_value, "parsing authorization header");
            return parse_header_auth(&self.grammar, header_value, request, &self.config);
        }

        let signature_key = self.config.query_key(PARAM_SIGNATURE);
        let presigned = request.method.eq_ignore_ascii_case("GET")
            && parse_query_pairs(request.query())
                .iter()
                .any(|(key, _)| *key == signature_key);
        if presigned {
            debug!("parsing presigned query parameters");
            return parse_query_auth(request, &self.config);
        }

        Err(AuthError::NotSigned)
    }

    fn check_mandatory_signed_headers(&self, elements: &AuthElements) -> Result<(), AuthError> {
        if !elements.signed_headers.iter().any(|name| name == "host") {
            return Err(AuthError::HostNotSigned);
        }
        if elements.source == AuthSource::Header {
            let date_header = self.config.date_header_name.to_ascii_lowercase();
            if !elements.signed_headers.iter().any(|name| *name == date_header) {
                return Err(AuthError::DateNotSigned);
            }
        }
        Ok(())
    }

    fn check_dates(
        &self,
        elements: &AuthElements,
        server_time: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let request_time = time::parse_long_date(&elements.request_date)?;
        if time::short_date_of(&elements.request_date) != elements.credential.short_date {
            return Err(AuthError::DateMismatch);
        }

        let skew = (server_time - request_time).num_seconds();
        let expiry = match elements.source {
            AuthSource::Query { expires } => i64::try_from(expires).unwrap_or(i64::MAX),
            AuthSource::Header => ALLOWED_CLOCK_SKEW_SECS,
        };
        let accepted = if skew >= 0 {
            skew <= expiry
        } else {
            -skew <= ALLOWED_CLOCK_SKEW_SECS
        };
        if !accepted {
            debug!(skew, expiry, "request date outside the accepted interval");
            return Err(AuthError::OutsideTimeWindow);
        }
        Ok(())
    }

    /// Compare the transport endpoint against the signed `Host` header.
    ///
    /// A port that is the scheme default is treated as absent on both sides;
    /// any other port must match literally.
    fn check_host(&self, elements: &AuthElements, request: &RequestView) -> Result<(), AuthError> {
        let default = default_port(&request.scheme);
        let (signed_name, signed_port) = split_host_port(&elements.host);
        let signed_port = signed_port.filter(|port| *port != default);
        let request_port = request.port.filter(|port| *port != default);

        if !signed_name.eq_ignore_ascii_case(&request.server_name) || signed_port != request_port {
            debug!(
                signed_host = %elements.host,
                server_name = %request.server_name,
                "transport host does not match the signed host"
            );
            return Err(AuthError::HostMismatch);
        }
        Ok(())
    }

    fn check_party(&self, elements: &AuthElements) -> Result<(), AuthError> {
        if elements.credential.party != self.party {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    fn check_signature(
        &self,
        elements: &AuthElements,
        algo: HashAlgo,
        request: &RequestView,
        body: &[u8],
    ) -> Result<String, AuthError> {
        let secret = self
            .keys
            .secret_key(&elements.credential.access_key_id)
            .ok_or(AuthError::InvalidAccessKeyId)?;

        // Rebuild what the signer saw: for presigned requests that is the
        // request target without the signature parameter, signed over the
        // UNSIGNED-PAYLOAD sentinel.
        let (request_target, payload): (String, &[u8]) = match elements.source {
            AuthSource::Header => (request.uri.clone(), body),
            AuthSource::Query { .. } => {
                let signature_key = self.config.query_key(PARAM_SIGNATURE);
                let stripped = strip_query_param(request.query(), &signature_key);
                let target = if stripped.is_empty() {
                    request.path().to_owned()
                } else {
                    format!("{}?{stripped}", request.path())
                };
                (target, UNSIGNED_PAYLOAD.as_bytes())
            }
        };

        let canonical = build_canonical_request(
            &request.method,
            &request_target,
            payload,
            &request.headers,
            &elements.signed_headers,
            algo,
        );
        debug!(canonical_request = %canonical, "built canonical request");

        let string_to_sign = build_string_to_sign(
            &self.config.vendor_prefix,
            algo,
            &elements.request_date,
            &elements.credential.party.scope(),
            &canonical,
        );
        debug!(string_to_sign = %string_to_sign, "built string to sign");

        let signing_key = derive_signing_key(
            &secret,
            &elements.credential.short_date,
            &elements.credential.party,
            algo,
            &self.config.vendor_prefix,
        );
        let expected = compute_signature(&signing_key, &string_to_sign, algo);

        if expected.as_bytes().ct_eq(elements.signature.as_bytes()).into() {
            debug!(
                access_key_id = %elements.credential.access_key_id,
                "signature verification succeeded"
            );
            Ok(elements.credential.access_key_id.clone())
        } else {
            debug!(expected = %expected, provided = %elements.signature, "signature mismatch");
            Err(AuthError::SignatureMismatch)
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("party", &self.party)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Split a `Host` header value into name and explicit port.
///
/// A suffix that does not parse as a port is kept as part of the name.
fn split_host_port(host: &str) -> (&str, Option<u16>) {
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        None => (host, None),
    }
}

/// Remove the pair with the given literal key from a raw query string.
fn strip_query_param(query: &str, key: &str) -> String {
    query
        .split('&')
        .filter(|pair| pair.split_once('=').map_or(*pair, |(pair_key, _)| pair_key) != key)
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::credentials::StaticKeyProvider;

    fn server() -> Server {
        Server::new(
            Party::new("us-east-1", "iam", "aws4_request"),
            Box::new(StaticKeyProvider::new([(
                "AKIDEXAMPLE".to_owned(),
                "secret".to_owned(),
            )])),
        )
    }

    fn view(server_name: &str, port: Option<u16>, host_header: &str) -> RequestView {
        RequestView {
            method: "GET".to_owned(),
            uri: "/".to_owned(),
            scheme: "http".to_owned(),
            server_name: server_name.to_owned(),
            port,
            headers: vec![("Host".to_owned(), host_header.to_owned())],
            timestamp: Utc.with_ymd_and_hms(2011, 9, 9, 23, 36, 0).unwrap(),
        }
    }

    fn elements_with_host(host: &str) -> AuthElements {
        AuthElements {
            algorithm: "SHA256".to_owned(),
            credential: crate::scope::Credential::parse(
                "AKIDEXAMPLE/20110909/us-east-1/iam/aws4_request",
            )
            .unwrap(),
            signed_headers: vec!["host".to_owned()],
            signature: "00".to_owned(),
            request_date: "20110909T233600Z".to_owned(),
            host: host.to_owned(),
            source: AuthSource::Query { expires: 60 },
        }
    }

    #[test]
    fn test_should_split_host_and_port() {
        assert_eq!(split_host_port("example.com"), ("example.com", None));
        assert_eq!(split_host_port("example.com:8080"), ("example.com", Some(8080)));
        assert_eq!(split_host_port("example.com:notaport"), ("example.com:notaport", None));
    }

    #[test]
    fn test_should_treat_scheme_default_port_as_absent() {
        let server = server();
        let elements = elements_with_host("example.com:80");
        assert!(server.check_host(&elements, &view("example.com", None, "example.com:80")).is_ok());

        let elements = elements_with_host("example.com");
        assert!(server.check_host(&elements, &view("example.com", Some(80), "example.com")).is_ok());
    }

    #[test]
    fn test_should_require_literal_match_for_other_ports() {
        let server = server();
        let elements = elements_with_host("example.com:8080");
        assert!(server
            .check_host(&elements, &view("example.com", Some(8080), "example.com:8080"))
            .is_ok());

        let elements = elements_with_host("example.com");
        assert!(matches!(
            server.check_host(&elements, &view("example.com", Some(8080), "example.com")),
            Err(AuthError::HostMismatch)
        ));
    }

    #[test]
    fn test_should_reject_differing_server_names() {
        let server = server();
        let elements = elements_with_host("iam.amazonaws.com");
        assert!(matches!(
            server.check_host(&elements, &view("example.com", None, "iam.amazonaws.com")),
            Err(AuthError::HostMismatch)
        ));
    }

    #[test]
    fn test_should_strip_only_the_requested_query_key() {
        let stripped = strip_query_param(
            "foo=bar&X-EMS-Signature=abc&X-EMS-Expires=60",
            "X-EMS-Signature",
        );
        assert_eq!(stripped, "foo=bar&X-EMS-Expires=60");

        assert_eq!(strip_query_param("X-EMS-Signature=abc", "X-EMS-Signature"), "");
    }

    #[test]
    fn test_should_accept_backward_drift_within_tolerance() {
        let server = server();
        let mut elements = elements_with_host("example.com");
        elements.source = AuthSource::Header;
        elements.signed_headers.push("x-ems-date".to_owned());

        // Request dated 10 minutes ahead of the server clock.
        let server_time = Utc.with_ymd_and_hms(2011, 9, 9, 23, 26, 0).unwrap();
        assert!(server.check_dates(&elements, server_time).is_ok());

        // 16 minutes ahead is outside the tolerated drift.
        let server_time = Utc.with_ymd_and_hms(2011, 9, 9, 23, 20, 0).unwrap();
        assert!(matches!(
            server.check_dates(&elements, server_time),
            Err(AuthError::OutsideTimeWindow)
        ));
    }

    #[test]
    fn test_should_bound_forward_age_by_expiry_in_query_mode() {
        let server = server();
        let elements = elements_with_host("example.com");

        // 60 second expiry: one minute after signing is still acceptable.
        let server_time = Utc.with_ymd_and_hms(2011, 9, 9, 23, 37, 0).unwrap();
        assert!(server.check_dates(&elements, server_time).is_ok());

        let server_time = Utc.with_ymd_and_hms(2011, 9, 9, 23, 37, 1).unwrap();
        assert!(matches!(
            server.check_dates(&elements, server_time),
            Err(AuthError::OutsideTimeWindow)
        ));
    }

    #[test]
    fn test_should_reject_mismatched_credential_date() {
        let server = server();
        let mut elements = elements_with_host("example.com");
        elements.credential.short_date = "20110908".to_owned();
        let server_time = Utc.with_ymd_and_hms(2011, 9, 9, 23, 36, 0).unwrap();
        assert!(matches!(
            server.check_dates(&elements, server_time),
            Err(AuthError::DateMismatch)
        ));
    }
}
