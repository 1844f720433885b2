//! Extraction of signature material from incoming requests.
//!
//! Auth elements arrive in one of two shapes:
//!
//! - **Header origin** — an authorization header of exactly four
//!   space-separated tokens:
//!
//!   ```text
//!   <vendor>-HMAC-<ALGO> Credential=<creds>, SignedHeaders=<list>, Signature=<hex>
//!   ```
//!
//! - **Query origin** — the six `X-<vendor>-*` presigned parameters.
//!
//! Both shapes parse into [`AuthElements`]; the [`AuthSource`] tag records
//! the origin, and only a query origin carries an expiry.

use regex::Regex;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::request::RequestView;
use crate::scope::Credential;

/// Presigned query-key name parts, in the order they are produced.
pub(crate) const PARAM_ALGORITHM: &str = "Algorithm";
pub(crate) const PARAM_CREDENTIALS: &str = "Credentials";
pub(crate) const PARAM_DATE: &str = "Date";
pub(crate) const PARAM_EXPIRES: &str = "Expires";
pub(crate) const PARAM_SIGNED_HEADERS: &str = "SignedHeaders";
pub(crate) const PARAM_SIGNATURE: &str = "Signature";

/// Where the signature material came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Parsed from the authorization header.
    Header,
    /// Parsed from presigned query parameters; carries the declared
    /// validity window in seconds.
    Query {
        /// Seconds the presigned request stays valid after its date.
        expires: u64,
    },
}

/// Signature material extracted from a request.
#[derive(Debug, Clone)]
pub struct AuthElements {
    /// Uppercase algorithm token, e.g. `SHA256`.
    pub algorithm: String,
    /// The parsed five-part credential.
    pub credential: Credential,
    /// Lowercase signed header names as declared by the signer.
    pub signed_headers: Vec<String>,
    /// The presented lowercase hex signature.
    pub signature: String,
    /// The declared long-date string, still unvalidated.
    pub request_date: String,
    /// The value of the request's `Host` header.
    pub host: String,
    /// Origin of the material.
    pub source: AuthSource,
}

/// Compiled grammar for one vendor prefix's authorization header.
pub(crate) struct AuthHeaderGrammar {
    pattern: Regex,
}

impl AuthHeaderGrammar {
    pub(crate) fn new(vendor_prefix: &str) -> Self {
        let pattern = Regex::new(&format!(
            "^{prefix}-HMAC-(?P<algo>[A-Z0-9,]+) \
             Credential=(?P<credential>[A-Za-z0-9/_-]+), \
             SignedHeaders=(?P<headers>[a-z;-]+), \
             Signature=(?P<signature>[0-9a-f]+)$",
            prefix = regex::escape(vendor_prefix),
        ))
        .expect("authorization header grammar is a valid pattern");
        Self { pattern }
    }

    /// Parse an authorization header value.
    fn parse(&self, value: &str) -> Result<ParsedAuthHeader, AuthError> {
        let captures = self
            .pattern
            .captures(value)
            .ok_or(AuthError::MalformedAuthHeader)?;
        Ok(ParsedAuthHeader {
            algorithm: captures["algo"].to_owned(),
            credential: Credential::parse(&captures["credential"])?,
            signed_headers: captures["headers"]
                .split(';')
                .map(ToOwned::to_owned)
                .collect(),
            signature: captures["signature"].to_owned(),
        })
    }
}

struct ParsedAuthHeader {
    algorithm: String,
    credential: Credential,
    signed_headers: Vec<String>,
    signature: String,
}

/// Parse header-origin auth elements, binding the declared date and host.
pub(crate) fn parse_header_auth(
    grammar: &AuthHeaderGrammar,
    header_value: &str,
    request: &RequestView,
    config: &AuthConfig,
) -> Result<AuthElements, AuthError> {
    let parsed = grammar.parse(header_value)?;

    let request_date = request
        .header(&config.date_header_name)
        .ok_or_else(|| AuthError::MissingDateHeader(config.date_header_name.clone()))?
        .to_owned();
    let host = required_host(request)?;

    Ok(AuthElements {
        algorithm: parsed.algorithm,
        credential: parsed.credential,
        signed_headers: parsed.signed_headers,
        signature: parsed.signature,
        request_date,
        host,
        source: AuthSource::Header,
    })
}

/// Parse query-origin auth elements from the presigned parameters.
pub(crate) fn parse_query_auth(
    request: &RequestView,
    config: &AuthConfig,
) -> Result<AuthElements, AuthError> {
    let params = parse_query_pairs(request.query());
    let required = |name: &str| -> Result<String, AuthError> {
        let key = config.query_key(name);
        params
            .iter()
            .find(|(param_key, _)| *param_key == key)
            .map(|(_, value)| value.clone())
            .ok_or(AuthError::MissingQueryParam(key))
    };

    let algorithm_value = required(PARAM_ALGORITHM)?;
    let credentials = required(PARAM_CREDENTIALS)?;
    let request_date = required(PARAM_DATE)?;
    let expires_value = required(PARAM_EXPIRES)?;
    let signed_headers_value = required(PARAM_SIGNED_HEADERS)?;
    let signature = required(PARAM_SIGNATURE)?;

    let algorithm = parse_algorithm_token(&algorithm_value, &config.vendor_prefix)?;
    let credential = Credential::parse(&credentials)?;
    // Reference implementations coerce a non-numeric expiry to 0, which the
    // time-interval check then rejects; stay compatible with that.
    let expires = expires_value.parse().unwrap_or(0);
    let signed_headers = signed_headers_value
        .split(';')
        .map(|name| name.to_ascii_lowercase())
        .collect();
    let host = required_host(request)?;

    Ok(AuthElements {
        algorithm,
        credential,
        signed_headers,
        signature,
        request_date,
        host,
        source: AuthSource::Query { expires },
    })
}

/// Split a raw query string into pairs, percent-decoding the values.
///
/// Keys stay raw: the presigned keys are matched literally and
/// case-sensitively.
pub(crate) fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded = percent_encoding::percent_decode_str(value)
                .decode_utf8_lossy()
                .into_owned();
            (key.to_owned(), decoded)
        })
        .collect()
}

/// Extract the algorithm token from a `<vendor>-HMAC-<ALGO>` identifier.
fn parse_algorithm_token(value: &str, vendor_prefix: &str) -> Result<String, AuthError> {
    let token = value
        .strip_prefix(vendor_prefix)
        .and_then(|rest| rest.strip_prefix("-HMAC-"))
        .ok_or(AuthError::MalformedAuthHeader)?;
    let valid = !token.is_empty()
        && token
            .bytes()
            .all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit() || byte == b',');
    if !valid {
        return Err(AuthError::MalformedAuthHeader);
    }
    Ok(token.to_owned())
}

fn required_host(request: &RequestView) -> Result<String, AuthError> {
    request
        .header("host")
        .map(ToOwned::to_owned)
        .ok_or(AuthError::MissingHostHeader)
}
