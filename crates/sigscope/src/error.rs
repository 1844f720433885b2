//! Error types for request signing and verification.
//!
//! Every verification failure is represented by [`AuthError`], one variant per
//! distinct failure mode. The error messages are part of the wire-level
//! contract with existing signers and verifiers and must not be reworded.

/// Errors produced while signing a request or verifying its signature.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries neither an authorization header nor presigned
    /// query parameters.
    #[error("Request has not been signed.")]
    NotSigned,

    /// The authorization header does not match the expected grammar.
    #[error("Could not parse authorization header.")]
    MalformedAuthHeader,

    /// A required presigned query parameter is absent.
    #[error("Missing query parameter: {0}")]
    MissingQueryParam(String),

    /// The credential field does not split into exactly five parts.
    #[error("Invalid credential scope")]
    InvalidCredentialScope,

    /// The request has no `Host` header.
    #[error("The Host header is missing")]
    MissingHostHeader,

    /// The configured date header is absent from a header-signed request.
    #[error("The {0} header is missing")]
    MissingDateHeader(String),

    /// The declared request date is not a `YYYYMMDDTHHMMSSZ` timestamp.
    #[error("Invalid request date.")]
    InvalidRequestDate,

    /// The credential's short date disagrees with the declared long date.
    #[error("The request date and credential date do not match.")]
    DateMismatch,

    /// The declared request date is too far from the server time.
    #[error("Request date is not within the accepted time interval.")]
    OutsideTimeWindow,

    /// The transport-level server name disagrees with the signed `Host` header.
    #[error("The host header does not match.")]
    HostMismatch,

    /// The credential scope names a different region, service, or request type.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No secret is known for the presented access key id.
    #[error("Invalid access key id")]
    InvalidAccessKeyId,

    /// The algorithm token names a hash outside the allowed set.
    #[error("Only SHA256 and SHA512 hash algorithms are allowed.")]
    AlgorithmNotAllowed,

    /// `host` is missing from the signed-headers list.
    #[error("Host header not signed")]
    HostNotSigned,

    /// The date header is missing from the signed-headers list.
    #[error("Date header not signed")]
    DateNotSigned,

    /// The recomputed signature differs from the presented one.
    #[error("The signatures do not match")]
    SignatureMismatch,

    /// A URL handed to the signing side could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}
