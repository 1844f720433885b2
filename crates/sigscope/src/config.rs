//! Shared signing configuration.

use crate::sign::{self, HashAlgo};

/// Knobs shared by the signing and verifying sides.
///
/// Both sides must agree on every field for signatures to match. The
/// defaults follow the `EMS` dialect; `AWS4`-style deployments override the
/// vendor prefix and header names.
///
/// # Examples
///
/// ```
/// use sigscope::AuthConfig;
///
/// let config = AuthConfig::default().with_vendor_prefix("AWS4");
/// assert_eq!(config.algorithm_id(), "AWS4-HMAC-SHA256");
/// assert_eq!(config.query_key("Signature"), "X-AWS4-Signature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Vendor prefix namespacing the algorithm token and query keys.
    pub vendor_prefix: String,
    /// Hash algorithm used when signing.
    pub algorithm: HashAlgo,
    /// Name of the authorization header.
    pub auth_header_name: String,
    /// Name of the date header.
    pub date_header_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            vendor_prefix: "EMS".to_owned(),
            algorithm: HashAlgo::Sha256,
            auth_header_name: "X-Ems-Auth".to_owned(),
            date_header_name: "X-Ems-Date".to_owned(),
        }
    }
}

impl AuthConfig {
    /// Replace the vendor prefix.
    #[must_use]
    pub fn with_vendor_prefix(mut self, vendor_prefix: impl Into<String>) -> Self {
        self.vendor_prefix = vendor_prefix.into();
        self
    }

    /// Replace the signing hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgo) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Replace the authorization header name.
    #[must_use]
    pub fn with_auth_header_name(mut self, name: impl Into<String>) -> Self {
        self.auth_header_name = name.into();
        self
    }

    /// Replace the date header name.
    #[must_use]
    pub fn with_date_header_name(mut self, name: impl Into<String>) -> Self {
        self.date_header_name = name.into();
        self
    }

    /// The algorithm identifier for this configuration, e.g. `EMS-HMAC-SHA256`.
    #[must_use]
    pub fn algorithm_id(&self) -> String {
        sign::algorithm_id(&self.vendor_prefix, self.algorithm)
    }

    /// A presigned query key, e.g. `X-EMS-Date` for `Date`.
    #[must_use]
    pub fn query_key(&self, name: &str) -> String {
        format!("X-{}-{name}", self.vendor_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_ems_dialect() {
        let config = AuthConfig::default();
        assert_eq!(config.vendor_prefix, "EMS");
        assert_eq!(config.algorithm, HashAlgo::Sha256);
        assert_eq!(config.auth_header_name, "X-Ems-Auth");
        assert_eq!(config.date_header_name, "X-Ems-Date");
    }

    #[test]
    fn test_should_override_fields_with_builders() {
        let config = AuthConfig::default()
            .with_vendor_prefix("AWS4")
            .with_algorithm(HashAlgo::Sha512)
            .with_auth_header_name("Authorization")
            .with_date_header_name("X-Amz-Date");
        assert_eq!(config.algorithm_id(), "AWS4-HMAC-SHA512");
        assert_eq!(config.auth_header_name, "Authorization");
        assert_eq!(config.date_header_name, "X-Amz-Date");
    }

    #[test]
    fn test_should_derive_query_keys_from_vendor_prefix() {
        let config = AuthConfig::default();
        assert_eq!(config.query_key("Algorithm"), "X-EMS-Algorithm");
        assert_eq!(config.query_key("SignedHeaders"), "X-EMS-SignedHeaders");
    }
}
