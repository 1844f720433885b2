//! Credential scope model.
//!
//! A [`Party`] is the static `(region, service, request_type)` triple both
//! sides agree on at configuration time. Prefixed with a short date it forms
//! the full credential scope that restricts a signing key to one day, one
//! service, and one request-type marker.

use std::fmt;

use crate::error::AuthError;

/// The static part of a credential scope.
///
/// Created at configuration time and never mutated. Joined with `/` it forms
/// the trailing three segments of a credential string.
///
/// # Examples
///
/// ```
/// use sigscope::Party;
///
/// let party = Party::new("us-east-1", "iam", "aws4_request");
/// assert_eq!(party.scope(), "us-east-1/iam/aws4_request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Party {
    /// Region identifier, e.g. `us-east-1`.
    pub region: String,
    /// Service identifier, e.g. `iam`.
    pub service: String,
    /// Request-type marker, e.g. `aws4_request` or `ems_request`.
    pub request_type: String,
}

impl Party {
    /// Create a new party triple.
    pub fn new(
        region: impl Into<String>,
        service: impl Into<String>,
        request_type: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            request_type: request_type.into(),
        }
    }

    /// The `/`-joined static scope string.
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/{}/{}", self.region, self.service, self.request_type)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.service, self.request_type)
    }
}

/// A parsed credential string: `accessKeyId/shortDate/region/service/requestType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// The access key id that claims to have signed the request.
    pub access_key_id: String,
    /// The `YYYYMMDD` date the signing key was scoped to.
    pub short_date: String,
    /// The region/service/request-type triple embedded in the credential.
    pub party: Party,
}

impl Credential {
    /// Parse a five-part credential string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentialScope`] unless the value splits
    /// on `/` into exactly five parts.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let parts: Vec<&str> = value.split('/').collect();
        if parts.len() != 5 {
            return Err(AuthError::InvalidCredentialScope);
        }
        Ok(Self {
            access_key_id: parts[0].to_owned(),
            short_date: parts[1].to_owned(),
            party: Party::new(parts[2], parts[3], parts[4]),
        })
    }

    /// The full credential scope: `shortDate/region/service/requestType`.
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/{}", self.short_date, self.party.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_join_party_scope_with_slashes() {
        let party = Party::new("eu-west-1", "storage", "ems_request");
        assert_eq!(party.scope(), "eu-west-1/storage/ems_request");
        assert_eq!(party.to_string(), "eu-west-1/storage/ems_request");
    }

    #[test]
    fn test_should_parse_five_part_credential() {
        let credential =
            Credential::parse("AKIDEXAMPLE/20110909/us-east-1/iam/aws4_request").unwrap();
        assert_eq!(credential.access_key_id, "AKIDEXAMPLE");
        assert_eq!(credential.short_date, "20110909");
        assert_eq!(credential.party, Party::new("us-east-1", "iam", "aws4_request"));
        assert_eq!(credential.scope(), "20110909/us-east-1/iam/aws4_request");
    }

    #[test]
    fn test_should_reject_credential_with_wrong_part_count() {
        let four = Credential::parse("AKID/20110909/us-east-1/iam");
        assert!(matches!(four, Err(AuthError::InvalidCredentialScope)));

        let six = Credential::parse("AKID/20110909/us-east-1/iam/aws4_request/extra");
        assert!(matches!(six, Err(AuthError::InvalidCredentialScope)));
    }
}
