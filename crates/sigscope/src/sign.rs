//! Key derivation and signature computation.
//!
//! The signing key is an HMAC chain seeded with the vendor prefix and the
//! secret, folding in each credential-scope segment in order:
//!
//! ```text
//! k0 = vendorPrefix || secret
//! k1 = HMAC(k0, shortDate)
//! k2 = HMAC(k1, region)
//! k3 = HMAC(k2, service)
//! k4 = HMAC(k3, requestType)    <- signing key
//! ```
//!
//! The final signature is the lowercase hex HMAC of the string to sign under
//! that key.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::error::AuthError;
use crate::scope::Party;
use crate::time;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Payload sentinel signed in place of the body for presigned requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// The hash algorithms allowed on both the signing and verifying side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashAlgo {
    /// HMAC-SHA256 (the default).
    #[default]
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl HashAlgo {
    /// Resolve an algorithm token such as `SHA256`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlgorithmNotAllowed`] for anything outside the
    /// allowed set.
    pub fn from_token(token: &str) -> Result<Self, AuthError> {
        match token.to_ascii_uppercase().as_str() {
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(AuthError::AlgorithmNotAllowed),
        }
    }

    /// The uppercase algorithm token.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Lowercase hex digest of a payload.
    #[must_use]
    pub fn hash_hex(self, payload: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(payload)),
            Self::Sha512 => hex::encode(Sha512::digest(payload)),
        }
    }

    /// Raw HMAC bytes of `data` under `key`.
    #[must_use]
    pub fn hmac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(key)
                    .expect("HMAC can accept keys of any length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            Self::Sha512 => {
                let mut mac = HmacSha512::new_from_slice(key)
                    .expect("HMAC can accept keys of any length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

/// The algorithm identifier carried in headers and presigned parameters,
/// e.g. `EMS-HMAC-SHA256`.
#[must_use]
pub fn algorithm_id(vendor_prefix: &str, algo: HashAlgo) -> String {
    format!("{vendor_prefix}-HMAC-{}", algo.token())
}

/// Derive the scoped signing key from a secret.
#[must_use]
pub fn derive_signing_key(
    secret: &str,
    short_date: &str,
    party: &Party,
    algo: HashAlgo,
    vendor_prefix: &str,
) -> Vec<u8> {
    let mut key = format!("{vendor_prefix}{secret}").into_bytes();
    for segment in [short_date, &party.region, &party.service, &party.request_type] {
        key = algo.hmac(&key, segment.as_bytes());
    }
    key
}

/// Build the four-line string to sign.
///
/// ```text
/// <vendor>-HMAC-<ALGO>
/// <long date>
/// <short date>/<region>/<service>/<request type>
/// <hex(hash(canonical request))>
/// ```
///
/// The short date on the third line is the first eight characters of the
/// long date.
#[must_use]
pub fn build_string_to_sign(
    vendor_prefix: &str,
    algo: HashAlgo,
    long_date: &str,
    party_scope: &str,
    canonical_request: &str,
) -> String {
    format!(
        "{algorithm}\n{long_date}\n{short_date}/{party_scope}\n{hash}",
        algorithm = algorithm_id(vendor_prefix, algo),
        short_date = time::short_date_of(long_date),
        hash = algo.hash_hex(canonical_request.as_bytes()),
    )
}

/// The final lowercase hex signature of a string to sign.
#[must_use]
pub fn compute_signature(signing_key: &[u8], string_to_sign: &str, algo: HashAlgo) -> String {
    hex::encode(algo.hmac(signing_key, string_to_sign.as_bytes()))
}
