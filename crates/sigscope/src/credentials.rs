//! Secret key lookup.
//!
//! The verifier resolves secrets through the [`KeyProvider`] trait so the
//! credential store stays outside the library: implementations may consult a
//! map, a cache, or a remote service. A plain closure works too.

use std::collections::HashMap;

/// Resolve the secret belonging to an access key id.
///
/// Implementations must be consistent: given the same access key id they
/// return the same secret, or `None` when the key is unknown. Thread safety
/// of the backing store is the implementor's responsibility.
pub trait KeyProvider: Send + Sync {
    /// The secret for `access_key_id`, or `None` when the key is unknown.
    fn secret_key(&self, access_key_id: &str) -> Option<String>;
}

impl<F> KeyProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn secret_key(&self, access_key_id: &str) -> Option<String> {
        self(access_key_id)
    }
}

/// An in-memory key provider backed by a `HashMap`.
///
/// Suitable for tests and development. Production deployments should
/// implement [`KeyProvider`] against their own credential store.
///
/// # Examples
///
/// ```
/// use sigscope::{KeyProvider, StaticKeyProvider};
///
/// let keys = StaticKeyProvider::new([
///     ("AKIDEXAMPLE".to_owned(), "secret".to_owned()),
/// ]);
/// assert_eq!(keys.secret_key("AKIDEXAMPLE").as_deref(), Some("secret"));
/// assert_eq!(keys.secret_key("UNKNOWN"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: HashMap<String, String>,
}

impl StaticKeyProvider {
    /// Create a provider from `(access_key_id, secret)` pairs.
    pub fn new(keys: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn secret_key(&self, access_key_id: &str) -> Option<String> {
        self.keys.get(access_key_id).cloned()
    }
}
