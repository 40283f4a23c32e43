//! Credential validation for privileged operations.
//!
//! Every engine entry point takes a [`Keys`] pair and asks the configured
//! [`Validator`] before touching the log directory.

use std::fmt;

use subtle::ConstantTimeEq;
use uuid::Uuid;

/// An API key / secret pair supplied by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Keys {
    api_key: String,
    api_secret: String,
}

impl Keys {
    /// Creates a key pair.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Returns the public key half.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the secret half.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Decides whether a caller may use the engine.
pub trait Validator: Send + Sync {
    /// Returns true if the key pair is authorized.
    fn validate(&self, keys: &Keys) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&Keys) -> bool + Send + Sync,
{
    fn validate(&self, keys: &Keys) -> bool {
        self(keys)
    }
}

/// Accepts exactly one key pair.
pub struct SimpleValidator {
    expected: Keys,
}

impl SimpleValidator {
    /// Creates a validator that accepts only `keys`.
    #[must_use]
    pub const fn new(keys: Keys) -> Self {
        Self { expected: keys }
    }

    /// Creates a validator with freshly generated credentials.
    ///
    /// The key is a v4 UUID and the secret two concatenated v4 UUIDs. The
    /// returned [`Keys`] are the only way to learn them.
    #[must_use]
    pub fn generate() -> (Self, Keys) {
        let keys = Keys::new(
            Uuid::new_v4().to_string(),
            format!("{}{}", Uuid::new_v4(), Uuid::new_v4()),
        );
        (Self::new(keys.clone()), keys)
    }
}

impl fmt::Debug for SimpleValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleValidator")
            .field("expected", &self.expected)
            .finish()
    }
}

impl Validator for SimpleValidator {
    fn validate(&self, keys: &Keys) -> bool {
        let key_ok = self
            .expected
            .api_key
            .as_bytes()
            .ct_eq(keys.api_key.as_bytes());
        let secret_ok = self
            .expected
            .api_secret
            .as_bytes()
            .ct_eq(keys.api_secret.as_bytes());
        (key_ok & secret_ok).into()
    }
}
