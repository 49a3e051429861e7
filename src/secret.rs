//! Password handling.
//!
//! Passwords are supplied fresh for every operation and are never persisted.
//! [`Secret`] keeps them out of `Debug` output and wipes them on drop.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use secrecy::{ExposeSecret, SecretString};

#[derive(Clone)]
pub struct Secret {
    inner: SecretString,
}

impl Secret {
    pub fn new(password: &str) -> Self {
        Self { inner: SecretString::from(password.to_owned()) }
    }

    pub fn from_string(password: String) -> Self {
        Self { inner: SecretString::from(password) }
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }

    /// UTF-8 bytes fed to key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.expose_secret().as_bytes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl From<SecretString> for Secret {
    fn from(secret: SecretString) -> Self {
        Self { inner: secret }
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Secret([REDACTED])")
    }
}
