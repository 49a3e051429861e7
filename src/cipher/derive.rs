//! # Key Derivation with PBKDF2-HMAC-SHA256
//!
//! Turns a password, a 16-byte salt and a work factor into an AES key. The
//! derivation is deterministic so decryption can rebuild the encryption key
//! from the salt stored in the container header, and it is slow on purpose:
//! cost grows linearly with the iteration count.
//!
//! Also home to the per-operation random values (salt, IV), the
//! [`KeyMaterial`] that bundles them with the key, and the display-only
//! [`Preview`] hash.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::cipher::Protected;
use crate::config::{FINGERPRINT_LEN, IV_LEN, PREVIEW_HASH_LEN, PREVIEW_ITERATIONS, SALT_LEN};
use crate::error::{Error, Result};
use crate::types::KeySize;

/// Raw AES key bytes, wiped on drop.
pub type DerivedKey = Protected<Vec<u8>>;

/// Password-based key derivation.
///
/// Owns a copy of the password bytes so a derivation can be moved onto a
/// blocking worker thread. The copy is wiped when the instance is dropped.
pub struct Derive {
    password: Protected<Vec<u8>>,
}

impl Derive {
    /// Creates a derivation context for `password`.
    ///
    /// Empty passwords are accepted; policy on password strength belongs to
    /// the caller.
    pub fn new(password: &[u8]) -> Self {
        Self { password: Protected::new(password.to_vec()) }
    }

    /// Derives a key of `key_size` from the password and `salt`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `iterations` is zero.
    pub fn derive_key(&self, salt: &[u8; SALT_LEN], iterations: u32, key_size: KeySize) -> Result<DerivedKey> {
        self.derive_into(salt, iterations, key_size.byte_len())
    }

    /// Same as [`Derive::derive_key`], taking the key size in bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `iterations` is zero or
    /// `key_bits` is not 128, 192 or 256.
    pub fn derive_bits(&self, salt: &[u8; SALT_LEN], iterations: u32, key_bits: u32) -> Result<DerivedKey> {
        self.derive_key(salt, iterations, KeySize::from_bits(key_bits)?)
    }

    /// Computes a cheap single-iteration hash for display.
    ///
    /// The result is a [`Preview`], which cannot be turned into key material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if no salt could be generated.
    pub fn preview(&self) -> Result<Preview> {
        let salt = Self::generate::<SALT_LEN>()?;
        self.preview_with_salt(salt)
    }

    /// Computes the display hash for a given salt.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in parameters; the signature mirrors the
    /// real derivation.
    pub fn preview_with_salt(&self, salt: [u8; SALT_LEN]) -> Result<Preview> {
        let hash = self.derive_into(&salt, PREVIEW_ITERATIONS, PREVIEW_HASH_LEN)?;
        Ok(Preview { salt, hash: hex::encode(hash.expose()) })
    }

    fn derive_into(&self, salt: &[u8], iterations: u32, len: usize) -> Result<DerivedKey> {
        if iterations == 0 {
            return Err(Error::invalid("iteration count must be at least 1"));
        }

        let mut key = Protected::new(vec![0u8; len]);
        pbkdf2::<Hmac<Sha256>>(self.password.expose(), salt, iterations, key.expose_mut()).map_err(|e| Error::invalid(format!("key derivation failed: {e}")))?;

        Ok(key)
    }

    /// Generates `N` bytes from the operating system's secure random source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the random source fails.
    pub fn generate<const N: usize>() -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| Error::Entropy(e.to_string()))?;

        Ok(bytes)
    }
}

/// Everything one operation derives: the key plus the salt and IV that go
/// into the container header.
///
/// Lives only for the duration of a single operation.
#[derive(Debug)]
pub struct KeyMaterial {
    key: DerivedKey,
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
}

impl KeyMaterial {
    pub const fn new(key: DerivedKey, salt: [u8; SALT_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, salt, iv }
    }

    #[inline]
    pub fn key(&self) -> &[u8] {
        self.key.expose()
    }

    #[inline]
    pub const fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    #[inline]
    pub const fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Opaque key identifier: the leading bytes of SHA-256 over the key, hex-encoded.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.expose());
        hex::encode(&digest[..FINGERPRINT_LEN])
    }

    /// Display-safe view of this material.
    pub fn artifacts(&self) -> Artifacts {
        Artifacts { salt: self.salt, iv: self.iv, fingerprint: self.fingerprint() }
    }
}

/// Display-safe view of one operation's derivation: salt, IV and a key
/// fingerprint. Never contains the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub fingerprint: String,
}

impl Artifacts {
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }

    pub fn iv_hex(&self) -> String {
        hex::encode(self.iv)
    }
}

/// A cheap salted hash of a password for demonstration UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub salt: [u8; SALT_LEN],
    pub hash: String,
}

impl Preview {
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }
}
