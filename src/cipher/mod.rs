//! # Cipher Primitives
//!
//! Key derivation, the mode registry and incremental AES transforms.
//!
//! A [`Transform`] consumes input in arbitrarily sized pieces and produces
//! output as early as the mode allows. Block modes hold back partial blocks
//! (and CBC decryption the final block, for unpadding); GCM decryption holds
//! back the trailing tag until [`Transform::finish`] verifies it.

use aes::cipher::{BlockEncrypt, InvalidLength, KeyInit, KeyIvInit};

mod cbc;
mod ctr;
pub mod derive;
mod gcm;
pub mod mode;
mod protected;

pub use derive::{Artifacts, Derive, DerivedKey, KeyMaterial, Preview};
pub use mode::{Mode, ModeSpec};
pub use protected::Protected;

use crate::config::IV_LEN;
use crate::error::{Error, Result};
use crate::types::Processing;
use self::cbc::{CbcDecrypt, CbcEncrypt};
use self::ctr::Ctr;
use self::gcm::Gcm;

/// One direction of one mode, fed incrementally.
pub trait Transform: Send {
    /// Processes the next piece of input, appending whatever output is ready.
    ///
    /// # Errors
    ///
    /// Fails only if the keystream is exhausted.
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Flushes buffered state: padding, tag emission or verification.
    ///
    /// # Errors
    ///
    /// CBC decryption reports [`Error::DecryptionFailed`] for bad padding or a
    /// misaligned ciphertext; GCM decryption reports
    /// [`Error::AuthenticationFailed`] for a tag mismatch.
    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()>;
}

/// Binds `$c` to the AES variant matching the key length, then evaluates `$body`.
macro_rules! with_aes {
    ($key:expr, $c:ident => $body:expr) => {
        match $key.len() {
            16 => {
                type $c = aes::Aes128;
                $body
            }
            24 => {
                type $c = aes::Aes192;
                $body
            }
            32 => {
                type $c = aes::Aes256;
                $body
            }
            other => Err(Error::invalid(format!("key must be 16, 24 or 32 bytes, got {other}"))),
        }
    };
}

fn invalid_length(_: InvalidLength) -> Error {
    Error::invalid("key or iv has the wrong length")
}

/// Builds the transform for `mode` in direction `processing`.
///
/// The AES variant follows from the key length.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `key` is not 16, 24 or 32 bytes.
pub fn transform(mode: Mode, processing: Processing, key: &[u8], iv: &[u8; IV_LEN]) -> Result<Box<dyn Transform>> {
    with_aes!(key, C => {
        let transform: Box<dyn Transform> = match (mode, processing) {
            (Mode::CbcPkcs5, Processing::Encryption) => Box::new(CbcEncrypt::new(::cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
            (Mode::CbcPkcs5, Processing::Decryption) => Box::new(CbcDecrypt::new(::cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
            (Mode::CtrNoPadding, _) => Box::new(Ctr::new(::ctr::Ctr128BE::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
            (Mode::GcmNoPadding, _) => {
                let mut h = aes::Block::default();
                C::new_from_slice(key).map_err(invalid_length)?.encrypt_block(&mut h);

                let j0 = gcm::pre_counter(&h, iv);
                let keystream = ::ctr::Ctr32BE::<C>::new_from_slices(key, &j0).map_err(invalid_length)?;
                Box::new(Gcm::new(&h, keystream, processing))
            }
        };
        Ok(transform)
    })
}
