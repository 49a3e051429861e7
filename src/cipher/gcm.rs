//! Incremental AES-GCM with a 16-byte IV and a 128-bit tag.
//!
//! Produces byte-for-byte the same output as a one-shot GCM implementation:
//! `ciphertext || tag` with an empty AAD. Because the IV is not 96 bits, the
//! pre-counter block is derived through GHASH.
//!
//! Decryption releases plaintext before the tag has been checked. Callers must
//! discard everything they received if [`Transform::finish`] fails.

use ghash::universal_hash::{KeyInit, UniversalHash};
use ghash::{Block, GHash, Key};
use subtle::ConstantTimeEq;

use aes::cipher::StreamCipher;

use crate::cipher::Transform;
use crate::config::{BLOCK_SIZE, GCM_TAG_LEN};
use crate::error::{Error, Result};
use crate::types::Processing;

/// Computes J0 for an IV of any length other than 12 bytes.
pub fn pre_counter(h: &Key, iv: &[u8]) -> Block {
    let mut ghash = GHash::new(h);
    ghash.update_padded(iv);
    ghash.update(&[lengths_block(0, iv.len() as u64 * 8)]);
    ghash.finalize()
}

fn lengths_block(aad_bits: u64, data_bits: u64) -> Block {
    let mut block = Block::default();
    block[..8].copy_from_slice(&aad_bits.to_be_bytes());
    block[8..].copy_from_slice(&data_bits.to_be_bytes());
    block
}

/// Running GHASH over the ciphertext, tolerant of arbitrary slice sizes.
struct Authenticator {
    ghash: GHash,
    partial: Vec<u8>,
    len: u64,
}

impl Authenticator {
    fn new(h: &Key) -> Self {
        Self { ghash: GHash::new(h), partial: Vec::with_capacity(BLOCK_SIZE), len: 0 }
    }

    fn absorb(&mut self, mut data: &[u8]) {
        self.len += data.len() as u64;

        if !self.partial.is_empty() {
            let take = (BLOCK_SIZE - self.partial.len()).min(data.len());
            self.partial.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.partial.len() < BLOCK_SIZE {
                return;
            }
            self.ghash.update(&[*Block::from_slice(&self.partial)]);
            self.partial.clear();
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            self.ghash.update(&[*Block::from_slice(block)]);
        }
        self.partial.extend_from_slice(blocks.remainder());
    }

    fn tag(self, mask: &Block) -> [u8; GCM_TAG_LEN] {
        let Self { mut ghash, partial, len } = self;
        ghash.update_padded(&partial);
        ghash.update(&[lengths_block(0, len * 8)]);

        let mut tag = [0u8; GCM_TAG_LEN];
        for ((out, s), m) in tag.iter_mut().zip(ghash.finalize()).zip(mask) {
            *out = s ^ m;
        }
        tag
    }
}

pub struct Gcm<S> {
    keystream: S,
    auth: Authenticator,
    mask: Block,
    held: Vec<u8>,
    processing: Processing,
}

impl<S> Gcm<S>
where
    S: StreamCipher + Send,
{
    /// `keystream` must be positioned at J0; its first block becomes the tag mask.
    pub fn new(h: &Key, mut keystream: S, processing: Processing) -> Self {
        let mut mask = Block::default();
        keystream.apply_keystream(&mut mask);

        Self { keystream, auth: Authenticator::new(h), mask, held: Vec::with_capacity(GCM_TAG_LEN * 2), processing }
    }

    fn apply(&mut self, buf: &mut [u8]) -> Result<()> {
        self.keystream.try_apply_keystream(buf).map_err(|_| Error::invalid("gcm keystream exhausted"))
    }
}

impl<S> Transform for Gcm<S>
where
    S: StreamCipher + Send,
{
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let start = output.len();

        match self.processing {
            Processing::Encryption => {
                output.extend_from_slice(input);
                self.apply(&mut output[start..])?;
                self.auth.absorb(&output[start..]);
            }
            Processing::Decryption => {
                // The last GCM_TAG_LEN bytes seen so far might be the tag.
                self.held.extend_from_slice(input);
                let ready = self.held.len().saturating_sub(GCM_TAG_LEN);
                if ready == 0 {
                    return Ok(());
                }

                self.auth.absorb(&self.held[..ready]);
                output.extend_from_slice(&self.held[..ready]);
                self.held.drain(..ready);
                self.apply(&mut output[start..])?;
            }
        }

        Ok(())
    }

    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()> {
        let Self { auth, mask, held, processing, .. } = *self;
        let tag = auth.tag(&mask);

        match processing {
            Processing::Encryption => {
                output.extend_from_slice(&tag);
                Ok(())
            }
            Processing::Decryption => {
                if held.len() == GCM_TAG_LEN && bool::from(tag[..].ct_eq(&held[..])) {
                    Ok(())
                } else {
                    Err(Error::AuthenticationFailed)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use aes_gcm::AesGcm;
    use aes_gcm::aead::consts::U16;
    use aes_gcm::aead::generic_array::GenericArray;
    use aes_gcm::aead::{Aead, KeyInit};

    use crate::cipher::{Mode, transform};
    use crate::error::{ErrorKind, Result};
    use crate::types::Processing;

    const IV: [u8; 16] = [0x3c; 16];

    fn run(processing: Processing, key: &[u8], chunks: &[&[u8]]) -> Result<Vec<u8>> {
        let mut t = transform(Mode::GcmNoPadding, processing, key, &IV)?;
        let mut out = Vec::new();
        for chunk in chunks {
            t.update(chunk, &mut out)?;
        }
        t.finish(&mut out)?;
        Ok(out)
    }

    fn reference(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let nonce = GenericArray::from_slice(&IV);
        match key.len() {
            16 => AesGcm::<aes::Aes128, U16>::new_from_slice(key).unwrap().encrypt(nonce, plaintext).unwrap(),
            24 => AesGcm::<aes::Aes192, U16>::new_from_slice(key).unwrap().encrypt(nonce, plaintext).unwrap(),
            _ => AesGcm::<aes::Aes256, U16>::new_from_slice(key).unwrap().encrypt(nonce, plaintext).unwrap(),
        }
    }

    #[test]
    fn test_matches_one_shot_gcm() {
        for key_len in [16usize, 24, 32] {
            let key: Vec<u8> = (0..key_len as u8).collect();
            for len in [0usize, 1, 15, 16, 17, 31, 64, 1000] {
                let plaintext: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
                let ours = run(Processing::Encryption, &key, &[&plaintext]).unwrap();
                assert_eq!(ours, reference(&key, &plaintext), "key {key_len}, len {len}");
            }
        }
    }

    #[test]
    fn test_uneven_chunks() {
        let key = [9u8; 32];
        let plaintext: Vec<u8> = (0..200u8).collect();
        let split = run(Processing::Encryption, &key, &[&plaintext[..1], &plaintext[1..18], &plaintext[18..19], &plaintext[19..]]).unwrap();
        assert_eq!(split, reference(&key, &plaintext));

        let (a, rest) = split.split_at(3);
        let (b, c) = rest.split_at(rest.len() - 10);
        assert_eq!(run(Processing::Decryption, &key, &[a, b, c]).unwrap(), plaintext);
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        let key = [1u8; 32];
        let sealed = run(Processing::Encryption, &key, &[b""]).unwrap();
        assert_eq!(sealed.len(), 16);
        assert!(run(Processing::Decryption, &key, &[&sealed]).unwrap().is_empty());
    }

    #[test]
    fn test_tamper_and_truncation_detected() {
        let key = [2u8; 16];
        let sealed = run(Processing::Encryption, &key, &[b"attack at dawn"]).unwrap();

        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            let err = run(Processing::Decryption, &key, &[&tampered]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        }

        let err = run(Processing::Decryption, &key, &[&sealed[..10]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = run(Processing::Encryption, &[3u8; 32], &[b"secret"]).unwrap();
        let err = run(Processing::Decryption, &[4u8; 32], &[&sealed]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }
}
