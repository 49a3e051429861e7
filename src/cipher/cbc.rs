//! Incremental AES-CBC with PKCS#7 padding.
//!
//! Encryption emits every complete block as soon as it is available and pads
//! the remainder at finalization. Decryption always holds back the last
//! complete block so that unpadding happens only once the stream has ended.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::consts::U16;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, BlockSizeUser};

use crate::cipher::Transform;
use crate::config::BLOCK_SIZE;
use crate::error::{Error, Result};

pub struct CbcEncrypt<E> {
    inner: E,
    pending: Vec<u8>,
}

impl<E> CbcEncrypt<E>
where
    E: BlockEncryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    pub fn new(inner: E) -> Self {
        Self { inner, pending: Vec::with_capacity(BLOCK_SIZE) }
    }
}

impl<E> Transform for CbcEncrypt<E>
where
    E: BlockEncryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        self.pending.extend_from_slice(input);

        let ready = self.pending.len() / BLOCK_SIZE * BLOCK_SIZE;
        let start = output.len();
        output.extend_from_slice(&self.pending[..ready]);
        for block in output[start..].chunks_exact_mut(BLOCK_SIZE) {
            self.inner.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        self.pending.drain(..ready);
        Ok(())
    }

    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()> {
        let Self { inner, pending } = *self;

        // pending is always shorter than one block here, so padding yields exactly one block.
        let mut block = [0u8; BLOCK_SIZE];
        block[..pending.len()].copy_from_slice(&pending);
        let ciphertext = inner.encrypt_padded_mut::<Pkcs7>(&mut block, pending.len()).map_err(|_| Error::invalid("cbc padding failed"))?;

        output.extend_from_slice(ciphertext);
        Ok(())
    }
}

pub struct CbcDecrypt<D> {
    inner: D,
    pending: Vec<u8>,
}

impl<D> CbcDecrypt<D>
where
    D: BlockDecryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    pub fn new(inner: D) -> Self {
        Self { inner, pending: Vec::with_capacity(BLOCK_SIZE * 2) }
    }
}

impl<D> Transform for CbcDecrypt<D>
where
    D: BlockDecryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        self.pending.extend_from_slice(input);

        let len = self.pending.len();
        let keep = match len % BLOCK_SIZE {
            0 => BLOCK_SIZE.min(len),
            partial => partial,
        };
        let ready = len - keep;

        let start = output.len();
        output.extend_from_slice(&self.pending[..ready]);
        for block in output[start..].chunks_exact_mut(BLOCK_SIZE) {
            self.inner.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        self.pending.drain(..ready);
        Ok(())
    }

    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()> {
        let Self { inner, mut pending } = *self;

        // Wrong length and bad padding are reported identically.
        if pending.len() != BLOCK_SIZE {
            return Err(Error::DecryptionFailed);
        }

        let plaintext = inner.decrypt_padded_mut::<Pkcs7>(&mut pending).map_err(|_| Error::DecryptionFailed)?;
        output.extend_from_slice(plaintext);
        Ok(())
    }
}
