use aes::cipher::StreamCipher;

use crate::cipher::Transform;
use crate::error::{Error, Result};

/// AES-CTR with a 128-bit big-endian counter. Encryption and decryption are
/// the same operation and nothing is ever buffered.
pub struct Ctr<S> {
    keystream: S,
}

impl<S> Ctr<S>
where
    S: StreamCipher + Send,
{
    pub const fn new(keystream: S) -> Self {
        Self { keystream }
    }
}

impl<S> Transform for Ctr<S>
where
    S: StreamCipher + Send,
{
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let start = output.len();
        output.extend_from_slice(input);
        self.keystream.try_apply_keystream(&mut output[start..]).map_err(|_| Error::invalid("ctr keystream exhausted"))
    }

    fn finish(self: Box<Self>, _output: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cipher::{Mode, transform};
    use crate::types::Processing;

    const KEY: [u8; 32] = [0x5a; 32];
    const IV: [u8; 16] = [0xa5; 16];

    fn run(processing: Processing, chunks: &[&[u8]]) -> Vec<u8> {
        let mut t = transform(Mode::CtrNoPadding, processing, &KEY, &IV).unwrap();
        let mut out = Vec::new();
        for chunk in chunks {
            t.update(chunk, &mut out).unwrap();
        }
        t.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_length_preserving() {
        for len in [0usize, 1, 15, 16, 17, 100] {
            let data = vec![0x42u8; len];
            assert_eq!(run(Processing::Encryption, &[&data]).len(), len);
        }
    }

    #[test]
    fn test_chunking_does_not_change_keystream() {
        let data: Vec<u8> = (0..77u8).collect();
        let whole = run(Processing::Encryption, &[&data]);
        let split = run(Processing::Encryption, &[&data[..5], &data[5..16], &data[16..33], &data[33..]]);
        assert_eq!(whole, split);
        assert_eq!(run(Processing::Decryption, &[&whole[..50], &whole[50..]]), data);
    }
}
