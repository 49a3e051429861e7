use std::io::ErrorKind as IoErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::config::{HEADER_LEN, IV_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// Buffered input side of a transform.
///
/// Every read fills the caller's buffer completely unless the input ends,
/// so a short read always means end of stream.
pub struct Reader<R> {
    inner: BufReader<R>,
}

impl<R> Reader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(input: R, capacity: usize) -> Self {
        Self { inner: BufReader::with_capacity(capacity, input) }
    }

    /// Consumes the `salt || iv` container header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedInput`] if the stream ends before the header is complete.
    pub async fn header(&mut self) -> Result<([u8; SALT_LEN], [u8; IV_LEN])> {
        let mut header = [0u8; HEADER_LEN];
        let found = self.fill(&mut header).await?;
        if found < HEADER_LEN {
            return Err(Error::TruncatedInput { expected: HEADER_LEN, found });
        }

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        salt.copy_from_slice(&header[..SALT_LEN]);
        iv.copy_from_slice(&header[SALT_LEN..]);

        Ok((salt, iv))
    }

    /// Reads until `buf` is full or the input is exhausted, returning the byte count.
    pub async fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => {}
                Err(e) => return Err(Error::read(e)),
            }
        }

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_fill_stops_at_eof() {
        let data: &[u8] = &[1, 2, 3, 4, 5];
        let mut reader = Reader::new(data, 2);

        let mut buf = [0u8; 3];
        assert_eq!(reader.fill(&mut buf).await.unwrap(), 3);
        assert_eq!(reader.fill(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(reader.fill(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_header_split() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut reader = Reader::new(data.as_slice(), 8);

        let (salt, iv) = reader.header().await.unwrap();
        assert_eq!(salt[0], 0);
        assert_eq!(iv[0], 16);

        let mut rest = [0u8; 16];
        assert_eq!(reader.fill(&mut rest).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_short_header_is_truncated() {
        let data = [0u8; 31];
        let err = Reader::new(data.as_slice(), 8).header().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        assert!(matches!(err, Error::TruncatedInput { expected: 32, found: 31 }));
    }
}
