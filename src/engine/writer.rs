use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::{Error, Result};

/// Buffered output side of a transform. Counts what it has accepted.
pub struct Writer<W>
where
    W: AsyncWrite + Unpin,
{
    inner: BufWriter<W>,
    written: u64,
}

impl<W> Writer<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(output: W, capacity: usize) -> Self {
        Self { inner: BufWriter::with_capacity(capacity, output), written: 0 }
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        self.inner.write_all(data).await.map_err(Error::write)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await.map_err(Error::write)
    }

    #[inline]
    pub const fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_and_flushes() {
        let mut sink = Vec::new();
        {
            let mut writer = Writer::new(&mut sink, 4);
            writer.write(b"abc").await.unwrap();
            writer.write(b"").await.unwrap();
            writer.write(b"defgh").await.unwrap();
            writer.flush().await.unwrap();
            assert_eq!(writer.written(), 8);
        }
        assert_eq!(sink, b"abcdefgh");
    }
}
