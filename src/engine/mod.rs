//! # Streaming Cipher Engine
//!
//! Runs one encryption or decryption from an async byte source to an async
//! byte sink, producing or consuming the container layout
//!
//! ```text
//! salt[16] || iv[16] || ciphertext
//! ```
//!
//! ## Lifecycle
//!
//! `Init -> DerivingKey -> Transforming -> Finalizing -> Done`, or `Failed`
//! from any stage. Each transition is reported to the [`Observer`].
//!
//! ## Cancellation
//!
//! Cooperative: the [`CancelToken`] is checked before key derivation, before
//! every chunk read and once more before finalizing. A cancelled operation
//! never finalizes the cipher and never emits the terminal progress event.
//!
//! ## Output on failure
//!
//! Bytes are written as soon as they are produced, so a failed or cancelled
//! operation leaves partial output behind. Discarding it is the caller's job.

use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task;
use tracing::{debug, info, warn};

use crate::cipher::{self, Artifacts, Derive, KeyMaterial, Transform};
use crate::config::{BLOCK_SIZE, CHUNK_SIZE, HEADER_LEN, IV_LEN, MIN_CHUNK_SIZE, SALT_LEN};
use crate::error::{Error, Result};
use crate::secret::Secret;
use crate::types::{CipherConfiguration, Processing, Progress, Stage, Status};

mod progress;
mod reader;
mod writer;

pub use progress::Tracker;
pub use reader::Reader;
pub use writer::Writer;

/// Receives the events of one operation, on the task running it.
///
/// Implementations must not block for long; they run between chunks.
pub trait Observer: Send + Sync {
    fn on_progress(&self, progress: Progress);

    fn on_stage(&self, _stage: Stage) {}

    /// Called once the key is derived, with display-safe derivation values.
    fn on_artifacts(&self, _artifacts: &Artifacts) {}
}

impl Observer for () {
    fn on_progress(&self, _progress: Progress) {}
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Password-based streaming encryption and decryption.
#[derive(Clone)]
pub struct Engine {
    config: CipherConfiguration,
    chunk_size: usize,
    observer: Arc<dyn Observer>,
    cancel: CancelToken,
}

impl Engine {
    pub fn new(config: CipherConfiguration) -> Self {
        Self { config, chunk_size: CHUNK_SIZE, observer: Arc::new(()), cancel: CancelToken::new() }
    }

    /// Overrides the read chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] below [`MIN_CHUNK_SIZE`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::invalid(format!("chunk size must be at least {MIN_CHUNK_SIZE} bytes, got {chunk_size}")));
        }

        self.chunk_size = chunk_size;
        Ok(self)
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub const fn config(&self) -> &CipherConfiguration {
        &self.config
    }

    #[inline]
    pub fn canceller(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Encrypts `input` into `output` under a fresh salt and IV.
    ///
    /// `size_hint` is the plaintext length, if known; without it progress is
    /// reported as indeterminate.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Entropy`] if no salt or IV can be generated and with
    /// [`Error::Io`] if either stream fails.
    pub async fn encrypt<R, W>(&self, input: R, output: W, password: &Secret, size_hint: Option<u64>) -> Result<Status>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.announce(Processing::Encryption);
        let result = self.run_encrypt(input, output, password, size_hint).await;
        self.conclude(Processing::Encryption, &result);
        result
    }

    /// Decrypts a container read from `input` into `output`.
    ///
    /// `size_hint` is the full container length, header included, if known.
    /// The configuration must match the one used for encryption.
    ///
    /// # Errors
    ///
    /// - [`Error::TruncatedInput`] if the input is shorter than the header
    /// - [`Error::DecryptionFailed`] for CBC padding or length failures
    /// - [`Error::AuthenticationFailed`] for a GCM tag mismatch
    /// - [`Error::Io`] if either stream fails
    ///
    /// CTR mode cannot detect a wrong password; it returns garbage instead.
    pub async fn decrypt<R, W>(&self, input: R, output: W, password: &Secret, size_hint: Option<u64>) -> Result<Status>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.announce(Processing::Decryption);
        let result = self.run_decrypt(input, output, password, size_hint).await;
        self.conclude(Processing::Decryption, &result);
        result
    }

    async fn run_encrypt<R, W>(&self, input: R, output: W, password: &Secret, size_hint: Option<u64>) -> Result<Status>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.stage(Stage::Init);
        let salt = Derive::generate::<SALT_LEN>()?;
        let iv = Derive::generate::<IV_LEN>()?;

        let Some(material) = self.key_material(password, salt, iv).await? else {
            return Ok(Status::Cancelled);
        };
        let transform = cipher::transform(self.config.mode(), Processing::Encryption, material.key(), material.iv())?;
        drop(material);

        let mut reader = Reader::new(input, self.chunk_size);
        let mut writer = Writer::new(output, self.chunk_size);
        writer.write(&salt).await?;
        writer.write(&iv).await?;

        self.pump(&mut reader, &mut writer, transform, Tracker::new(size_hint)).await
    }

    async fn run_decrypt<R, W>(&self, input: R, output: W, password: &Secret, size_hint: Option<u64>) -> Result<Status>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.stage(Stage::Init);
        let mut reader = Reader::new(input, self.chunk_size);
        let (salt, iv) = reader.header().await?;

        let Some(material) = self.key_material(password, salt, iv).await? else {
            return Ok(Status::Cancelled);
        };
        let transform = cipher::transform(self.config.mode(), Processing::Decryption, material.key(), material.iv())?;
        drop(material);

        let mut writer = Writer::new(output, self.chunk_size);
        let total = size_hint.map(|hint| hint.saturating_sub(HEADER_LEN as u64));

        self.pump(&mut reader, &mut writer, transform, Tracker::new(total)).await
    }

    /// Derives the key off the async runtime. `None` means the operation was
    /// cancelled before or during derivation.
    async fn key_material(&self, password: &Secret, salt: [u8; SALT_LEN], iv: [u8; IV_LEN]) -> Result<Option<KeyMaterial>> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        self.stage(Stage::DerivingKey);

        let derive = Derive::new(password.as_bytes());
        let (iterations, key_size) = (self.config.iterations(), self.config.key_size());
        let key = match task::spawn_blocking(move || derive.derive_key(&salt, iterations, key_size)).await {
            Ok(key) => key?,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => return Ok(None),
        };

        let material = KeyMaterial::new(key, salt, iv);
        self.observer.on_artifacts(&material.artifacts());
        Ok(Some(material))
    }

    async fn pump<R, W>(&self, reader: &mut Reader<R>, writer: &mut Writer<W>, mut transform: Box<dyn Transform>, mut tracker: Tracker) -> Result<Status>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.stage(Stage::Transforming);

        let mut chunk = vec![0u8; self.chunk_size];
        let mut out = Vec::with_capacity(self.chunk_size + BLOCK_SIZE);

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Status::Cancelled);
            }

            let n = reader.fill(&mut chunk).await?;
            if n == 0 {
                break;
            }

            out.clear();
            transform.update(&chunk[..n], &mut out)?;
            writer.write(&out).await?;

            if let Some(progress) = tracker.advance(n) {
                self.observer.on_progress(progress);
            }

            if n < chunk.len() {
                break;
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(Status::Cancelled);
        }

        self.stage(Stage::Finalizing);
        out.clear();
        transform.finish(&mut out)?;
        writer.write(&out).await?;
        writer.flush().await?;

        debug!(read = tracker.processed(), written = writer.written(), "stream finalized");
        self.stage(Stage::Done);
        self.observer.on_progress(Progress::DONE);

        Ok(Status::Completed)
    }

    fn stage(&self, stage: Stage) {
        debug!(%stage, "stage");
        self.observer.on_stage(stage);
    }

    fn announce(&self, processing: Processing) {
        info!(mode = %self.config.mode(), key_bits = self.config.key_size().bits(), iterations = self.config.iterations(), chunk_size = self.chunk_size, "starting {processing}");
    }

    fn conclude(&self, processing: Processing, result: &Result<Status>) {
        match result {
            Ok(Status::Completed) => info!("{processing} completed"),
            Ok(Status::Cancelled) => info!("{processing} cancelled"),
            Err(err) => {
                self.stage(Stage::Failed);
                warn!(kind = ?err.kind(), "{processing} failed: {err}");
            }
        }
    }
}
