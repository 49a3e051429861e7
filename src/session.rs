//! # Operation Sessions
//!
//! A [`Session`] runs at most one transform at a time on a background tokio
//! task and keeps the display-only derivation artifacts of that transform
//! (salt and key fingerprint) while it is running. Each [`Operation`] exposes
//! a latest-value progress watch, cancellation and a single terminal result.
//!
//! Sessions are independent: every operation derives its own salt, IV and key,
//! and nothing cryptographic is shared between sessions.

use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cipher::{Artifacts, Derive, Preview};
use crate::engine::{CancelToken, Engine, Observer};
use crate::error::{Error, Result};
use crate::secret::Secret;
use crate::types::{CipherConfiguration, OperationResult, Processing, Progress};

#[derive(Debug, Default)]
struct Shared {
    active: AtomicBool,
    artifacts: Mutex<Option<Artifacts>>,
}

/// Exclusive hold on a session's single transform slot.
///
/// Releasing it wipes the artifacts of the finished operation.
struct Claim {
    shared: Arc<Shared>,
}

impl Claim {
    fn acquire(shared: &Arc<Shared>) -> Result<Self> {
        shared.active.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).map_err(|_| Error::Busy)?;
        Ok(Self { shared: Arc::clone(shared) })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        *self.shared.artifacts.lock() = None;
        self.shared.active.store(false, Ordering::Release);
    }
}

/// Forwards engine events into a session.
struct Relay {
    progress: watch::Sender<Progress>,
    shared: Arc<Shared>,
}

impl Observer for Relay {
    fn on_progress(&self, progress: Progress) {
        self.progress.send_replace(progress);
    }

    fn on_artifacts(&self, artifacts: &Artifacts) {
        *self.shared.artifacts.lock() = Some(artifacts.clone());
    }
}

/// Coordinates one logical stream of operations under a configuration.
#[derive(Debug)]
pub struct Session {
    config: Mutex<CipherConfiguration>,
    shared: Arc<Shared>,
}

impl Session {
    pub fn new(config: CipherConfiguration) -> Self {
        Self { config: Mutex::new(config), shared: Arc::default() }
    }

    pub fn config(&self) -> CipherConfiguration {
        *self.config.lock()
    }

    /// Replaces the configuration used by the next operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while an operation is running.
    pub fn set_config(&self, config: CipherConfiguration) -> Result<()> {
        if self.is_active() {
            return Err(Error::Busy);
        }

        *self.config.lock() = config;
        Ok(())
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Hex salt of the running operation, once its key has been derived.
    pub fn current_salt(&self) -> Option<String> {
        self.shared.artifacts.lock().as_ref().map(Artifacts::salt_hex)
    }

    /// Opaque fingerprint of the running operation's key. Never the key itself.
    pub fn current_key_fingerprint(&self) -> Option<String> {
        self.shared.artifacts.lock().as_ref().map(|artifacts| artifacts.fingerprint.clone())
    }

    /// Cheap salted hash of `password` for display before committing to an operation.
    ///
    /// Uses a single PBKDF2 iteration under a fresh salt and cannot be turned
    /// into key material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if no salt could be generated.
    pub fn preview(password: &Secret) -> Result<Preview> {
        Derive::new(password.as_bytes()).preview()
    }

    /// Starts encrypting `input` into `output` on a background task.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] if another operation on this session is still running
    /// - [`Error::InvalidParameter`] when called outside a tokio runtime
    pub fn begin_encrypt<R, W>(&self, input: R, output: W, password: Secret, size_hint: Option<u64>) -> Result<Operation>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.begin(Processing::Encryption, input, output, password, size_hint)
    }

    /// Starts decrypting `input` into `output` on a background task.
    ///
    /// # Errors
    ///
    /// Same as [`Session::begin_encrypt`].
    pub fn begin_decrypt<R, W>(&self, input: R, output: W, password: Secret, size_hint: Option<u64>) -> Result<Operation>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.begin(Processing::Decryption, input, output, password, size_hint)
    }

    fn begin<R, W>(&self, processing: Processing, input: R, output: W, password: Secret, size_hint: Option<u64>) -> Result<Operation>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::invalid("no tokio runtime available"))?;
        let claim = Claim::acquire(&self.shared)?;

        let (progress, receiver) = watch::channel(Progress::START);
        let cancel = CancelToken::new();
        let relay = Arc::new(Relay { progress, shared: Arc::clone(&self.shared) });
        let engine = Engine::new(self.config()).with_observer(relay).with_cancel(cancel.clone());

        debug!(%processing, "spawning operation");
        let handle = runtime.spawn(async move {
            let _claim = claim;
            let result = match processing {
                Processing::Encryption => engine.encrypt(input, output, &password, size_hint).await,
                Processing::Decryption => engine.decrypt(input, output, &password, size_hint).await,
            };
            OperationResult::from(result)
        });

        Ok(Operation { processing, progress: receiver, cancel, handle })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CipherConfiguration::default())
    }
}

/// Handle to a running transform.
#[derive(Debug)]
pub struct Operation {
    processing: Processing,
    progress: watch::Receiver<Progress>,
    cancel: CancelToken,
    handle: JoinHandle<OperationResult>,
}

impl Operation {
    #[inline]
    pub const fn processing(&self) -> Processing {
        self.processing
    }

    /// Latest-value progress watch. Slow readers only miss intermediate values.
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }

    /// Requests cooperative cancellation; takes effect between chunks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn canceller(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the terminal result.
    pub async fn wait(self) -> OperationResult {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => OperationResult::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::fs;
    use tokio::io::{AsyncWriteExt, duplex, sink};

    use super::*;
    use crate::cipher::Mode;
    use crate::config::{CHUNK_SIZE, FINGERPRINT_LEN, HEADER_LEN, SALT_LEN};
    use crate::error::ErrorKind;
    use crate::types::KeySize;

    fn fast(mode: Mode) -> CipherConfiguration {
        CipherConfiguration::with_key_size(KeySize::Aes256, 50, mode).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_active_operation_and_artifact_lifetime() {
        let session = Session::new(fast(Mode::GcmNoPadding));
        assert!(session.current_salt().is_none());

        let (mut feed, input) = duplex(1024);
        let operation = session.begin_encrypt(input, sink(), Secret::new("hunter22"), None).unwrap();
        let mut progress = operation.progress();

        feed.write_all(&vec![0u8; CHUNK_SIZE]).await.unwrap();
        progress.changed().await.unwrap();
        assert!(progress.borrow().is_indeterminate());

        assert_eq!(session.current_salt().unwrap().len(), SALT_LEN * 2);
        assert_eq!(session.current_key_fingerprint().unwrap().len(), FINGERPRINT_LEN * 2);

        let err = session.begin_decrypt(&b""[..], sink(), Secret::new("hunter22"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);
        assert_eq!(session.set_config(fast(Mode::CtrNoPadding)).unwrap_err().kind(), ErrorKind::Busy);

        drop(feed);
        assert_eq!(operation.wait().await, OperationResult::Success);
        assert_eq!(*progress.borrow(), Progress::DONE);

        assert!(!session.is_active());
        assert!(session.current_salt().is_none());
        assert!(session.current_key_fingerprint().is_none());
        session.set_config(fast(Mode::CtrNoPadding)).unwrap();
        assert_eq!(session.config().mode(), Mode::CtrNoPadding);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_running_operation() {
        let session = Session::new(fast(Mode::CbcPkcs5));
        let (mut feed, input) = duplex(1024);
        let operation = session.begin_encrypt(input, sink(), Secret::new("hunter22"), None).unwrap();
        let mut progress = operation.progress();

        feed.write_all(&vec![0u8; CHUNK_SIZE]).await.unwrap();
        progress.changed().await.unwrap();

        operation.cancel();
        drop(feed);

        assert_eq!(operation.wait().await, OperationResult::Cancelled);
        assert_ne!(*progress.borrow(), Progress::DONE);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_failure_result_carries_kind_and_message() {
        let session = Session::new(fast(Mode::GcmNoPadding));
        let operation = session.begin_decrypt(&[0u8; 10][..], sink(), Secret::new("pw"), Some(10)).unwrap();

        let result = operation.wait().await;
        assert_eq!(result.kind(), Some(ErrorKind::TruncatedInput));
        assert_eq!(result, OperationResult::Failure { kind: ErrorKind::TruncatedInput, message: ErrorKind::TruncatedInput.message().to_owned() });
        assert!(!session.is_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_sessions_run_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let plaintexts = [vec![1u8; 40_000], vec![2u8; 123]];
        let modes = [Mode::GcmNoPadding, Mode::CbcPkcs5];

        let sessions: Vec<Session> = modes.iter().map(|&mode| Session::new(fast(mode))).collect();
        let mut operations = Vec::new();
        for (i, (session, plaintext)) in sessions.iter().zip(&plaintexts).enumerate() {
            let sealed = fs::File::create(dir.path().join(format!("{i}.pcx"))).await.unwrap();
            let input = std::io::Cursor::new(plaintext.clone());
            operations.push(session.begin_encrypt(input, sealed, Secret::new("shared password"), Some(plaintext.len() as u64)).unwrap());
        }
        for operation in operations {
            assert!(operation.wait().await.is_success());
        }

        let headers: Vec<Vec<u8>> = read_headers(dir.path()).await;
        assert_ne!(headers[0], headers[1]);

        for (i, (session, plaintext)) in sessions.iter().zip(&plaintexts).enumerate() {
            let sealed = fs::File::open(dir.path().join(format!("{i}.pcx"))).await.unwrap();
            let opened = dir.path().join(format!("{i}.out"));
            let output = fs::File::create(&opened).await.unwrap();
            let result = session.begin_decrypt(sealed, output, Secret::new("shared password"), None).unwrap().wait().await;
            assert!(result.is_success());
            assert_eq!(&fs::read(&opened).await.unwrap(), plaintext);
        }
    }

    async fn read_headers(dir: &std::path::Path) -> Vec<Vec<u8>> {
        let mut headers = Vec::new();
        for i in 0..2 {
            let bytes = fs::read(dir.join(format!("{i}.pcx"))).await.unwrap();
            headers.push(bytes[..HEADER_LEN].to_vec());
        }
        headers
    }

    #[test]
    fn test_preview_is_fresh_and_display_only() {
        let password = Secret::new("preview me");
        let a = Session::preview(&password).unwrap();
        let b = Session::preview(&password).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
        assert_eq!(a.salt_hex().len(), SALT_LEN * 2);
    }

    #[test]
    fn test_begin_outside_runtime_is_rejected() {
        let session = Session::default();
        let err = session.begin_encrypt(&b"x"[..], sink(), Secret::new("pw"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(!session.is_active());
    }
}
