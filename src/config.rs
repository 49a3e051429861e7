//! Global Configuration Constants
//!
//! Fixed parameters of the container format, the streaming engine and the
//! command-line front end. Anything a caller chooses per operation lives in
//! [`CipherConfiguration`](crate::types::CipherConfiguration) instead.

/// Application name used in user interfaces.
pub const APP_NAME: &str = "passcrypt";

/// File extension appended to encrypted files by the command-line front end.
pub const FILE_EXTENSION: &str = ".pcx";

/// Extension used for decrypted output when the input does not carry [`FILE_EXTENSION`].
pub const DECRYPTED_EXTENSION: &str = ".out";

// === Container Format ===
// salt[SALT_LEN] || iv[IV_LEN] || ciphertext

/// Length of the PBKDF2 salt stored at the head of every container.
pub const SALT_LEN: usize = 16;

/// Length of the IV stored right after the salt.
///
/// GCM would accept 12 bytes, but every mode uses 16 so the header is uniform.
pub const IV_LEN: usize = 16;

/// Total header length: a reader must consume exactly this many bytes before ciphertext.
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// GCM authentication tag length in bytes (128-bit tag).
pub const GCM_TAG_LEN: usize = 16;

// === Key Derivation ===

/// Work factor used when the caller does not pick one.
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Key size used when the caller does not pick one.
pub const DEFAULT_KEY_BITS: u32 = 256;

/// Iteration count of the display-only preview hash.
///
/// Deliberately cheap. Never used for a real key.
pub const PREVIEW_ITERATIONS: u32 = 1;

/// Length of the preview hash in bytes.
pub const PREVIEW_HASH_LEN: usize = 32;

/// Number of SHA-256 bytes kept in a key fingerprint.
pub const FINGERPRINT_LEN: usize = 8;

// === Streaming ===

/// Default chunk size for reading input.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Smallest chunk size the engine accepts.
pub const MIN_CHUNK_SIZE: usize = BLOCK_SIZE;

/// Sentinel value reported for indeterminate progress.
pub const INDETERMINATE_PROGRESS: f64 = -1.0;

// === Command-Line Front End ===

/// Minimum password length accepted by the interactive prompt.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Resolution of the progress bar (number of steps between 0.0 and 1.0).
pub const PROGRESS_STEPS: u64 = 1000;
