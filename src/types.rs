//! Common type definitions for passcrypt.
//!
//! # Overview
//!
//! - [`KeySize`]: AES key length selected per operation
//! - [`CipherConfiguration`]: immutable per-operation settings
//! - [`Processing`]: encryption or decryption
//! - [`Progress`]: fractional or indeterminate progress events
//! - [`Stage`], [`Status`], [`OperationResult`]: lifecycle and outcome of one transform

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::cipher::Mode;
use crate::config::{DEFAULT_ITERATIONS, INDETERMINATE_PROGRESS};
use crate::error::{Error, ErrorKind, Result};

/// AES key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    pub const ALL: &'static [Self] = &[Self::Aes128, Self::Aes192, Self::Aes256];

    /// Resolves a key length in bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for anything but 128, 192 or 256.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            other => Err(Error::invalid(format!("key size must be 128, 192 or 256 bits, got {other}"))),
        }
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    /// Key length in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_len(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u32> for KeySize {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl Display for KeySize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}-bit", self.bits())
    }
}

/// Settings for one encrypt or decrypt operation.
///
/// Nothing here is stored in the container: decrypting requires the same key
/// size, iteration count and mode that were used to encrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherConfiguration {
    key_size: KeySize,
    iterations: u32,
    mode: Mode,
}

impl CipherConfiguration {
    /// Builds a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `key_bits` is not 128, 192 or 256
    /// or if `iterations` is zero.
    pub fn new(key_bits: u32, iterations: u32, mode: Mode) -> Result<Self> {
        let key_size = KeySize::from_bits(key_bits)?;
        Self::with_key_size(key_size, iterations, mode)
    }

    /// Builds a configuration from raw integer codes, resolving the mode
    /// selector through the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMode`] for an unknown selector, otherwise
    /// the same errors as [`CipherConfiguration::new`].
    pub fn from_codes(key_bits: u32, iterations: u32, mode_selector: u8) -> Result<Self> {
        Self::new(key_bits, iterations, Mode::from_selector(mode_selector)?)
    }

    /// Builds a configuration from an already-resolved key size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `iterations` is zero.
    pub fn with_key_size(key_size: KeySize, iterations: u32, mode: Mode) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::invalid("iteration count must be at least 1"));
        }

        Ok(Self { key_size, iterations, mode })
    }

    #[inline]
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.key_size
    }

    #[inline]
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }
}

impl Default for CipherConfiguration {
    fn default() -> Self {
        Self { key_size: KeySize::Aes256, iterations: DEFAULT_ITERATIONS, mode: Mode::GcmNoPadding }
    }
}

/// Direction of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processing {
    Encryption,
    Decryption,
}

impl Processing {
    /// Returns a progress label for the operation.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting...",
            Self::Decryption => "Decrypting...",
        }
    }

    /// Returns the past-tense verb used in result messages.
    #[inline]
    #[must_use]
    pub const fn done_label(self) -> &'static str {
        match self {
            Self::Encryption => "encrypted",
            Self::Decryption => "decrypted",
        }
    }
}

impl Display for Processing {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Encryption => f.write_str("encryption"),
            Self::Decryption => f.write_str("decryption"),
        }
    }
}

/// A progress event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Fraction of the input processed, in `[0.0, 1.0]`.
    Fraction(f64),

    /// Total size is unknown; work is happening but no fraction can be given.
    Indeterminate,
}

impl Progress {
    /// The terminal event of a successful operation.
    pub const DONE: Self = Self::Fraction(1.0);

    /// Initial value before anything has been processed.
    pub const START: Self = Self::Fraction(0.0);

    /// Returns the fraction, or [`INDETERMINATE_PROGRESS`] for indeterminate progress.
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Fraction(fraction) => fraction,
            Self::Indeterminate => INDETERMINATE_PROGRESS,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_indeterminate(self) -> bool {
        matches!(self, Self::Indeterminate)
    }
}

/// Lifecycle stage of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    DerivingKey,
    Transforming,
    Finalizing,
    Done,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Init => "init",
            Self::DerivingKey => "deriving key",
            Self::Transforming => "transforming",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// How a transform that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Output fully written and flushed.
    Completed,

    /// Stopped at the caller's request; the output is incomplete.
    Cancelled,
}

/// Terminal outcome handed to callers of a session.
///
/// On anything but [`OperationResult::Success`] the output must be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success,
    Cancelled,
    Failure { kind: ErrorKind, message: String },
}

impl OperationResult {
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the failure kind, if any.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<Result<Status>> for OperationResult {
    fn from(result: Result<Status>) -> Self {
        match result {
            Ok(Status::Completed) => Self::Success,
            Ok(Status::Cancelled) => Self::Cancelled,
            Err(err) => {
                let kind = err.kind();
                Self::Failure { kind, message: kind.message().to_owned() }
            }
        }
    }
}
