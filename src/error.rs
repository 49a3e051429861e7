//! Error taxonomy for key derivation, mode resolution and streaming.
//!
//! Every failure the library can report maps onto one [`ErrorKind`], and every
//! kind carries exactly one user-facing message. Wrong-password conditions are
//! intentionally coarse: CBC padding failures never surface as anything but
//! [`Error::DecryptionFailed`], so callers cannot build a padding oracle out of
//! the error values.

use std::fmt::{Display, Formatter};
use std::io;

use thiserror::Error;

/// Which end of a transform an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The readable input stream.
    Source,

    /// The writable output stream.
    Sink,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("input stream"),
            Self::Sink => f.write_str("output stream"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported cipher mode selector: {0}")]
    UnsupportedMode(u8),

    #[error("input truncated: expected a {expected}-byte header, found {found} bytes")]
    TruncatedInput { expected: usize, found: usize },

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("i/o failure on {side}")]
    Io {
        side: Side,
        #[source]
        source: io::Error,
    },

    #[error("another operation is already active on this session")]
    Busy,

    #[error("secure random source failed: {0}")]
    Entropy(String),
}

impl Error {
    /// Wraps an I/O error raised while reading the input.
    #[inline]
    pub fn read(source: io::Error) -> Self {
        Self::Io { side: Side::Source, source }
    }

    /// Wraps an I/O error raised while writing the output.
    #[inline]
    pub fn write(source: io::Error) -> Self {
        Self::Io { side: Side::Sink, source }
    }

    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::UnsupportedMode(_) => ErrorKind::UnsupportedMode,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::DecryptionFailed => ErrorKind::DecryptionFailed,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::Busy => ErrorKind::Busy,
            Self::Entropy(_) => ErrorKind::Entropy,
        }
    }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    UnsupportedMode,
    TruncatedInput,
    DecryptionFailed,
    AuthenticationFailed,
    Io,
    Busy,
    Entropy,
}

impl ErrorKind {
    /// The single human-readable message shown to users for this kind.
    ///
    /// CTR mode has no integrity check, so a wrong password there produces
    /// garbage output and none of these messages.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidParameter => "The cipher configuration is invalid. Check the key size and iteration count.",
            Self::UnsupportedMode => "The selected cipher mode is not supported.",
            Self::TruncatedInput => "The input is too short to be an encrypted file.",
            Self::DecryptionFailed => "Decryption failed. The password, key size, iteration count or mode is wrong, or the file is corrupted.",
            Self::AuthenticationFailed => "Authentication failed. The password or settings are wrong, or the file has been tampered with.",
            Self::Io => "Reading the input or writing the output failed.",
            Self::Busy => "Another operation is still running.",
            Self::Entropy => "The system random number generator is unavailable.",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_side() {
        let err = Error::write(io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "i/o failure on output stream");

        let err = Error::read(io::Error::other("gone"));
        assert_eq!(err.to_string(), "i/o failure on input stream");
    }

    #[test]
    fn test_wrong_key_errors_do_not_leak_details() {
        assert_eq!(Error::DecryptionFailed.to_string(), "decryption failed");
        assert_eq!(Error::AuthenticationFailed.to_string(), "authentication failed");
    }

    #[test]
    fn test_every_kind_has_a_message() {
        let kinds = [
            ErrorKind::InvalidParameter,
            ErrorKind::UnsupportedMode,
            ErrorKind::TruncatedInput,
            ErrorKind::DecryptionFailed,
            ErrorKind::AuthenticationFailed,
            ErrorKind::Io,
            ErrorKind::Busy,
            ErrorKind::Entropy,
        ];
        for kind in kinds {
            assert!(!kind.message().is_empty());
        }
    }
}
