//! Cipher mode registry.
//!
//! Maps the small integer selector callers pass around to one of three fixed
//! AES mode configurations. Unknown selectors are an error; the registry never
//! falls back to a default mode.

use strum::{Display, EnumIter, EnumString};

use crate::config::{GCM_TAG_LEN, IV_LEN};
use crate::error::{Error, Result};

/// Supported AES modes. The discriminant is the wire/configuration selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Mode {
    /// AES-CBC with PKCS#5/7 padding. Wrong keys usually fail unpadding, but
    /// the failure is reported only as a generic decryption failure.
    #[strum(to_string = "AES/CBC/PKCS5Padding", serialize = "cbc")]
    CbcPkcs5 = 1,

    /// AES-GCM with a 128-bit tag, verified at finalization.
    #[strum(to_string = "AES/GCM/NoPadding", serialize = "gcm")]
    GcmNoPadding = 2,

    /// AES-CTR. No integrity check: a wrong password yields garbage, not an error.
    #[strum(to_string = "AES/CTR/NoPadding", serialize = "ctr")]
    CtrNoPadding = 3,
}

/// Resolved parameters of a [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpec {
    pub algorithm: &'static str,
    pub iv_len: usize,
    pub requires_padding: bool,
    pub is_aead: bool,
    pub tag_len_bits: u16,
}

impl Mode {
    /// The selector value of this mode.
    #[inline]
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }

    /// Looks up a mode by selector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMode`] for any selector outside 1..=3.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Self::CbcPkcs5),
            2 => Ok(Self::GcmNoPadding),
            3 => Ok(Self::CtrNoPadding),
            other => Err(Error::UnsupportedMode(other)),
        }
    }

    /// Resolves a selector straight to its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMode`] for unknown selectors.
    pub fn resolve(selector: u8) -> Result<ModeSpec> {
        Self::from_selector(selector).map(Self::spec)
    }

    #[must_use]
    pub const fn spec(self) -> ModeSpec {
        match self {
            Self::CbcPkcs5 => ModeSpec { algorithm: "AES/CBC/PKCS5Padding", iv_len: IV_LEN, requires_padding: true, is_aead: false, tag_len_bits: 0 },
            Self::GcmNoPadding => ModeSpec { algorithm: "AES/GCM/NoPadding", iv_len: IV_LEN, requires_padding: false, is_aead: true, tag_len_bits: (GCM_TAG_LEN * 8) as u16 },
            Self::CtrNoPadding => ModeSpec { algorithm: "AES/CTR/NoPadding", iv_len: IV_LEN, requires_padding: false, is_aead: false, tag_len_bits: 0 },
        }
    }

    /// Whether decrypting with the wrong key is ever reported as an error.
    ///
    /// False only for CTR, which silently produces garbage.
    #[inline]
    #[must_use]
    pub const fn detects_wrong_key(self) -> bool {
        !matches!(self, Self::CtrNoPadding)
    }
}

impl TryFrom<u8> for Mode {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self> {
        Self::from_selector(selector)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_resolve_known_selectors() {
        let cbc = Mode::resolve(1).unwrap();
        assert!(cbc.requires_padding);
        assert!(!cbc.is_aead);

        let gcm = Mode::resolve(2).unwrap();
        assert!(gcm.is_aead);
        assert_eq!(gcm.tag_len_bits, 128);
        assert!(!gcm.requires_padding);

        let ctr = Mode::resolve(3).unwrap();
        assert!(!ctr.is_aead);
        assert_eq!(ctr.tag_len_bits, 0);
    }

    #[test]
    fn test_unknown_selector_never_falls_back() {
        for selector in [0u8, 4, 42, 255] {
            let err = Mode::resolve(selector).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedMode);
        }
    }

    #[test]
    fn test_selector_round_trips() {
        for mode in Mode::iter() {
            assert_eq!(Mode::try_from(mode.selector()).unwrap(), mode);
            assert_eq!(mode.spec().iv_len, IV_LEN);
            assert_eq!(mode.to_string(), mode.spec().algorithm);
        }
    }

    #[test]
    fn test_parse_short_names() {
        assert_eq!(Mode::from_str("cbc").unwrap(), Mode::CbcPkcs5);
        assert_eq!(Mode::from_str("GCM").unwrap(), Mode::GcmNoPadding);
        assert_eq!(Mode::from_str("AES/CTR/NoPadding").unwrap(), Mode::CtrNoPadding);
        assert!(Mode::from_str("ecb").is_err());
    }
}
