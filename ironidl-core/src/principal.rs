//! Principal identifiers.
//!
//! A principal is an opaque identity of up to 29 bytes. Its textual form is
//! the lowercase base32 encoding (no padding) of `crc32(bytes) || bytes`,
//! split into groups of five characters joined by `-`.

use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;

const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const CHECKSUM_LEN: usize = 4;
const GROUP_LEN: usize = 5;

/// Opaque identity bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Principal(Vec<u8>);

impl Principal {
    /// Maximum identity length in bytes.
    pub const MAX_LENGTH: usize = 29;

    /// Creates a principal from raw bytes.
    ///
    /// # Errors
    /// Returns [`EncodingError::InvalidPrincipal`] if `bytes` is longer than
    /// [`Self::MAX_LENGTH`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() > Self::MAX_LENGTH {
            return Err(EncodingError::InvalidPrincipal {
                text: hex(bytes),
                reason: "longer than 29 bytes",
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The management principal (no bytes), `aaaaa-aa`.
    #[must_use]
    pub const fn management() -> Self {
        Self(Vec::new())
    }

    /// The anonymous principal, `2vxsx-fae`.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    /// Returns the identity bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Parses the textual form, verifying the checksum.
    ///
    /// # Errors
    /// Returns [`EncodingError::InvalidPrincipal`] for malformed text, a
    /// checksum mismatch or a non-canonical spelling.
    pub fn from_text(text: &str) -> Result<Self, EncodingError> {
        let invalid = |reason| EncodingError::InvalidPrincipal {
            text: text.to_string(),
            reason,
        };
        let compact: String = text.chars().filter(|c| *c != '-').collect();
        let decoded = base32_decode(&compact.to_ascii_lowercase())
            .ok_or_else(|| invalid("invalid base32 character"))?;
        if decoded.len() < CHECKSUM_LEN {
            return Err(invalid("too short"));
        }
        let (checksum, bytes) = decoded.split_at(CHECKSUM_LEN);
        let principal = Self::from_slice(bytes).map_err(|_| invalid("longer than 29 bytes"))?;
        if checksum != crc32fast::hash(bytes).to_be_bytes() {
            return Err(invalid("checksum mismatch"));
        }
        if principal.to_text() != text.to_ascii_lowercase() {
            return Err(invalid("not in canonical form"));
        }
        Ok(principal)
    }

    /// Returns the textual form.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut data = Vec::with_capacity(CHECKSUM_LEN + self.0.len());
        data.extend_from_slice(&crc32fast::hash(&self.0).to_be_bytes());
        data.extend_from_slice(&self.0);
        let encoded = base32_encode(&data);

        let mut text = String::with_capacity(encoded.len() + encoded.len() / GROUP_LEN);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % GROUP_LEN == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[((buffer >> bits) & 0x1f) as usize]));
        }
    }
    if bits > 0 {
        out.push(char::from(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize]));
    }
    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.bytes() {
        let value = ALPHABET.iter().position(|&a| a == c)?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    Some(out)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_principals() {
        assert_eq!(Principal::management().to_text(), "aaaaa-aa");
        assert_eq!(Principal::anonymous().to_text(), "2vxsx-fae");
    }

    #[test]
    fn test_text_round_trip() {
        let principal = Principal::from_slice(&[0xab, 0xcd, 0x01]).unwrap();
        assert_eq!(principal.to_text(), "em77e-bvlzu-aq");
        assert_eq!(Principal::from_text("em77e-bvlzu-aq").unwrap(), principal);

        let long: Vec<u8> = (0..29).collect();
        let principal = Principal::from_slice(&long).unwrap();
        let text = principal.to_text();
        assert_eq!(
            text,
            "2mhjn-ayaae-bagba-faydq-qcikb-mga2d-qpcai-reeyu-culbo-gazdi-nry"
        );
        assert_eq!(text.parse::<Principal>().unwrap(), principal);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let err = Principal::from_text("em77e-bvlzu-ab").unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPrincipal { .. }));
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert!(Principal::from_text("aaaaa-a1").is_err());
        assert!(Principal::from_text("").is_err());
    }

    #[test]
    fn test_too_long_rejected() {
        assert!(Principal::from_slice(&[0u8; 30]).is_err());
    }
}
