//! # Account Names
//!
//! 64-bit identifiers used for accounts, actions, tables and permissions.
//!
//! The text form uses the 32-character alphabet `.12345abcdefghijklmnopqrstuvwxyz`.
//! The first 12 characters are packed 5 bits each from the most significant
//! end; an optional 13th character takes the remaining 4 bits, so it is
//! limited to `.12345abcdefghij`.

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alphabet indexed by the 5-bit symbol value.
const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters in a name.
pub const MAX_NAME_LEN: usize = 13;

/// A 64-bit account / action / table name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Name(u64);

// =============================================================================
// PARSING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameFault {
    TooLong,
    BadChar(u8),
    BadLastChar(u8),
}

const fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

const fn pack(s: &str) -> Result<u64, NameFault> {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_NAME_LEN {
        return Err(NameFault::TooLong);
    }

    let mut value: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let Some(sym) = char_to_symbol(bytes[i]) else {
            return Err(NameFault::BadChar(bytes[i]));
        };
        if i < 12 {
            value |= (sym & 0x1f) << (64 - 5 * (i + 1));
        } else {
            if sym > 0x0f {
                return Err(NameFault::BadLastChar(bytes[i]));
            }
            value |= sym;
        }
        i += 1;
    }
    Ok(value)
}

impl Name {
    /// The empty name (raw value 0).
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw 64-bit value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Builds a name from a string literal at compile time.
    ///
    /// Intended for constants: an invalid literal fails const evaluation.
    #[must_use]
    pub const fn from_static(s: &'static str) -> Self {
        match pack(s) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("invalid name literal"),
        }
    }

    /// Raw 64-bit value. This is the primary key form of the name.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of significant characters in the text form.
    #[must_use]
    pub fn length(self) -> usize {
        self.to_string().len()
    }
}

impl FromStr for Name {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = pack(s).map_err(|fault| {
            let reason = match fault {
                NameFault::TooLong => format!("longer than {MAX_NAME_LEN} characters"),
                NameFault::BadChar(c) => format!("illegal character {:?}", c as char),
                NameFault::BadLastChar(c) => {
                    format!("13th character {:?} must be one of .1-5a-j", c as char)
                }
            };
            TypeError::InvalidName {
                name: s.to_string(),
                reason,
            }
        })?;

        let name = Self(raw);
        // Trailing dots are not representable, so "abc." would silently
        // become "abc". Reject anything that does not round-trip.
        if name.to_string() != s {
            return Err(TypeError::InvalidName {
                name: s.to_string(),
                reason: "not in normalized form".to_string(),
            });
        }
        Ok(name)
    }
}

impl TryFrom<&str> for Name {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Name> for u64 {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }

        let end = out
            .iter()
            .rposition(|&c| c != b'.')
            .map_or(0, |pos| pos + 1);
        // CHARMAP is pure ASCII
        f.write_str(std::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for text in ["alice", "eosio.token", "abcounter", "a", "zzzzzzzzzzzzj", "hodl"] {
            let name: Name = text.parse().unwrap();
            assert_eq!(name.to_string(), text);
        }
    }

    #[test]
    fn test_known_raw_values() {
        // eosio = 0x5530EA0000000000
        let eosio: Name = "eosio".parse().unwrap();
        assert_eq!(eosio.raw(), 0x5530_EA00_0000_0000);
        assert_eq!(Name::from_raw(0x5530_EA00_0000_0000).to_string(), "eosio");
    }

    #[test]
    fn test_const_constructor_matches_parse() {
        const TOKEN: Name = Name::from_static("eosio.token");
        assert_eq!(TOKEN, "eosio.token".parse::<Name>().unwrap());
    }

    #[test]
    fn test_empty_name() {
        let name: Name = "".parse().unwrap();
        assert!(name.is_empty());
        assert_eq!(name, Name::EMPTY);
        assert_eq!(name.to_string(), "");
    }

    #[test]
    fn test_rejects_illegal_characters() {
        assert!("Alice".parse::<Name>().is_err());
        assert!("bob6".parse::<Name>().is_err());
        assert!("with space".parse::<Name>().is_err());
    }

    #[test]
    fn test_rejects_too_long() {
        let err = "abcdefghijklmn".parse::<Name>().unwrap_err();
        assert!(err.to_string().contains("longer than 13"));
    }

    #[test]
    fn test_rejects_bad_thirteenth_char() {
        assert!("aaaaaaaaaaaaz".parse::<Name>().is_err());
        assert!("aaaaaaaaaaaaj".parse::<Name>().is_ok());
    }

    #[test]
    fn test_rejects_trailing_dot() {
        assert!("alice.".parse::<Name>().is_err());
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let a: Name = "alice".parse().unwrap();
        let b: Name = "bob".parse().unwrap();
        assert!(a < b);
        assert_eq!(a.cmp(&b), a.raw().cmp(&b.raw()));
    }
}
