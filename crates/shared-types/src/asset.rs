//! # Assets
//!
//! Fixed-point token quantities tagged with their denomination.
//!
//! - `SymbolCode`: 1-7 uppercase letters packed little-endian into a `u64`
//! - `Symbol`: a code plus a decimal precision (`4,SYS`)
//! - `Asset`: signed amount in the smallest unit of its symbol

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest amount an asset may carry (2^62 - 1).
pub const MAX_ASSET_AMOUNT: i64 = (1_i64 << 62) - 1;

/// Largest supported decimal precision.
pub const MAX_PRECISION: u8 = 18;

// =============================================================================
// SYMBOL CODE
// =============================================================================

/// Ticker of a token, e.g. `SYS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SymbolCode(u64);

impl SymbolCode {
    /// Builds a code from a literal at compile time.
    ///
    /// Intended for constants: an invalid literal fails const evaluation.
    #[must_use]
    pub const fn from_static(code: &'static str) -> Self {
        let bytes = code.as_bytes();
        assert!(!bytes.is_empty() && bytes.len() <= 7, "symbol code must be 1-7 letters");
        let mut raw = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            assert!(bytes[i].is_ascii_uppercase(), "symbol code must be uppercase");
            raw |= (bytes[i] as u64) << (8 * i);
            i += 1;
        }
        Self(raw)
    }

    /// Raw packed value; used as the primary key of per-denomination rows.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true if the code holds 1-7 uppercase letters with no gaps.
    #[must_use]
    pub fn is_valid(self) -> bool {
        let mut seen_end = false;
        let mut len = 0;
        for i in 0..8 {
            let byte = ((self.0 >> (8 * i)) & 0xff) as u8;
            if byte == 0 {
                seen_end = true;
            } else if seen_end || !byte.is_ascii_uppercase() {
                return false;
            } else {
                len += 1;
            }
        }
        (1..=7).contains(&len)
    }
}

impl FromStr for SymbolCode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 7 || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::InvalidSymbol(s.to_string()));
        }
        let raw = s
            .bytes()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(b) << (8 * i)));
        Ok(Self(raw))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..8 {
            let byte = ((self.0 >> (8 * i)) & 0xff) as u8;
            if byte == 0 {
                break;
            }
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolCode({self})")
    }
}

// =============================================================================
// SYMBOL
// =============================================================================

/// A symbol code with its decimal precision.
///
/// Decoding goes through the same checks as [`Symbol::new`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PackedSymbol", into = "PackedSymbol")]
pub struct Symbol {
    code: SymbolCode,
    precision: u8,
}

/// Wire form of [`Symbol`].
#[derive(Clone, Copy, Serialize, Deserialize)]
struct PackedSymbol {
    code: SymbolCode,
    precision: u8,
}

impl TryFrom<PackedSymbol> for Symbol {
    type Error = TypeError;

    fn try_from(packed: PackedSymbol) -> Result<Self, Self::Error> {
        if packed.precision > MAX_PRECISION {
            return Err(TypeError::InvalidPrecision(packed.precision));
        }
        if !packed.code.is_valid() {
            return Err(TypeError::InvalidSymbol(format!("{:#x}", packed.code.raw())));
        }
        Ok(Self {
            code: packed.code,
            precision: packed.precision,
        })
    }
}

impl From<Symbol> for PackedSymbol {
    fn from(symbol: Symbol) -> Self {
        Self {
            code: symbol.code,
            precision: symbol.precision,
        }
    }
}

impl Symbol {
    /// Compile-time counterpart of [`Symbol::new`].
    #[must_use]
    pub const fn from_static(code: &'static str, precision: u8) -> Self {
        assert!(precision <= MAX_PRECISION, "precision above 18");
        Self {
            code: SymbolCode::from_static(code),
            precision,
        }
    }

    /// Creates a symbol such as `Symbol::new("SYS", 4)`.
    pub fn new(code: &str, precision: u8) -> Result<Self, TypeError> {
        if precision > MAX_PRECISION {
            return Err(TypeError::InvalidPrecision(precision));
        }
        Ok(Self {
            code: code.parse()?,
            precision,
        })
    }

    #[must_use]
    pub const fn code(self) -> SymbolCode {
        self.code
    }

    #[must_use]
    pub const fn precision(self) -> u8 {
        self.precision
    }

    /// Packed form: `code << 8 | precision`.
    #[must_use]
    pub const fn raw(self) -> u64 {
        (self.code.0 << 8) | self.precision as u64
    }
}

impl FromStr for Symbol {
    type Err = TypeError;

    /// Parses the `precision,CODE` form, e.g. `4,SYS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| TypeError::InvalidSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| TypeError::InvalidSymbol(s.to_string()))?;
        Self::new(code.trim(), precision)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

// =============================================================================
// ASSET
// =============================================================================

/// A token quantity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Amount in the smallest unit (10^-precision).
    pub amount: i64,
    /// Denomination.
    pub symbol: Symbol,
}

impl Asset {
    /// Creates an asset, rejecting amounts outside `±MAX_ASSET_AMOUNT`.
    pub fn new(amount: i64, symbol: Symbol) -> Result<Self, TypeError> {
        let asset = Self { amount, symbol };
        if !asset.is_amount_within_range() {
            return Err(TypeError::AmountOutOfRange(amount));
        }
        Ok(asset)
    }

    #[must_use]
    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(&self.amount)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_amount_within_range() && self.symbol.code.is_valid()
    }

    /// Adds two assets of the same symbol.
    pub fn checked_add(self, other: Self) -> Result<Self, TypeError> {
        if self.symbol != other.symbol {
            return Err(TypeError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .filter(|a| (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(a))
            .ok_or(TypeError::Overflow)?;
        Ok(Self { amount, ..self })
    }

    /// Subtracts two assets of the same symbol.
    pub fn checked_sub(self, other: Self) -> Result<Self, TypeError> {
        if other.amount == i64::MIN {
            return Err(TypeError::Overflow);
        }
        self.checked_add(Self {
            amount: -other.amount,
            symbol: other.symbol,
        })
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    /// Parses `"100.0000 SYS"`. Precision is the number of fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidAsset(s.to_string());

        let (number, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let precision = u8::try_from(frac_part.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(code.trim(), precision)?;

        let magnitude: i64 = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| TypeError::Overflow)?;
        let amount = if negative { -magnitude } else { magnitude };
        Self::new(amount, symbol)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = i128::from(self.amount).unsigned_abs();
        let Some(unit) = 10u128.checked_pow(precision) else {
            return write!(f, "{sign}{magnitude}e-{precision} {}", self.symbol.code);
        };
        let whole = magnitude / unit;
        if precision == 0 {
            write!(f, "{sign}{whole} {}", self.symbol.code)
        } else {
            let frac = magnitude % unit;
            write!(
                f,
                "{sign}{whole}.{frac:0width$} {}",
                self.symbol.code,
                width = precision as usize
            )
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

// =============================================================================
// TESTS
// =============================================================================
