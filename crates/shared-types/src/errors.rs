//! # Error Types
//!
//! Errors raised while building or combining chain primitives.

use thiserror::Error;

/// Invalid or out-of-range primitive value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Name text is not encodable.
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Symbol code is not 1-7 uppercase letters, or `precision,CODE` is malformed.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Precision above the supported maximum.
    #[error("Invalid precision {0}: maximum is 18")]
    InvalidPrecision(u8),

    /// Asset text is malformed.
    #[error("Invalid asset: {0:?}")]
    InvalidAsset(String),

    /// Amount outside the representable asset range.
    #[error("Asset amount out of range: {0}")]
    AmountOutOfRange(i64),

    /// Arithmetic on assets of different symbols.
    #[error("Symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: String, right: String },

    /// Asset arithmetic overflowed.
    #[error("Asset arithmetic overflow")]
    Overflow,

    /// Permission level is not `actor@permission`.
    #[error("Invalid permission level: {0:?}")]
    InvalidPermission(String),
}
