//! # Integration Tests
//!
//! Cross-contract flows through one contract host.

pub mod flows;
