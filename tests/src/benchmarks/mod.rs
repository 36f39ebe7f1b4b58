//! # Quantum-Chain Benchmarks
//!
//! Performance benchmarks for the contract host.

pub mod qc_11_native_contracts;
