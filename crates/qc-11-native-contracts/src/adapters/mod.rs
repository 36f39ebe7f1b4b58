//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports. They back the tests and
//! the default host built by [`create_test_host`](crate::service::create_test_host).

pub mod authorization;
pub mod clock;
pub mod notification;
pub mod token_ledger;
pub mod usage_counter;

pub use authorization::*;
pub use clock::*;
pub use notification::*;
pub use token_ledger::*;
pub use usage_counter::*;
