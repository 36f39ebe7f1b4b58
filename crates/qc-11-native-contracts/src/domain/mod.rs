//! # Domain Layer (Inner Hexagon)
//!
//! Pure contract-execution concepts: keyed tables with undo sessions,
//! actions and their queued effects, the per-action context, and the
//! business invariants.
//!
//! NO async and NO gateway calls here. Everything is synchronous and runs
//! under the host's database lock.

pub mod context;
pub mod entities;
pub mod invariants;
pub mod table;

pub use context::*;
pub use entities::*;
pub use invariants::*;
pub use table::*;
