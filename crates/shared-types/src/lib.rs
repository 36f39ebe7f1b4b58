//! # Shared Types Crate
//!
//! Chain primitives shared by the contract host and every contract:
//! account names, symbols and assets, block time and permission levels.
//!
//! ## Design Principles
//!
//! - **Value types only**: nothing here touches storage or dispatch.
//! - **Packed forms are keys**: `Name::raw()` and `SymbolCode::raw()` are the
//!   primary keys used by contract tables.

pub mod asset;
pub mod errors;
pub mod name;
pub mod permission;
pub mod time;

pub use asset::{Asset, Symbol, SymbolCode, MAX_ASSET_AMOUNT, MAX_PRECISION};
pub use errors::TypeError;
pub use name::{Name, MAX_NAME_LEN};
pub use permission::{PermissionLevel, ACTIVE, OWNER};
pub use time::TimePointSec;
