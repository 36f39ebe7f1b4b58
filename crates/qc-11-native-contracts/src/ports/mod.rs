//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the contract host and the outside world.
//!
//! - **Driving Ports (Inbound)**: `ContractApi`
//! - **Driven Ports (Outbound)**: `AuthorizationGate`, `NotificationChannel`,
//!   `TransferGateway`, `UsageCounter`, `Clock`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
