//! # Block Time
//!
//! Second-resolution timestamps as seen by contracts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TimePointSec(u32);

impl TimePointSec {
    /// The epoch.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn secs(self) -> u32 {
        self.0
    }

    /// Current wall-clock time, saturating at `u32::MAX`.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub const fn saturating_add(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }

    #[must_use]
    pub const fn saturating_sub(self, secs: u32) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl fmt::Debug for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePointSec({})", self.0)
    }
}
