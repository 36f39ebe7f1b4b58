//! # Permission Levels
//!
//! An `actor@permission` pair naming who authorized an action.

use crate::errors::TypeError;
use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The `active` permission every account carries.
pub const ACTIVE: Name = Name::from_static("active");

/// The `owner` permission.
pub const OWNER: Name = Name::from_static("owner");

/// An authorization entry attached to an action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PermissionLevel {
    /// Account granting the authorization.
    pub actor: Name,
    /// Permission of `actor` being used.
    pub permission: Name,
}

impl PermissionLevel {
    #[must_use]
    pub const fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }

    /// `actor@active`.
    #[must_use]
    pub const fn active(actor: Name) -> Self {
        Self::new(actor, ACTIVE)
    }
}

impl FromStr for PermissionLevel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (actor, permission) = s
            .split_once('@')
            .ok_or_else(|| TypeError::InvalidPermission(s.to_string()))?;
        Ok(Self::new(actor.parse()?, permission.parse()?))
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}
