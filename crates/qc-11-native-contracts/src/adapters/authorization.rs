//! Authorization gate backed by the permission levels an action declares.

use crate::domain::entities::Action;
use crate::ports::outbound::AuthorizationGate;
use shared_types::{Name, PermissionLevel};

/// Accounts that signed the running action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclaredAuthorizations {
    actors: Vec<Name>,
}

impl DeclaredAuthorizations {
    #[must_use]
    pub fn from_levels(levels: &[PermissionLevel]) -> Self {
        let mut actors: Vec<Name> = levels.iter().map(|level| level.actor).collect();
        actors.sort_unstable();
        actors.dedup();
        Self { actors }
    }

    #[must_use]
    pub fn from_action(action: &Action) -> Self {
        Self::from_levels(&action.authorization)
    }
}

impl AuthorizationGate for DeclaredAuthorizations {
    fn has_auth(&self, account: Name) -> bool {
        self.actors.binary_search(&account).is_ok()
    }
}
