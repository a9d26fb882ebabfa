// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission and role evaluation for UI gating.

use serde::{Deserialize, Serialize};

use crate::session::User;

/// What a surface requires of the signed-in user. Empty lists are vacuously
/// satisfied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessRequirement {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// True iff the user holds every required permission and every required
/// role.
pub fn has_access(user: &User, required: &AccessRequirement) -> bool {
    let permissions_ok =
        required.permissions.iter().all(|p| user.permissions.iter().any(|held| held == p));
    let roles_ok = required.roles.iter().all(|r| user.roles.iter().any(|held| held == r));
    permissions_ok && roles_ok
}
