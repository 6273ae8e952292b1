//! Users: the identity automated playbook runs execute as.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A dashboard user. Automations run playbooks as the first (admin) user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}
