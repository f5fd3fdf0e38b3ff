//! The serialized user record exchanged with the account service and kept
//! in the session store.

use serde::{Deserialize, Serialize};

use carecircle_core::UserId;

use crate::Role;

/// A user account as the backend reports it.
///
/// Wire names are camelCase. The two permission flags are frequently absent
/// on older records, so they default to `false` on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_contributor: bool,
    #[serde(default)]
    pub is_view_only: bool,
}

impl UserRecord {
    pub fn new(id: UserId, fullname: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            fullname: fullname.into(),
            email: email.into(),
            role,
            is_contributor: false,
            is_view_only: false,
        }
    }
}
