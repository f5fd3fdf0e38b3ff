//! The authenticated actor's state.

use serde::{Deserialize, Serialize};

use crate::{Role, UserRecord};

/// Opaque bearer credential returned by the account service.
///
/// Deliberately has no `Display` impl; the token never belongs in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authenticated actor's state.
///
/// # Invariants
/// - `token` absent means logged out; no role-gated route is reachable.
/// - `is_contributor`/`is_view_only` are ignored for admins (always
///   full-access) and meaningless until a role is known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub token: Option<AuthToken>,
    pub role: Option<Role>,
    pub user: Option<UserRecord>,
    pub is_contributor: bool,
    pub is_view_only: bool,
}

impl Session {
    /// The logged-out state: no token, no role, no record, both flags false.
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Derive a session from a successful login or invite acceptance.
    ///
    /// Admins are always stored as contributor and never view-only. For
    /// everyone else the stored view-only flag is forced on whenever the
    /// account is not a contributor, so a non-contributor can never appear
    /// writable no matter what the record says.
    pub fn from_login(token: AuthToken, user: UserRecord) -> Self {
        let (is_contributor, is_view_only) = if user.role.is_admin() {
            (true, false)
        } else {
            (user.is_contributor, !user.is_contributor || user.is_view_only)
        };
        Self {
            token: Some(token),
            role: Some(user.role.clone()),
            user: Some(user),
            is_contributor,
            is_view_only,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carecircle_core::UserId;

    fn user(role: Role, contributor: bool, view_only: bool) -> UserRecord {
        let mut record = UserRecord::new(UserId::new(), "Pat Lee", "pat@example.com", role);
        record.is_contributor = contributor;
        record.is_view_only = view_only;
        record
    }

    #[test]
    fn login_as_admin_forces_contributor_flags() {
        let session = Session::from_login(AuthToken::new("tok"), user(Role::admin(), false, true));
        assert!(session.is_contributor);
        assert!(!session.is_view_only);
    }

    #[test]
    fn login_as_contributor_keeps_record_flags() {
        let session =
            Session::from_login(AuthToken::new("tok"), user(Role::caregiver(), true, false));
        assert!(session.is_contributor);
        assert!(!session.is_view_only);
    }

    #[test]
    fn non_contributor_is_always_view_only() {
        let session =
            Session::from_login(AuthToken::new("tok"), user(Role::family(), false, false));
        assert!(!session.is_contributor);
        assert!(session.is_view_only);
    }

    #[test]
    fn contributor_with_view_only_override_stays_view_only() {
        let session =
            Session::from_login(AuthToken::new("tok"), user(Role::caregiver(), true, true));
        assert!(session.is_contributor);
        assert!(session.is_view_only);
    }

    #[test]
    fn logged_out_has_no_identity() {
        let session = Session::logged_out();
        assert!(!session.is_authenticated());
        assert!(session.role.is_none());
        assert!(session.user.is_none());
    }
}
