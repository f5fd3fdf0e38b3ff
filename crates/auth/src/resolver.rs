//! Capability resolution.
//!
//! Every UI surface consumes the derived [`Capabilities`] from here instead
//! of re-deriving it from raw role/flag state. The resolver is recomputed on
//! every call; the session may have changed underneath it, so nothing is
//! memoized.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Role, Session};

/// The four derived booleans controlling UI affordances and action gating.
///
/// Derived, never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_view: bool,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            can_view: true,
            can_add: true,
            can_edit: true,
            can_delete: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            can_view: true,
            can_add: false,
            can_edit: false,
            can_delete: false,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Add => self.can_add,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }
}

/// A mutating (or viewing) operation a surface may attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: action '{0}' not permitted")]
    Forbidden(Action),
}

/// Resolve a session to its capability set.
///
/// - No IO
/// - No panics
/// - Total over every session shape, including absent or unrecognized roles
///
/// Priority order, first match wins: admin gets full access, then
/// family/caregiver get full access only as contributor-and-not-view-only,
/// and everything else collapses to read-only. The admin check consults both
/// the session role and the stored user record, since either may carry the
/// admin marking on its own.
pub fn resolve(session: &Session) -> Capabilities {
    let record_admin = session
        .user
        .as_ref()
        .map(|u| u.role.is_admin())
        .unwrap_or(false);
    let role_admin = session.role.as_ref().map(Role::is_admin).unwrap_or(false);
    if role_admin || record_admin {
        return Capabilities::full();
    }

    match session.role.as_ref() {
        Some(role) if role.is_family() || role.is_caregiver() => {
            if session.is_contributor && !session.is_view_only {
                Capabilities::full()
            } else {
                Capabilities::read_only()
            }
        }
        _ => Capabilities::read_only(),
    }
}

/// Gate an action attempt against an already-resolved capability set.
///
/// - No IO
/// - No panics
pub fn authorize(capabilities: &Capabilities, action: Action) -> Result<(), AuthzError> {
    if capabilities.allows(action) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthToken, UserRecord};
    use carecircle_core::UserId;

    fn session(role: Role, contributor: bool, view_only: bool) -> Session {
        let mut record = UserRecord::new(UserId::new(), "Test User", "test@example.com", role);
        record.is_contributor = contributor;
        record.is_view_only = view_only;
        Session::from_login(AuthToken::new("tok"), record)
    }

    #[test]
    fn admin_always_resolves_to_full_access() {
        for (contributor, view_only) in
            [(false, false), (false, true), (true, false), (true, true)]
        {
            let caps = resolve(&session(Role::admin(), contributor, view_only));
            assert_eq!(caps, Capabilities::full());
        }
    }

    #[test]
    fn record_admin_wins_even_without_session_role() {
        let mut s = session(Role::admin(), false, true);
        s.role = None;
        assert_eq!(resolve(&s), Capabilities::full());
    }

    #[test]
    fn family_contributor_gets_full_access() {
        let caps = resolve(&session(Role::family(), true, false));
        assert_eq!(caps, Capabilities::full());
    }

    #[test]
    fn caregiver_view_only_override_forces_read_only() {
        let caps = resolve(&session(Role::caregiver(), true, true));
        assert_eq!(caps, Capabilities::read_only());
    }

    #[test]
    fn family_without_contributor_is_read_only() {
        let caps = resolve(&session(Role::family(), false, false));
        assert_eq!(caps, Capabilities::read_only());
    }

    #[test]
    fn logged_out_session_is_read_only() {
        assert_eq!(resolve(&Session::logged_out()), Capabilities::read_only());
    }

    #[test]
    fn unrecognized_role_is_read_only() {
        let caps = resolve(&session(Role::new("auditor"), true, false));
        assert_eq!(caps, Capabilities::read_only());
    }

    #[test]
    fn authorize_allows_view_for_read_only() {
        let caps = Capabilities::read_only();
        assert!(authorize(&caps, Action::View).is_ok());
    }

    #[test]
    fn authorize_blocks_mutations_for_read_only() {
        let caps = Capabilities::read_only();
        for action in [Action::Add, Action::Edit, Action::Delete] {
            let err = authorize(&caps, action).unwrap_err();
            assert_eq!(err, AuthzError::Forbidden(action));
        }
    }
}
