//! Route policy.
//!
//! One place decides, per navigation path, whether the current session may
//! reach it. Surfaces never branch on raw role strings themselves.

use crate::Session;

pub const HOME: &str = "/home";
pub const NOTES_FEED: &str = "/notesfeed";
pub const APPOINTMENTS: &str = "/appointments";
pub const MEDICATIONS: &str = "/medications";
pub const SYMPTOM_TRACKER: &str = "/symptom-tracker";
pub const MEDICAL_RECORDS: &str = "/medical-records";
pub const PROFILE_SETTINGS: &str = "/profile-settings";
pub const PATIENTS_DETAILS: &str = "/patients-details";
pub const USERS_ACCOUNT: &str = "/users-account";
pub const ACCEPT_INVITE: &str = "/accept-invite";

/// Reachable with or without a session (invite acceptance).
pub const PUBLIC_ROUTES: &[&str] = &[ACCEPT_INVITE];

/// The restricted subset a non-contributing caregiver keeps.
pub const COMMON_ROUTES: &[&str] = &[HOME, MEDICAL_RECORDS, PROFILE_SETTINGS];

/// The full feature surface available to family accounts and contributing
/// caregivers.
pub const FEATURE_ROUTES: &[&str] = &[
    HOME,
    NOTES_FEED,
    APPOINTMENTS,
    MEDICATIONS,
    SYMPTOM_TRACKER,
    MEDICAL_RECORDS,
    PROFILE_SETTINGS,
    PATIENTS_DETAILS,
    USERS_ACCOUNT,
];

/// Whether `session` may reach `path`.
///
/// - No IO
/// - No panics
/// - Total over arbitrary paths and role strings
///
/// Admins may reach everything. A session with an unrecognized role keeps
/// only the public routes.
pub fn is_allowed(path: &str, session: &Session) -> bool {
    if PUBLIC_ROUTES.contains(&path) {
        return true;
    }
    if !session.is_authenticated() {
        return false;
    }

    let record_admin = session
        .user
        .as_ref()
        .map(|u| u.role.is_admin())
        .unwrap_or(false);
    match session.role.as_ref() {
        Some(role) if role.is_admin() => true,
        _ if record_admin => true,
        Some(role) if role.is_family() => FEATURE_ROUTES.contains(&path),
        Some(role) if role.is_caregiver() => {
            if session.is_contributor && !session.is_view_only {
                FEATURE_ROUTES.contains(&path)
            } else {
                COMMON_ROUTES.contains(&path)
            }
        }
        _ => false,
    }
}

/// What to do with a navigation attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested route.
    Allow,
    /// Authenticated but not permitted here; send to the home route rather
    /// than back to login, since the session itself is valid.
    RedirectHome,
    /// No session; render the authentication entry screens in place of the
    /// requested route. There is nowhere authenticated to redirect to.
    RenderAuth,
}

/// Decide a navigation attempt.
pub fn decide(path: &str, session: &Session) -> RouteDecision {
    if is_allowed(path, session) {
        RouteDecision::Allow
    } else if session.is_authenticated() {
        RouteDecision::RedirectHome
    } else {
        RouteDecision::RenderAuth
    }
}
