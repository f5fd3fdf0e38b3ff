//! Storage key layout.
//!
//! Each session field is stored under its own key; only the user record is
//! a serialized blob. The names are part of the persisted format and must
//! not change.

pub const USER_TOKEN: &str = "userToken";
pub const USER_INFO: &str = "userInfo";
pub const USER_ROLE: &str = "userRole";
pub const IS_CONTRIBUTOR: &str = "isContributor";
pub const IS_VIEW_ONLY: &str = "isViewOnly";

/// Removal order for a clear. The token goes last: until it is gone the
/// session still reads as "logged in", so every other field must already
/// be absent by then.
pub const CLEAR_ORDER: &[&str] = &[
    USER_INFO,
    USER_ROLE,
    IS_CONTRIBUTOR,
    IS_VIEW_ONLY,
    USER_TOKEN,
];
