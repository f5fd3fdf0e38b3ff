use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier attached to an account.
///
/// Roles are intentionally opaque strings at this layer; stored state may
/// contain names this build has never heard of, and the resolver and route
/// policy must stay total over them. The known names get constructors and
/// predicates below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const FAMILY: &'static str = "family";
    pub const CAREGIVER: &'static str = "caregiver";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed(Self::ADMIN))
    }

    pub fn family() -> Self {
        Self(Cow::Borrowed(Self::FAMILY))
    }

    pub fn caregiver() -> Self {
        Self(Cow::Borrowed(Self::CAREGIVER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    pub fn is_family(&self) -> bool {
        self.0 == Self::FAMILY
    }

    pub fn is_caregiver(&self) -> bool {
        self.0 == Self::CAREGIVER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
