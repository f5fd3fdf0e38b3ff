//! `carecircle-accounts` — account flows against the care service.
//!
//! [`SessionManager`] orchestrates login, invite acceptance, and logout:
//! authenticate against the service, commit to the session store, then
//! notify subscribers. [`UserDirectory`] is the administration surface over
//! the user list, and [`ViewBinding`] gives each mounted surface a live
//! capability gate.

pub mod api;
pub mod directory;
#[cfg(feature = "http")]
pub mod http;
pub mod manager;
pub mod view;

#[cfg(test)]
mod integration_tests;

pub use api::{ApiClient, ApiError, InMemoryApi, LoginResponse, UserUpdate};
pub use directory::UserDirectory;
#[cfg(feature = "http")]
pub use http::HttpApi;
pub use manager::{AccountError, SessionManager};
pub use view::ViewBinding;
