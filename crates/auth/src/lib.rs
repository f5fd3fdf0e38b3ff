//! `carecircle-auth` — pure identity and policy boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns the
//! session shape, the capability resolver, and the route policy; everything
//! here is deterministic and IO-free.

pub mod resolver;
pub mod roles;
pub mod routes;
pub mod session;
pub mod user;

pub use resolver::{Action, AuthzError, Capabilities, authorize, resolve};
pub use roles::Role;
pub use routes::{RouteDecision, decide, is_allowed};
pub use session::{AuthToken, Session};
pub use user::UserRecord;
