//! Session bootstrap for the classroom parent/teacher client.
//!
//! ARCHITECTURE
//! ============
//! `bootstrap::AuthBootstrapper` owns the login flow. Everything it talks
//! to sits behind a trait so hosts can plug in their own platform pieces:
//! `api::AuthApi` (school server), `store::SessionStore` and
//! `store::KeyValueStore` (persistence), `push::PermissionService` and
//! `push::PushProvisioner` (notification platform).

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod push;
pub mod store;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bootstrap::{AuthBootstrapper, AuthContext, FlowState, LoginOutcome};
pub use types::{Credentials, LoginError, PushError, Role, Session, SubmitError, ValidationError};
pub use validate::validate;
