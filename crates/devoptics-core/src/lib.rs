//! DevOptics core - session, authorization and API access.
//!
//! One credential store owns the persisted session, one interceptor attaches
//! it to every request and ends it on a 401, and one role policy answers
//! every "may this user do X" question.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, LogNavigator, Navigator};
pub use auth::{
    capabilities_of, AuthError, Capability, SessionEvent, SessionManager, SessionState,
    SignOutReason,
};
pub use config::Config;
pub use models::{ClusterHealth, NewUser, Role, UserProfile};
