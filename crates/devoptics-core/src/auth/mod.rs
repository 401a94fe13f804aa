//! Session and authorization.
//!
//! This module provides:
//! - `CredentialStore`: single owner of the persisted token and profile
//! - `SessionManager`: login, signup, logout and "who am I"
//! - `capabilities_of`: the role policy consulted for every access check
//! - `SessionEvent`: sign-in/sign-out transitions for observers
//!
//! A stored credential is trusted until the server rejects it; there is no
//! expiry check or refresh on the client.

pub mod credentials;
pub mod error;
pub mod events;
pub mod policy;
pub mod session;
pub mod storage;

pub use credentials::{Credential, CredentialStore};
pub use error::{AuthAction, AuthError};
pub use events::{SessionEvent, SessionEvents, SignOutReason};
pub use policy::{capabilities_of, Capability};
pub use session::{SessionManager, SessionState};
pub use storage::{FileStorage, MemoryStorage, Storage};
