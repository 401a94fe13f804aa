//! Data models shared between the session layer and the feature endpoints.
//!
//! - `UserProfile`, `Role`, `NewUser`: account identity as issued by the API
//! - `ClusterHealth`: Kubernetes cluster health snapshot

pub mod cluster;
pub mod user;

pub use cluster::ClusterHealth;
pub use user::{NewUser, Role, UserProfile};
