//! REST API client module for the DevOptics backend.
//!
//! This module provides the `ApiClient` shared by every feature, and the
//! `AuthInterceptor` that attaches the stored bearer token to each request
//! and ends the session when the server answers 401.

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{AuthInterceptor, LogNavigator, Navigator};
