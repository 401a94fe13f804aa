//! Account identity types.
//!
//! A `UserProfile` is issued by the API on login or signup and stays fixed for
//! the lifetime of the session. Role changes made by an administrator only
//! show up after the user signs in again.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as returned by `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub role: Role,
}

/// Named bundle of capabilities assigned to an account.
///
/// Roles are not ranked against each other; what a role may do is decided
/// entirely by [`crate::auth::capabilities_of`]. Role strings the client does
/// not know are kept as `Unrecognized` rather than rejected, so a profile with
/// an unexpected role still loads and simply grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    Analyst,
    Viewer,
    Unrecognized(String),
}

impl Role {
    /// The roles an account can be created with.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Analyst, Role::Viewer];

    /// Parse a role name. Matching ignores case and surrounding whitespace.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "analyst" => Role::Analyst,
            "viewer" => Role::Viewer,
            _ => Role::Unrecognized(s.to_string()),
        }
    }

    /// Wire name of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
            Role::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Unrecognized(_))
    }

    /// One-line summary shown in the access overview.
    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full visibility and approval rights across the platform.",
            Role::Manager => "Manage teams, approve workflows, view all dashboards.",
            Role::Analyst => "Access analytics, reports, and operational insights.",
            Role::Viewer => "Read-only access to assigned dashboards and metrics.",
            Role::Unrecognized(_) => "Unknown role with no access.",
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account details submitted on signup or when an admin creates a user.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.full_name.trim().is_empty() {
            Some("full name")
        } else if self.email.trim().is_empty() {
            Some("email")
        } else if self.password.is_empty() {
            Some("password")
        } else {
            None
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}
