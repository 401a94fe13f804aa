use thiserror::Error;

/// Which form a failure came from; picks the generic message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    SignIn,
    SignUp,
}

impl AuthAction {
    pub fn fallback_message(self) -> &'static str {
        match self {
            AuthAction::SignIn => "Unable to sign in",
            AuthAction::SignUp => "Unable to sign up",
        }
    }
}

/// Why a login or signup did not produce a session.
///
/// The display text of every variant is meant for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A required field was empty. No request was sent.
    #[error("{0}")]
    Validation(String),

    /// The server refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The server could not be reached or answered with something unusable.
    #[error("{0}")]
    Transport(String),

    /// The server accepted the request but the session could not be persisted.
    #[error("Unable to save session: {0}")]
    Storage(String),
}

impl AuthError {
    pub(crate) fn transport(action: AuthAction) -> Self {
        AuthError::Transport(action.fallback_message().to_string())
    }
}
