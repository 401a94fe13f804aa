use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, AuthInterceptor, Navigator};
use crate::config::Config;
use crate::models::{NewUser, Role, UserProfile};

use super::credentials::{Credential, CredentialStore};
use super::error::AuthError;
use super::events::{SessionEvent, SessionEvents, SignOutReason};
use super::policy::{capabilities_of, Capability};
use super::storage::{FileStorage, Storage};

/// Snapshot of who is signed in. Derived from the credential store on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn(Credential),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}

/// Login, signup, logout and "who am I" for every feature.
///
/// The only component besides the interceptor that writes the credential
/// store. A saved credential is trusted at startup without asking the server;
/// the first request it fails on ends the session.
pub struct SessionManager {
    store: Arc<CredentialStore>,
    api: ApiClient,
    events: SessionEvents,
}

impl SessionManager {
    /// Open the session persisted under the configured storage directory.
    pub fn open(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        Self::with_storage(
            FileStorage::new(config.storage_dir()?),
            config.api_base_url(),
            config.request_timeout(),
            navigator,
        )
    }

    /// Open the session persisted in `storage`. The session manager becomes
    /// the only writer of the credential kept there.
    pub fn with_storage(
        storage: impl Storage + 'static,
        api_base_url: &str,
        timeout: Duration,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Self::with_store(
            Arc::new(CredentialStore::new(storage)),
            api_base_url,
            timeout,
            navigator,
        )
    }

    fn with_store(
        store: Arc<CredentialStore>,
        api_base_url: &str,
        timeout: Duration,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let events = SessionEvents::new();
        let interceptor = AuthInterceptor::new(store.clone(), events.clone(), navigator);
        let api = ApiClient::new(api_base_url, timeout, interceptor)?;

        let session = Self { store, api, events };
        match session.current_user() {
            Some(user) => info!(user_id = %user.id, role = %user.role, "Restored saved session"),
            None => debug!("No saved session"),
        }
        Ok(session)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> SessionState {
        match self.store.load() {
            Some(credential) => SessionState::SignedIn(credential),
            None => SessionState::SignedOut,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.state().is_signed_in()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.load().map(|c| c.user)
    }

    pub fn current_role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    /// Capabilities of the signed-in user; empty when signed out.
    pub fn capabilities(&self) -> BTreeSet<Capability> {
        self.current_role()
            .map(|role| capabilities_of(&role))
            .unwrap_or_default()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Observe sign-in and sign-out transitions, including those forced by a 401.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Shared transport for feature requests.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let credential = self.api.login(email, password).await.map_err(|e| {
            info!(error = %e, "Sign in failed");
            e
        })?;
        self.establish(credential)
    }

    pub async fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<UserProfile, AuthError> {
        let user = NewUser::new(full_name.trim(), email.trim(), password, role);
        if user.missing_field().is_some() {
            return Err(AuthError::Validation(
                "Full name, email and password are required".to_string(),
            ));
        }

        let credential = self.api.signup(&user).await.map_err(|e| {
            info!(error = %e, "Sign up failed");
            e
        })?;
        self.establish(credential)
    }

    /// Sign out locally. Never contacts the server and is safe to repeat.
    pub fn logout(&self) -> Result<()> {
        match self.store.take()? {
            Some(credential) => {
                info!(user_id = %credential.user.id, "Signed out");
                self.events.emit(SessionEvent::SignedOut(SignOutReason::Logout));
            }
            None => debug!("Logout while already signed out"),
        }
        Ok(())
    }

    fn establish(&self, credential: Credential) -> Result<UserProfile, AuthError> {
        if let Err(e) = self.store.save(&credential) {
            error!(error = %e, "Failed to persist credential");
            self.drop_previous();
            return Err(AuthError::Storage(e.to_string()));
        }
        let user = credential.user;
        info!(user_id = %user.id, role = %user.role, "Signed in");
        self.events.emit(SessionEvent::SignedIn(user.clone()));
        Ok(user)
    }

    /// A failed sign-in must not leave an earlier identity active.
    fn drop_previous(&self) {
        match self.store.take() {
            Ok(Some(previous)) => {
                warn!(user_id = %previous.user.id, "Dropped previous session after failed sign-in");
                self.events
                    .emit(SessionEvent::SignedOut(SignOutReason::SaveFailed));
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to clear previous credential"),
        }
    }
}
