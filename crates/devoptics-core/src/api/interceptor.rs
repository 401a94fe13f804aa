//! Request decoration and uniform handling of authorization failures.
//!
//! Every authenticated request goes through [`AuthInterceptor`]: on the way
//! out it picks up whatever credential is stored at that moment, and on the
//! way back a 401 ends the session for everyone. The caller still gets the
//! error; the interceptor only adds the side effects.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, error, info, warn};

use crate::auth::{CredentialStore, SessionEvent, SessionEvents, SignOutReason};

/// Routes the user to the sign-in entry point.
pub trait Navigator: Send + Sync {
    fn to_sign_in(&self);
}

/// Navigator for hosts without a sign-in screen; only logs.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn to_sign_in(&self) {
        info!("Sign-in required");
    }
}

#[derive(Clone)]
pub struct AuthInterceptor {
    store: Arc<CredentialStore>,
    events: SessionEvents,
    navigator: Arc<dyn Navigator>,
}

impl AuthInterceptor {
    pub fn new(store: Arc<CredentialStore>, events: SessionEvents, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            events,
            navigator,
        }
    }

    /// Attach the stored bearer token, if any.
    ///
    /// Returns the token that was attached so the response can be matched
    /// against the credential it was sent with.
    pub fn decorate(&self, request: RequestBuilder) -> (RequestBuilder, Option<String>) {
        match self.store.load() {
            Some(credential) => {
                let request = request.bearer_auth(&credential.token);
                (request, Some(credential.token))
            }
            None => (request, None),
        }
    }

    /// React to the status of a response to a decorated request.
    pub fn inspect(&self, status: StatusCode, sent_token: Option<&str>) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }
        match sent_token {
            Some(token) => self.handle_unauthorized(token),
            None => debug!("401 on a request sent without a credential"),
        }
    }

    /// Clear the store, tell observers, then send the user to sign in.
    ///
    /// Only the caller that actually removes the credential runs the last two
    /// steps; concurrent 401s for the same token are no-ops after the first.
    fn handle_unauthorized(&self, token: &str) {
        match self.store.clear_if_token(token) {
            Ok(true) => {
                warn!("Server rejected the stored credential, signing out");
                self.events
                    .emit(SessionEvent::SignedOut(SignOutReason::Unauthorized));
                self.navigator.to_sign_in();
            }
            Ok(false) => debug!("Rejected credential already cleared or replaced"),
            Err(e) => error!(error = %e, "Failed to clear rejected credential"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::Credential;
    use crate::models::{Role, UserProfile};

    #[derive(Default)]
    pub(crate) struct CountingNavigator {
        visits: AtomicUsize,
    }

    impl CountingNavigator {
        pub(crate) fn visits(&self) -> usize {
            self.visits.load(Ordering::SeqCst)
        }
    }

    impl Navigator for CountingNavigator {
        fn to_sign_in(&self) {
            self.visits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn credential(token: &str) -> Credential {
        Credential {
            token: token.to_string(),
            user: UserProfile {
                id: "u1".to_string(),
                full_name: "Ann".to_string(),
                email: "a@b.com".to_string(),
                role: Role::Manager,
            },
        }
    }

    fn interceptor() -> (AuthInterceptor, Arc<CredentialStore>, Arc<CountingNavigator>, SessionEvents) {
        let store = Arc::new(CredentialStore::in_memory());
        let navigator = Arc::new(CountingNavigator::default());
        let events = SessionEvents::new();
        let interceptor = AuthInterceptor::new(store.clone(), events.clone(), navigator.clone());
        (interceptor, store, navigator, events)
    }

    #[test]
    fn test_decorate_attaches_bearer_token() {
        let (interceptor, store, _, _) = interceptor();
        store.save(&credential("t1")).expect("save succeeds");

        let client = reqwest::Client::new();
        let (request, sent) = interceptor.decorate(client.get("http://localhost/ping"));
        let request = request.build().expect("request builds");

        assert_eq!(sent.as_deref(), Some("t1"));
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer t1")
        );
    }

    #[test]
    fn test_decorate_without_credential_leaves_request_alone() {
        let (interceptor, _, _, _) = interceptor();
        let client = reqwest::Client::new();
        let (request, sent) = interceptor.decorate(client.get("http://localhost/ping"));
        let request = request.build().expect("request builds");

        assert_eq!(sent, None);
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_unauthorized_clears_and_navigates_once() {
        let (interceptor, store, navigator, events) = interceptor();
        let mut rx = events.subscribe();
        store.save(&credential("t1")).expect("save succeeds");

        interceptor.inspect(StatusCode::UNAUTHORIZED, Some("t1"));
        interceptor.inspect(StatusCode::UNAUTHORIZED, Some("t1"));

        assert_eq!(store.load(), None);
        assert_eq!(navigator.visits(), 1);
        assert_eq!(
            rx.try_recv().expect("one sign-out event"),
            SessionEvent::SignedOut(SignOutReason::Unauthorized)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stale_rejection_keeps_newer_credential() {
        let (interceptor, store, navigator, _) = interceptor();
        store.save(&credential("new")).expect("save succeeds");

        interceptor.inspect(StatusCode::UNAUTHORIZED, Some("old"));

        assert_eq!(store.load().map(|c| c.token), Some("new".to_string()));
        assert_eq!(navigator.visits(), 0);
    }

    #[test]
    fn test_other_statuses_are_ignored() {
        let (interceptor, store, navigator, _) = interceptor();
        store.save(&credential("t1")).expect("save succeeds");

        interceptor.inspect(StatusCode::FORBIDDEN, Some("t1"));
        interceptor.inspect(StatusCode::INTERNAL_SERVER_ERROR, Some("t1"));
        interceptor.inspect(StatusCode::UNAUTHORIZED, None);

        assert!(store.load().is_some());
        assert_eq!(navigator.visits(), 0);
    }
}
