use tokio::sync::broadcast;
use tracing::debug;

use crate::models::UserProfile;

/// Events buffered per subscriber before the slowest one starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session transition broadcast to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserProfile),
    SignedOut(SignOutReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user signed out.
    Logout,
    /// The server rejected the stored credential.
    Unauthorized,
    /// A new sign-in could not be persisted, so the previous session was dropped.
    SaveFailed,
}

/// Fan-out of session transitions. Clones share one channel.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("No session observers subscribed");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
