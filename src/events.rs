//! Auth-change notifications
//!
//! Any component whose output depends on the login state subscribes here and
//! re-derives that state when a notification arrives. Dropping the receiver
//! unsubscribes.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 32;

/// Why the token store changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    /// Tokens stored after login or signup
    LoggedIn,
    /// Access token replaced by a refresh exchange
    Refreshed,
    /// Refresh rejected; tokens cleared
    RefreshFailed,
    /// A request was rejected and could not be recovered; tokens cleared
    Rejected,
    /// Explicit logout or account deletion
    LoggedOut,
    /// Another process changed the persisted store
    External,
}

/// Broadcast side of the auth-change channel
#[derive(Debug, Clone)]
pub struct AuthNotifier {
    tx: broadcast::Sender<AuthChange>,
}

impl Default for AuthNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send to every current subscriber. Having none is not an error.
    pub fn notify(&self, change: AuthChange) {
        debug!(?change, "auth-change");
        let _ = self.tx.send(change);
    }
}
