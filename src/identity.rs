//! Read-only view of the signed-in user

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The authenticated user, as far as activity logging is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }
}

/// Source of the current authenticated identity, if any
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Identity>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn current(&self) -> Option<Identity> {
        (**self).current()
    }
}

/// Provider for sessions that never sign in
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current(&self) -> Option<Identity> {
        None
    }
}

/// Session state owned by the auth layer. Clones share the same session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    sender: Arc<watch::Sender<Option<Identity>>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let session = Self::new();
        session.sign_in(identity);
        session
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::debug!(user_id = %identity.id, "Session signed in");
        self.sender.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if self.sender.send_replace(None).is_some() {
            tracing::debug!("Session signed out");
        }
    }

    /// Watch sign-in state changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.sender.subscribe()
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current(&self) -> Option<Identity> {
        self.sender.borrow().clone()
    }
}
