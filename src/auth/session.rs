//! Process-wide session state.
//!
//! [`SessionStore`] holds the current authentication state and publishes every
//! change through a `tokio::sync::watch` channel. The lifecycle is
//! `Uninitialized -> Loading -> Authenticated | Anonymous`. Only sign-in,
//! sign-out, the initial restore and the expiry listener write to it; views
//! subscribe and wait until the state is resolved before rendering.

use super::provider::{AuthProvider, AuthSession};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

/// Shortest period the expiry listener checks at.
pub const MIN_EXPIRY_CHECK: Duration = Duration::from_secs(1);

/// Authentication state of the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been checked yet
    #[default]
    Uninitialized,
    /// A stored session is being restored
    Loading,
    /// A user is signed in
    Authenticated(AuthSession),
    /// Nobody is signed in
    Anonymous,
}

impl SessionState {
    /// Whether protected views may stop waiting.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Authenticated(_) | Self::Anonymous)
    }

    /// The signed-in session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Observable holder of the [`SessionState`].
#[derive(Debug)]
pub struct SessionStore {
    state: watch::Sender<SessionState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self { state }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn set(&self, next: SessionState) {
        let label = match &next {
            SessionState::Uninitialized => "uninitialized".to_string(),
            SessionState::Loading => "loading".to_string(),
            SessionState::Authenticated(s) => format!("authenticated (user {})", s.user_id()),
            SessionState::Anonymous => "anonymous".to_string(),
        };
        self.state.send_replace(next);
        info!("Session state -> {label}");
    }

    /// Resolves the initial state from a stored token, if there is one.
    ///
    /// On any failure the store ends up `Anonymous` and the error is returned.
    pub async fn restore<P: AuthProvider>(&self, provider: &P, token: Option<&str>) -> Result<()> {
        self.set(SessionState::Loading);

        let resumed = match token {
            Some(token) => provider.resume(token).await,
            None => Ok(None),
        };

        match resumed {
            Ok(Some(session)) => {
                self.set(SessionState::Authenticated(session));
                Ok(())
            }
            Ok(None) => {
                self.set(SessionState::Anonymous);
                Ok(())
            }
            Err(e) => {
                warn!("Could not restore session: {e}");
                self.set(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Signs in and publishes the new session. A failed attempt leaves the state unchanged.
    pub async fn sign_in<P: AuthProvider>(
        &self,
        provider: &P,
        email: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let session = provider.sign_in_with_password(email, password).await?;
        self.set(SessionState::Authenticated(session.clone()));
        Ok(session)
    }

    /// Revokes the current session and becomes `Anonymous`.
    ///
    /// The local state is cleared even if revoking the token fails.
    pub async fn sign_out<P: AuthProvider>(&self, provider: &P) -> Result<()> {
        let revoked = match self.current() {
            SessionState::Authenticated(session) => provider.sign_out(&session.token).await,
            _ => Ok(()),
        };
        self.set(SessionState::Anonymous);
        revoked
    }

    /// Waits until the state is `Authenticated` or `Anonymous` and returns it.
    pub async fn wait_until_resolved(&self) -> SessionState {
        let mut receiver = self.subscribe();
        let resolved = match receiver.wait_for(SessionState::is_resolved).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here
            Err(_) => self.current(),
        };
        resolved
    }

    /// The signed-in session.
    ///
    /// A session found past its expiry is dropped on the spot, without waiting
    /// for the listener.
    ///
    /// # Errors
    /// Returns [`Error::NotAuthenticated`] unless the state is `Authenticated`,
    /// or [`Error::SessionExpired`] if the session has just expired.
    pub fn require_user(&self) -> Result<AuthSession> {
        let session = self
            .state
            .borrow()
            .session()
            .cloned()
            .ok_or(Error::NotAuthenticated)?;
        if self.expire_if_due(Utc::now()) {
            return Err(Error::SessionExpired);
        }
        Ok(session)
    }

    /// Drops the session if it has expired at `now`. Returns whether it did.
    pub fn expire_if_due(&self, now: DateTime<Utc>) -> bool {
        let expired = self.state.send_if_modified(|state| match state {
            SessionState::Authenticated(session) if session.is_expired_at(now) => {
                *state = SessionState::Anonymous;
                true
            }
            _ => false,
        });
        if expired {
            info!("Session expired, state -> anonymous");
        }
        expired
    }

    /// Checks for expiry every `period` until the store is dropped.
    ///
    /// A zero period is raised to [`MIN_EXPIRY_CHECK`].
    pub fn spawn_expiry_listener(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = if period.is_zero() {
            warn!("Expiry check period of zero, using {MIN_EXPIRY_CHECK:?}");
            MIN_EXPIRY_CHECK
        } else {
            period
        };
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(live) = store.upgrade() else {
                    debug!("Session store dropped, stopping expiry listener");
                    break;
                };
                live.expire_if_due(Utc::now());
            }
        })
    }
}
