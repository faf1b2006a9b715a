//! Shared application state handed to every view and command.

use crate::{
    auth::{AuthSession, LocalAuthProvider, SessionState, SessionStore},
    config::AppConfig,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::warn;

/// Everything views and commands need: the backend connection, configuration,
/// the auth collaborator and the session state.
///
/// The session must be restored (see [`SessionStore::restore`]) or signed in
/// before any view is refreshed; until then protected calls fail with
/// [`Error::NotAuthenticated`].
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Database connection for all backend operations
    pub database: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Auth collaborator
    pub auth: LocalAuthProvider,
    /// Current session state
    pub session: Arc<SessionStore>,
}

impl AppContext {
    /// Creates a context with a fresh, uninitialized session store.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        let auth = LocalAuthProvider::new(database.clone(), &config.session);
        Self {
            database,
            config: Arc::new(config),
            auth,
            session: Arc::new(SessionStore::new()),
        }
    }

    /// Waits for the session to resolve and returns the signed-in session.
    ///
    /// Protected views call this before fetching anything. A restore in
    /// progress is waited for; a store nobody has restored yet is not.
    ///
    /// # Errors
    /// Returns [`Error::NotAuthenticated`] when nobody is signed in or the
    /// session was never restored.
    pub async fn require_session(&self) -> Result<AuthSession> {
        if self.session.current() == SessionState::Uninitialized {
            warn!("Session requested before it was restored");
            return Err(Error::NotAuthenticated);
        }
        self.session.wait_until_resolved().await;
        self.session.require_user()
    }

    /// Currency symbol used in formatted amounts.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.config.report.currency_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use std::time::Duration;

    #[tokio::test]
    async fn test_require_session_before_restore_fails_fast() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = AppContext::new(db, AppConfig::default());

        let result = tokio::time::timeout(Duration::from_secs(1), ctx.require_session()).await;
        assert!(matches!(result, Ok(Err(Error::NotAuthenticated))));

        ctx.session.restore(&ctx.auth, None).await?;
        assert!(matches!(ctx.require_session().await, Err(Error::NotAuthenticated)));
        Ok(())
    }
}
