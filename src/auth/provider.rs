//! Auth collaborator - password sign-in, sign-up and session tokens.
//!
//! [`AuthProvider`] is the seam the client talks to; [`LocalAuthProvider`]
//! implements it over the `users` and `sessions` tables. Passwords are stored
//! as Argon2 hashes and sessions are random tokens with an expiry.

use crate::{
    config::app::SessionConfig,
    entities::{Session, User, session, user},
    errors::{Error, Result},
};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Live sessions kept per user; older ones are pruned on sign-in.
pub const MAX_SESSIONS: usize = 5;

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Profile data collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Display name
    pub full_name: String,
}

/// A signed-in user and the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Opaque session token
    pub token: String,
    /// The signed-in user
    pub user: user::Model,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Id of the signed-in user.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Operations the client needs from an authentication backend.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    /// Exchanges credentials for a new session.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCredentials`] for an unknown email or a wrong password.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Registers a new account. Does not sign the user in.
    ///
    /// # Errors
    /// Returns [`Error::EmailTaken`] if the email already has an account.
    async fn sign_up(&self, email: &str, password: &str, profile: Profile) -> Result<user::Model>;

    /// Revokes a session token. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<()>;

    /// Looks a stored token up; `None` if it is unknown or expired.
    async fn resume(&self, token: &str) -> Result<Option<AuthSession>>;
}

/// Lower-cases and trims an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String> {
    let hash_error = |e: argon2::password_hash::Error| Error::PasswordHash {
        message: e.to_string(),
    };
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(hash_error)?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(hash_error)
}

fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`AuthProvider`] backed by the application database.
#[derive(Debug, Clone)]
pub struct LocalAuthProvider {
    db: DatabaseConnection,
    ttl: Duration,
    max_sessions: usize,
}

impl LocalAuthProvider {
    /// Creates a provider issuing tokens that live `config.ttl_minutes`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &SessionConfig) -> Self {
        Self {
            db,
            ttl: Duration::minutes(config.ttl_minutes),
            max_sessions: MAX_SESSIONS,
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Removes the user's expired sessions and all but the newest `max_sessions`.
    async fn prune_sessions(&self, user_id: i64, now: DateTime<Utc>) -> Result<()> {
        let sessions = Session::find()
            .filter(session::Column::UserId.eq(user_id))
            .order_by_desc(session::Column::CreatedAt)
            .order_by_desc(session::Column::Id)
            .all(&self.db)
            .await?;

        let stale: Vec<i64> = sessions
            .iter()
            .enumerate()
            .filter(|(i, s)| *i >= self.max_sessions || s.expires_at <= now)
            .map(|(_, s)| s.id)
            .collect();

        if stale.is_empty() {
            return Ok(());
        }
        let result = Session::delete_many()
            .filter(session::Column::Id.is_in(stale))
            .exec(&self.db)
            .await?;
        debug!("Pruned {} session(s) for user {user_id}", result.rows_affected);
        Ok(())
    }
}

impl AuthProvider for LocalAuthProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let Some(user) = self.find_user_by_email(&email).await? else {
            warn!("Sign-in attempt for unknown email");
            return Err(Error::InvalidCredentials);
        };
        if !verify_password(&user.password_hash, password) {
            warn!("Wrong password for user {}", user.id);
            return Err(Error::InvalidCredentials);
        }

        let now = Utc::now();
        let created = session::ActiveModel {
            user_id: Set(user.id),
            token: Set(Uuid::new_v4().simple().to_string()),
            created_at: Set(now),
            expires_at: Set(now + self.ttl),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        self.prune_sessions(user.id, now).await?;

        info!("User {} signed in", user.id);
        Ok(AuthSession {
            token: created.token,
            user,
            expires_at: created.expires_at,
        })
    }

    async fn sign_up(&self, email: &str, password: &str, profile: Profile) -> Result<user::Model> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation {
                field: "email",
                reason: "enter a valid email".to_string(),
            });
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation {
                field: "password",
                reason: format!("password must have at least {MIN_PASSWORD_LEN} characters"),
            });
        }
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(Error::EmailTaken { email });
        }

        let created = user::ActiveModel {
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            full_name: Set(profile.full_name.trim().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Registered user {}", created.id);
        Ok(created)
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let result = Session::delete_many()
            .filter(session::Column::Token.eq(token))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            info!("Session revoked");
        }
        Ok(())
    }

    async fn resume(&self, token: &str) -> Result<Option<AuthSession>> {
        let found = Session::find()
            .find_also_related(User)
            .filter(session::Column::Token.eq(token))
            .one(&self.db)
            .await?;

        let Some((stored, Some(user))) = found else {
            debug!("No session for stored token");
            return Ok(None);
        };
        if stored.expires_at <= Utc::now() {
            Session::delete_by_id(stored.id).exec(&self.db).await?;
            info!("Stored session for user {} has expired", user.id);
            return Ok(None);
        }

        Ok(Some(AuthSession {
            token: stored.token,
            user,
            expires_at: stored.expires_at,
        }))
    }
}
