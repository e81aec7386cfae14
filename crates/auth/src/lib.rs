use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use userdesk_config::AuthConfig;
use userdesk_database::{
    CreateSessionRequest, DatabaseError, SessionRepository, User, UserError, UserRepository,
};

#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    sessions: SessionRepository,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user is disabled")]
    UserDisabled,
    #[error("user not found")]
    UserNotFound,
    #[error("database error: {0}")]
    Database(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound => AuthError::UserNotFound,
            other => AuthError::Database(other.to_string()),
        }
    }
}

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX);
        let session_ttl = Duration::try_seconds(ttl_seconds).unwrap_or(Duration::MAX);

        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            session_ttl,
        }
    }

    pub async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some(stored_hash) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, stored_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.enabled {
            return Err(AuthError::UserDisabled);
        }

        self.issue_session(user.id).await
    }

    /// Issue a fresh bearer session for a live, enabled user.
    pub async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let user = self.fetch_active_user(user_id).await?;

        let token = generate_session_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.sessions
            .create(&CreateSessionRequest {
                user_id: user.id,
                token: token.clone(),
                expires_at: expires_at.to_rfc3339(),
            })
            .await?;

        info!(user_id = user.id, "issued session");

        Ok(AuthSession {
            token,
            user_id: user.id,
            expires_at,
        })
    }

    pub async fn authenticate_token(
        &self,
        token: &str,
    ) -> Result<(AuthenticatedUser, AuthSession), AuthError> {
        let Some(stored) = self.sessions.find_by_token(token).await? else {
            return Err(AuthError::SessionNotFound);
        };

        let expires_at = DateTime::parse_from_rfc3339(&stored.expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            self.sessions.delete_by_token(token).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = match self.fetch_active_user(stored.user_id).await {
            Ok(user) => user,
            Err(AuthError::UserNotFound) => return Err(AuthError::InvalidSession),
            Err(err) => return Err(err),
        };

        let session = AuthSession {
            token: stored.token,
            user_id: user.id,
            expires_at,
        };

        Ok((AuthenticatedUser::from(&user), session))
    }

    /// Revoke a session; returns whether it existed.
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.sessions.delete_by_token(token).await?)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let removed = self.sessions.delete_expired().await?;
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        Ok(removed)
    }

    async fn fetch_active_user(&self, user_id: i64) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.enabled {
            return Err(AuthError::UserDisabled);
        }

        Ok(user)
    }
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
