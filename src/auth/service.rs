/// Authentication Service
///
/// Sign-up, login, refresh-token rotation, logout and the account status
/// field. Per account the session moves Anonymous -> Authenticated(R1) ->
/// Authenticated(R2) -> ... -> LoggedOut, where each `Rn` is the only
/// refresh token that can be redeemed at that point.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::session::SessionStore;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::store::{NewUser, UserStore};
use crate::validators::{collect, is_valid_email, is_valid_name, is_valid_password, is_valid_status};

/// Freshly minted credentials for one account
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct AuthService {
    sessions: SessionStore,
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, codec: TokenCodec, bcrypt_cost: u32) -> Self {
        Self {
            sessions: SessionStore::new(users.clone()),
            users,
            codec,
            bcrypt_cost,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create an account; no session is established.
    ///
    /// # Errors
    /// - `Validation` listing every violated field
    /// - `Conflict` if the email is already registered
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Uuid, AppError> {
        let password = password.trim();
        let mut errors = Vec::new();
        let name = collect(&mut errors, Some(name), is_valid_name);
        let email = collect(&mut errors, Some(email), is_valid_email);
        collect(&mut errors, Some(password), is_valid_password);

        let (name, email) = match (name, email) {
            (Some(name), Some(email)) if errors.is_empty() => (name, email),
            _ => return Err(AppError::Validation(errors)),
        };

        if self.sessions.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email address already exists!".to_string()));
        }

        let password_hash = hash_password_blocking(password.to_string(), self.bcrypt_cost).await?;
        let record = self
            .users
            .insert_user(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent sign-up for the same email
                DatabaseError::UniqueConstraintViolation(_) => {
                    AppError::Conflict("Email address already exists!".to_string())
                }
                other => AppError::Database(other),
            })?;

        tracing::info!(user_id = %record.id, "User created");
        Ok(record.id)
    }

    /// Verify credentials and start a new session, replacing any earlier one
    ///
    /// # Errors
    /// - `Auth(UnknownEmail)` / `Auth(WrongPassword)`: both 401, with separate messages
    pub async fn log_in(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let password = password.trim();
        let mut errors = Vec::new();
        let email = collect(&mut errors, Some(email), is_valid_email);
        if password.is_empty() {
            errors.push(ValidationError::EmptyField("password"));
        }
        let email = match email {
            Some(email) if errors.is_empty() => email,
            _ => return Err(AppError::Validation(errors)),
        };

        let record = match self.sessions.get_by_email(&email).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Login attempt for unknown email");
                return Err(AuthError::UnknownEmail.into());
            }
        };

        let matches =
            verify_password_blocking(password.to_string(), record.password_hash.clone()).await?;
        if !matches {
            tracing::warn!(user_id = %record.id, "Login attempt with wrong password");
            return Err(AuthError::WrongPassword.into());
        }

        let pair = self.issue_pair(record.id, &record.email)?;
        if !self
            .sessions
            .set_refresh_token(record.id, Some(&pair.refresh_token))
            .await?
        {
            return Err(AuthError::UnknownUser.into());
        }

        tracing::info!(user_id = %record.id, "User logged in");
        Ok(pair)
    }

    /// Redeem a refresh token for a new pair, invalidating the old token
    ///
    /// # Errors
    /// - `BadRequest` if no token was supplied
    /// - `Auth(TokenInvalid | TokenExpired)` if the token does not verify
    /// - `Auth(UnknownUser)` if its subject has no record
    /// - `Auth(RefreshTokenMismatch)` if it is not the stored token, or a
    ///   concurrent refresh rotated it first
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AppError> {
        let presented = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("Bad Request! refreshToken is required".to_string()))?;

        let claims = self.codec.verify(TokenKind::Refresh, presented)?;
        let user_id = claims.user_id()?;

        let record = self
            .sessions
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::Auth(AuthError::UnknownUser))?;

        if !SessionStore::is_current(&record, presented) {
            tracing::warn!(user_id = %user_id, "Stale or reused refresh token presented");
            return Err(AuthError::RefreshTokenMismatch.into());
        }

        let pair = self.issue_pair(record.id, &record.email)?;
        if !self
            .sessions
            .rotate_refresh_token(record.id, presented, &pair.refresh_token)
            .await?
        {
            return Err(AuthError::RefreshTokenMismatch.into());
        }

        tracing::info!(user_id = %user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// End the account's session; only a fresh login starts a new one.
    pub async fn log_out(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.sessions.set_refresh_token(user_id, None).await? {
            return Err(AuthError::UnknownUser.into());
        }
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    pub async fn get_status(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sessions
            .get_by_id(user_id)
            .await?
            .map(|record| record.status)
            .ok_or_else(|| AppError::NotFound("User not found!".to_string()))
    }

    pub async fn update_status(&self, user_id: Uuid, status: &str) -> Result<(), AppError> {
        let status = is_valid_status(status)?;
        if !self.users.set_status(user_id, &status).await? {
            return Err(AppError::NotFound("User not found!".to_string()));
        }
        Ok(())
    }

    fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.codec.issue(TokenKind::Access, &user_id, email)?,
            refresh_token: self.codec.issue(TokenKind::Refresh, &user_id, email)?,
            expires_in: self.codec.access_ttl(),
            user_id,
        })
    }
}
