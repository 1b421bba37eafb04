/// JWT Claims structure
///
/// Payload shared by access and refresh tokens, plus the [`Principal`] the
/// authorization gate derives from a verified access token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp); absent on unbounded refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Unique token ID, so two tokens minted in the same second still differ
    pub jti: String,
    pub iss: String,
}

impl Claims {
    /// Create new claims issued at `issued_at`, expiring `ttl` seconds later
    /// when a lifetime is given.
    pub fn new(
        user_id: Uuid,
        email: String,
        issued_at: i64,
        ttl: Option<i64>,
        issuer: String,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email,
            iat: issued_at,
            exp: ttl.map(|ttl| issued_at + ttl),
            jti: Uuid::new_v4().to_string(),
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// A subject that is not a UUID makes the whole token invalid.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// Expired once `now` reaches `exp`; tokens without `exp` never expire.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.map_or(false, |exp| now >= exp)
    }
}

/// Identity attached to a request after access-token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<&Claims> for Principal {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let email = "test@example.com".to_string();
        let claims = Claims::new(user_id, email.clone(), 1_000, Some(1800), "test".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp, Some(2_800));
        assert!(!claims.is_expired_at(2_799));
        assert!(claims.is_expired_at(2_800));
    }

    #[test]
    fn test_claims_without_ttl_never_expire() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.com".into(), 0, None, "test".into());
        assert!(claims.exp.is_none());
        assert!(!claims.is_expired_at(i64::MAX));

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("exp").is_none());
    }

    #[test]
    fn test_each_claim_set_is_unique() {
        let user_id = Uuid::new_v4();
        let a = Claims::new(user_id, "a@b.com".into(), 10, None, "test".into());
        let b = Claims::new(user_id, "a@b.com".into(), 10, None, "test".into());
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_principal_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@b.com".into(), 0, Some(60), "test".into());
        let principal = Principal::try_from(&claims).unwrap();

        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.email, "a@b.com");
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@b.com".into(), 0, Some(60), "test".into());
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_err());
        assert!(Principal::try_from(&claims).is_err());
    }
}
