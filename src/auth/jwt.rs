/// JWT Token Codec
///
/// Issues and verifies HS256 tokens in two independent signing domains.
/// Access tokens always expire; refresh tokens expire only if a refresh
/// lifetime is configured, and are otherwise bounded by rotation alone.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::clock::Clock;
use crate::configuration::JwtSettings;
use crate::error::TokenError;

/// Signing domain of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenCodec {
    access_secret: String,
    refresh_secret: String,
    access_ttl: i64,
    refresh_ttl: Option<i64>,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
            clock,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl(&self) -> i64 {
        self.access_ttl
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    /// Issue a token under the domain's configured lifetime
    ///
    /// # Errors
    /// `TokenError::Signing` if the domain has no key or encoding fails
    pub fn issue(&self, kind: TokenKind, user_id: &Uuid, email: &str) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => Some(self.access_ttl),
            TokenKind::Refresh => self.refresh_ttl,
        };
        self.issue_with_ttl(kind, user_id, email, ttl)
    }

    /// Issue a token with an explicit lifetime
    ///
    /// Access tokens ignore a missing `ttl` and fall back to the configured
    /// access lifetime.
    pub fn issue_with_ttl(
        &self,
        kind: TokenKind,
        user_id: &Uuid,
        email: &str,
        ttl: Option<i64>,
    ) -> Result<String, TokenError> {
        let secret = self.secret(kind);
        if secret.is_empty() {
            return Err(TokenError::Signing(format!("no signing key for {:?} tokens", kind)));
        }

        let ttl = match kind {
            TokenKind::Access => ttl.or(Some(self.access_ttl)),
            TokenKind::Refresh => ttl,
        };
        let claims = Claims::new(
            *user_id,
            email.to_string(),
            self.clock.now(),
            ttl,
            self.issuer.clone(),
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, issuer and, if present, expiry
    ///
    /// Expiry is checked against the injected clock rather than by
    /// `jsonwebtoken`, so it is reported as `TokenError::Expired` and never
    /// folded into `Malformed`.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(kind = ?kind, "JWT validation error: {}", e);
            TokenError::Malformed(e.to_string())
        })?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: None,
            issuer: "test".to_string(),
        }
    }

    fn codec_at(now: i64) -> (TokenCodec, ManualClock) {
        let clock = ManualClock::new(now);
        (TokenCodec::new(&get_test_config(), Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_generate_and_validate_token() {
        let (codec, _) = codec_at(1_700_000_000);
        let user_id = Uuid::new_v4();
        let email = "test@example.com";

        let token = codec.issue(TokenKind::Access, &user_id, email).expect("Failed to generate token");
        let claims = codec.verify(TokenKind::Access, &token).expect("Failed to validate token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, Some(1_700_001_800));
    }

    #[test]
    fn test_refresh_tokens_carry_no_expiry_by_default() {
        let (codec, clock) = codec_at(1_700_000_000);
        let token = codec
            .issue(TokenKind::Refresh, &Uuid::new_v4(), "test@example.com")
            .unwrap();

        clock.advance(10 * 365 * 24 * 3600);
        let claims = codec.verify(TokenKind::Refresh, &token).unwrap();
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_configured_refresh_expiry_is_embedded() {
        let mut config = get_test_config();
        config.refresh_token_expiry = Some(60);
        let clock = ManualClock::new(0);
        let codec = TokenCodec::new(&config, Arc::new(clock.clone()));

        let token = codec.issue(TokenKind::Refresh, &Uuid::new_v4(), "a@b.com").unwrap();
        clock.advance(61);
        assert_eq!(codec.verify(TokenKind::Refresh, &token), Err(TokenError::Expired));
    }

    #[test]
    fn test_access_token_expires_after_ttl() {
        let (codec, clock) = codec_at(1_700_000_000);
        let token = codec.issue(TokenKind::Access, &Uuid::new_v4(), "a@b.com").unwrap();

        clock.advance(1799);
        assert!(codec.verify(TokenKind::Access, &token).is_ok());

        clock.advance(1);
        assert_eq!(codec.verify(TokenKind::Access, &token), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_lifetime_is_expired_not_malformed() {
        let (codec, _) = codec_at(1_700_000_000);
        let token = codec
            .issue_with_ttl(TokenKind::Access, &Uuid::new_v4(), "a@b.com", Some(0))
            .unwrap();

        assert_eq!(codec.verify(TokenKind::Access, &token), Err(TokenError::Expired));
    }

    #[test]
    fn test_access_token_always_expires() {
        let (codec, _) = codec_at(100);
        let token = codec
            .issue_with_ttl(TokenKind::Access, &Uuid::new_v4(), "a@b.com", None)
            .unwrap();
        let claims = codec.verify(TokenKind::Access, &token).unwrap();
        assert_eq!(claims.exp, Some(1_900));
    }

    #[test]
    fn test_cross_domain_rejection() {
        let (codec, _) = codec_at(1_700_000_000);
        let user_id = Uuid::new_v4();

        let access = codec.issue(TokenKind::Access, &user_id, "a@b.com").unwrap();
        let refresh = codec.issue(TokenKind::Refresh, &user_id, "a@b.com").unwrap();

        assert!(matches!(
            codec.verify(TokenKind::Refresh, &access),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            codec.verify(TokenKind::Access, &refresh),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let (codec, _) = codec_at(0);
        let result = codec.verify(TokenKind::Access, "invalid.token.here");

        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_tampered_token() {
        let (codec, _) = codec_at(1_700_000_000);
        let token = codec
            .issue(TokenKind::Access, &Uuid::new_v4(), "test@example.com")
            .expect("Failed to generate token");

        let tampered = format!("{}X", token);
        assert!(matches!(
            codec.verify(TokenKind::Access, &tampered),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000));
        let mut config = get_test_config();
        let issuing = TokenCodec::new(&config, clock.clone());
        let token = issuing
            .issue(TokenKind::Access, &Uuid::new_v4(), "test@example.com")
            .expect("Failed to generate token");

        config.issuer = "wrong-issuer".to_string();
        let verifying = TokenCodec::new(&config, clock);

        assert!(verifying.verify(TokenKind::Access, &token).is_err());
    }

    #[test]
    fn test_missing_key_is_a_signing_error() {
        let mut config = get_test_config();
        config.refresh_secret.clear();
        let codec = TokenCodec::new(&config, Arc::new(ManualClock::new(0)));

        assert!(matches!(
            codec.issue(TokenKind::Refresh, &Uuid::new_v4(), "a@b.com"),
            Err(TokenError::Signing(_))
        ));
        assert!(codec.issue(TokenKind::Access, &Uuid::new_v4(), "a@b.com").is_ok());
    }
}
