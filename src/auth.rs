//! Admin sessions: a plaintext password check that yields a signed token,
//! and an extractor that verifies the token on every admin request.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::db::models::ShopSettings;
use crate::error::AppError;

const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Without a configured secret, tokens only survive until restart.
    pub fn from_secret(secret: Option<&str>, ttl: Duration) -> Self {
        match secret {
            Some(secret) => Self::new(secret.as_bytes(), ttl),
            None => {
                warn!("SESSION_SECRET not set; admin sessions end when the server restarts");
                let generated = format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
                Self::new(generated.as_bytes(), ttl)
            }
        }
    }

    pub fn issue(&self) -> Result<IssuedToken, AppError> {
        self.issue_at(Utc::now())
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let ttl = ChronoDuration::from_std(self.ttl)
            .map_err(|e| AppError::Configuration(format!("session TTL out of range: {e}")))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Configuration("session TTL out of range".into()))?;
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Configuration(format!("failed to sign session token: {e}")))?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.sub = Some(ADMIN_SUBJECT.to_string());
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected admin token");
                AppError::Unauthorized
            })
    }
}

/// Plain comparison against the stored admin password. No password set means
/// nobody can log in.
pub fn password_matches(settings: &ShopSettings, candidate: &str) -> bool {
    settings
        .admin_password
        .as_deref()
        .is_some_and(|stored| stored == candidate)
}

/// Proof that the request carried a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;
        let claims = state.sessions.verify(token.trim())?;
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new(b"test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let now = Utc::now();
        let issued = keys.issue_at(now).unwrap();
        let claims = keys.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let issued = keys
            .issue_at(Utc::now() - ChronoDuration::hours(3))
            .unwrap();
        assert!(matches!(keys.verify(&issued.token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = SessionKeys::new(b"other-secret", Duration::from_secs(3600));
        let issued = other.issue().unwrap();
        assert!(matches!(keys().verify(&issued.token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn oversized_ttl_is_a_configuration_error() {
        let keys = SessionKeys::new(b"test-secret", Duration::from_secs(10_000_000_000_000));
        assert!(matches!(keys.issue(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(keys().verify("not-a-jwt"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn password_check_requires_a_stored_password() {
        let mut settings = ShopSettings::default();
        assert!(!password_matches(&settings, ""));
        settings.admin_password = Some("gym-admin".into());
        assert!(password_matches(&settings, "gym-admin"));
        assert!(!password_matches(&settings, "gym-admin "));
    }
}
