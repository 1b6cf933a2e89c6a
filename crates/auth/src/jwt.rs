use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed or unverifiable token")]
    Malformed,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// HS256 shared-secret validator.
///
/// Time-window checks run through [`validate_claims`] rather than the
/// library's numeric `exp` handling, since claims carry RFC 3339 timestamps.
pub struct Hs256JwtValidator {
    decoding: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Malformed)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use stocktrail_core::UserId;

    use super::*;

    fn mint(secret: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = JwtClaims {
            sub: UserId::new(),
            username: "alice".to_string(),
            issued_at,
            expires_at,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_a_fresh_token() {
        let now = Utc::now();
        let token = mint("secret", now, now + Duration::minutes(10));
        let claims = Hs256JwtValidator::new("secret")
            .validate(&token, now)
            .unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let now = Utc::now();
        let token = mint("secret", now, now + Duration::minutes(10));

        let wrong = Hs256JwtValidator::new("other").validate(&token, now);
        assert_eq!(wrong, Err(TokenError::Malformed));

        let stale = mint("secret", now - Duration::hours(2), now - Duration::hours(1));
        let expired = Hs256JwtValidator::new("secret").validate(&stale, now);
        assert_eq!(
            expired,
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }
}
