use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::types::{AuthError, Claims, TOKEN_TTL_SECONDS, TokenSubject};

/// Signing secret used when `JWT_SECRET` is unset outside production.
/// Anyone who knows this string can mint admin tokens.
pub const INSECURE_DEFAULT_SECRET: &str = "change-this-secret-key";

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a service signing with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Resolves the signing secret. In production a missing secret is an error;
    /// elsewhere the insecure default is used and a warning is logged.
    pub fn from_secret(secret: Option<String>, production: bool) -> Result<Self, AuthError> {
        match secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => Ok(Self::new(&secret)),
            None if production => Err(AuthError::MissingSecret),
            None => {
                log::warn!("⚠️ JWT_SECRET is not set, signing tokens with the insecure default");
                Ok(Self::new(INSECURE_DEFAULT_SECRET))
            }
        }
    }

    /// Issues a token for `subject`, valid for 24 hours from now.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        issue_token(subject, &self.encoding_key, Utc::now().timestamp())
    }

    /// Verifies `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        verify_token(token, &self.decoding_key, Utc::now().timestamp())
    }

    /// Verifies `token` as if the current time were `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        verify_token(token, &self.decoding_key, now)
    }

    /// Issues a token as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, subject: &TokenSubject, now: i64) -> Result<String, AuthError> {
        issue_token(subject, &self.encoding_key, now)
    }
}

fn issue_token(subject: &TokenSubject, key: &EncodingKey, now: i64) -> Result<String, AuthError> {
    let claims = Claims {
        id: subject.id,
        email: subject.email.clone(),
        name: subject.name.clone(),
        is_admin: subject.is_admin,
        iat: now,
        exp: now + TOKEN_TTL_SECONDS,
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, key)?;
    Ok(token)
}

/// Pure verification: signature and payload are checked by `jsonwebtoken`,
/// expiry against the supplied `now`. Every failure collapses to `InvalidToken`.
fn verify_token(token: &str, key: &DecodingKey, now: i64) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, key, &validation)
        .map_err(|_| AuthError::InvalidToken)?
        .claims;

    if claims.exp <= now {
        return Err(AuthError::InvalidToken);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn admin() -> TokenSubject {
        TokenSubject {
            id: 7,
            email: "admin@yatra.com".to_string(),
            name: "admin".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn test_issue_then_verify_carries_claims() {
        let service = JwtService::new("test-secret");
        let token = service.issue_at(&admin(), NOW).unwrap();
        let claims = service.verify_at(&token, NOW + 60).unwrap();

        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "admin@yatra.com");
        assert!(claims.is_admin);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + TOKEN_TTL_SECONDS);
    }

    #[test]
    fn test_token_valid_for_exactly_24_hours() {
        let service = JwtService::new("test-secret");
        let token = service.issue_at(&admin(), NOW).unwrap();

        assert!(service.verify_at(&token, NOW + TOKEN_TTL_SECONDS - 1).is_ok());
        assert!(matches!(
            service.verify_at(&token, NOW + TOKEN_TTL_SECONDS),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtService::new("one").issue_at(&admin(), NOW).unwrap();
        assert!(matches!(
            JwtService::new("two").verify_at(&token, NOW),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let service = JwtService::new("test-secret");
        assert!(matches!(
            service.verify_at("not.a.token", NOW),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.verify_at("", NOW),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_secret_resolution() {
        assert!(matches!(
            JwtService::from_secret(None, true),
            Err(AuthError::MissingSecret)
        ));
        assert!(matches!(
            JwtService::from_secret(Some("  ".to_string()), true),
            Err(AuthError::MissingSecret)
        ));

        let fallback = JwtService::from_secret(None, false).unwrap();
        let token = fallback.issue_at(&admin(), NOW).unwrap();
        assert!(
            JwtService::new(INSECURE_DEFAULT_SECRET)
                .verify_at(&token, NOW)
                .is_ok()
        );
    }
}
