use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{auth::repo::User, error::ApiError, state::AuthState};

/// JWT payload. Verification is stateless: the claims carry everything the
/// caller gets back, and a user deleted after issuance stays "valid" until
/// expiry. Revocation before expiry is not supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

/// Holds the JWT signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl_hours: i64,
}

impl FromRef<AuthState> for JwtKeys {
    fn from_ref(state: &AuthState) -> Self {
        let secret = state.config.jwt.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_hours: state.config.jwt.ttl_hours,
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::hours(self.ttl_hours);
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts and validates the bearer token, yielding the embedded claims.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Auth("No token provided".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("No token provided".into()))?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(_) => {
                warn!("invalid or expired token");
                Err(ApiError::Auth("Invalid or expired token".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours: 24,
        }
    }

    fn make_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: 42,
            name: "Al".into(),
            email: "a@b.com".into(),
            password_hash: "irrelevant".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let user = make_user();
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.name, "Al");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_valid_within_lifetime_rejected_after() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();

        // 23 hours of a 24-hour lifetime left.
        let live = Claims {
            user_id: 1,
            email: "a@b.com".into(),
            name: "Al".into(),
            iat: (now - 3600) as usize,
            exp: (now + 23 * 3600) as usize,
        };
        let token = encode(&Header::default(), &live, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_ok());

        // Issued 25 hours ago, expired an hour ago.
        let stale = Claims {
            exp: (now - 3600) as usize,
            iat: (now - 25 * 3600) as usize,
            ..live
        };
        let token = encode(&Header::default(), &stale, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let token = make_keys("secret-one").sign(&make_user()).expect("sign");
        assert!(make_keys("secret-two").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(make_keys("dev-secret").verify("not.a.token").is_err());
    }
}
