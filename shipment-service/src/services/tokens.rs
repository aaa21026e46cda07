use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::{Role, User};
use crate::services::error::ResolveError;
use crate::services::policy::AuthContext;

/// Issues and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID, hex ObjectId)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub jti: String,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        if config.using_fallback_secret {
            tracing::warn!(
                "JWT_SECRET is not set; signing tokens with the fallback secret. \
                 This deployment is misconfigured"
            );
        }
        Self::from_secret(config.jwt_secret.expose_secret(), config.token_expiry_days)
    }

    pub fn from_secret(secret: &str, expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_days,
        }
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &User) -> Result<String, ResolveError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.expiry_days);

        let claims = SessionClaims {
            sub: user.id.to_hex(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ResolveError::Internal(format!("Failed to encode session token: {}", e)))
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }

    /// Resolve the raw `Authorization` header value into a caller identity.
    /// Never fails: anything unusable is treated as anonymous.
    pub fn verify(&self, header: Option<&str>) -> AuthContext {
        let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return AuthContext::Anonymous;
        };

        let claims = match self.decode(token.trim()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                return AuthContext::Anonymous;
            }
        };

        match ObjectId::parse_str(&claims.sub) {
            Ok(user_id) => AuthContext::Identified {
                user_id,
                email: claims.email,
                role: claims.role,
            },
            Err(_) => {
                tracing::debug!(sub = %claims.sub, "Bearer token subject is not a user id");
                AuthContext::Anonymous
            }
        }
    }
}
