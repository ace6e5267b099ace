//! Bearer-token authentication.
//!
//! Passwords are stored as argon2id PHC strings and never leave the server.
//! Tokens are HS256 JWTs carrying the user id and role; routes pull the
//! caller out of the `Authorization` header with the [`AuthUser`] extractor.

use std::time::{SystemTime, UNIX_EPOCH};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Role, state::SharedState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Hex ObjectId of the authenticated user.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal)
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(user_id: &ObjectId, role: Role, config: &Config) -> Result<String, AppError> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id.to_hex(),
        role,
        iat: now,
        exp: now + config.token_ttl_hours * 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal)
}

/// Any decode failure, including expiry and tampering, collapses to a single
/// 401 so the response does not leak which check failed.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The authenticated caller, extracted from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: ObjectId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Owner-or-admin check used by per-document routes.
    pub fn can_access(&self, owner: &ObjectId) -> bool {
        self.is_admin() || self.id == *owner
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

        let claims = decode_token(token, &state.config.jwt_secret)?;
        let id = ObjectId::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 0,
            mongo_url: String::new(),
            db_name: String::new(),
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
            upload_dir: String::new(),
            public_url: String::new(),
        }
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let config = test_config();
        let id = ObjectId::new();

        let token = issue_token(&id, Role::Admin, &config).unwrap();
        let claims = decode_token(&token, &config.jwt_secret).unwrap();

        assert_eq!(claims.sub, id.to_hex());
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let config = test_config();
        let token = issue_token(&ObjectId::new(), Role::User, &config).unwrap();

        assert!(matches!(
            decode_token(&token, "different-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let config = test_config();
        let now = unix_now();
        let claims = Claims {
            sub: ObjectId::new().to_hex(),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&token, &config.jwt_secret),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn owner_or_admin_access() {
        let owner = ObjectId::new();
        let user = AuthUser {
            id: owner,
            role: Role::User,
        };
        let stranger = AuthUser {
            id: ObjectId::new(),
            role: Role::User,
        };
        let admin = AuthUser {
            id: ObjectId::new(),
            role: Role::Admin,
        };

        assert!(user.can_access(&owner));
        assert!(!stranger.can_access(&owner));
        assert!(admin.can_access(&owner));
        assert!(stranger.ensure_admin().is_err());
        assert!(admin.ensure_admin().is_ok());
    }
}
