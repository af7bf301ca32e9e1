use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // owner id
    pub exp: i64,
    pub iat: i64,
}

pub struct AuthService;

impl AuthService {
    /// Issue a bearer token for an owner
    pub fn generate_token(owner_id: Uuid, config: &Config) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(config.jwt_expiration_hours);

        let claims = Claims {
            sub: owner_id,
            exp: exp.unix_timestamp(),
            iat: now.unix_timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(token: &str, config: &Config) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: secret.to_string(),
            jwt_expiration_hours: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 5,
            scheduler_cadences: Vec::new(),
            scheduler_in_server: false,
            log_json: false,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_owner() {
        let config = config("secret-a");
        let owner = Uuid::new_v4();

        let token = AuthService::generate_token(owner, &config).unwrap();
        let claims = AuthService::verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, owner);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = AuthService::generate_token(Uuid::new_v4(), &config("secret-a")).unwrap();
        let result = AuthService::verify_token(&token, &config("secret-b"));

        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
