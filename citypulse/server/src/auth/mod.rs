use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use crate::config::Config;

pub mod api {
    pub mod v1;
}

/// Represents the currently authenticated staff member.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(username: String) -> Self {
        Self { username }
    }
}

/// Authentication state containing staff credentials and JWT secret.
#[derive(Clone)]
pub struct AuthState {
    pub admin_username: String,
    pub admin_password: String,
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Checks submitted credentials against the configured staff account.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,       // Expiry time of the token
    pub iat: usize,       // Issued at time of the token
    pub username: String, // Username of the authenticated user
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Submitted username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Represents an error during JWT operations.
    #[error("JWT operation failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Issues a token valid for 24 hours.
pub fn encode_jwt(username: String, jwt_secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims { exp, iat, username };
    let jwt = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token_data = jsonwebtoken::decode(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_round_trip_a_token() {
        let token = encode_jwt("clerk".to_string(), "secret").unwrap();

        let claims = decode_jwt(&token, "secret").unwrap();

        assert_eq!(claims.username, "clerk");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let token = encode_jwt("clerk".to_string(), "secret").unwrap();

        let result = decode_jwt(&token, "other");

        assert!(matches!(result, Err(AuthError::Jwt(_))));
    }

    #[test]
    fn verifies_configured_credentials() {
        let state = AuthState {
            admin_username: "admin".to_string(),
            admin_password: "password".to_string(),
            jwt_secret: "secret".to_string(),
        };

        assert!(state.verify_credentials("admin", "password"));
        assert!(!state.verify_credentials("admin", "wrong"));
        assert!(!state.verify_credentials("someone", "password"));
    }
}
