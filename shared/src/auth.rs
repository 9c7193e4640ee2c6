//! Admin login and bearer token authentication.

use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lambda_http::Request;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::header;
use crate::{Error, Result};

/// Claims carried by an admin token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Caller identity established by a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Checks admin credentials and issues/validates signed tokens.
pub struct Authenticator {
    admin_username: String,
    admin_password_hash: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: chrono::Duration,
}

impl Authenticator {
    /// Build an authenticator, rejecting a password hash that isn't a PHC string.
    pub fn new(
        admin_username: impl Into<String>,
        admin_password_hash: impl Into<String>,
        secret: &str,
        token_ttl: chrono::Duration,
    ) -> Result<Self> {
        let admin_password_hash = admin_password_hash.into();
        PasswordHash::new(&admin_password_hash)
            .map_err(|e| Error::Config(format!("Invalid ADMIN_PASSWORD_HASH: {}", e)))?;

        Ok(Self {
            admin_username: admin_username.into(),
            admin_password_hash,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        })
    }

    /// Lifetime of tokens issued by this authenticator.
    pub fn token_ttl(&self) -> chrono::Duration {
        self.token_ttl
    }

    /// Verify username and password, returning a fresh token on success.
    ///
    /// The Argon2 check runs on the blocking pool.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let hash = self.admin_password_hash.clone();
        let password = password.to_string();
        // Always run the hash check so a wrong username costs the same as a wrong password.
        let password_ok = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| Error::Internal(format!("Password check aborted: {}", e)))?;

        if username != self.admin_username || !password_ok {
            warn!("Login attempt with invalid credentials for user: {}", username);
            return Err(Error::Auth("Invalid credentials".to_string()));
        }
        self.issue_token(username)
    }

    /// Sign a token for `subject` valid for the configured lifetime.
    pub fn issue_token(&self, subject: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.token_ttl)
                .ok_or_else(|| Error::Internal("Token expiry out of range".to_string()))?
                .timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Validate signature and expiry of a token.
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| Error::Auth("Invalid token".to_string()))?;

        Ok(AuthenticatedUser {
            username: token_data.claims.sub,
        })
    }

    /// Require a valid `Authorization: Bearer <token>` header on the request.
    pub fn authenticate(&self, request: &Request) -> Result<AuthenticatedUser> {
        let token = header(request, "authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| Error::Auth("Missing Authorization header".to_string()))?;

        self.validate_token(token.trim()).inspect_err(|_| {
            warn!("Rejected bearer token for {}", request.uri().path());
        })
    }
}

fn verify_password(phc: &str, password: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password into an Argon2 PHC string suitable for `ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::Body;

    fn authenticator() -> Authenticator {
        let hash = hash_password("correct horse").unwrap();
        Authenticator::new("admin", hash, "test-secret", chrono::Duration::hours(8)).unwrap()
    }

    fn claims_of(token: &str) -> Claims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        decode::<Claims>(token, &DecodingKey::from_secret(b"test-secret"), &validation)
            .unwrap()
            .claims
    }

    #[tokio::test]
    async fn test_login_issues_token_for_configured_window() {
        let auth = authenticator();
        let token = auth.login("admin", "correct horse").await.unwrap();

        let claims = claims_of(&token);
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 8 * 60 * 60);
        assert_eq!(auth.validate_token(&token).unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_credentials() {
        let auth = authenticator();
        assert!(matches!(auth.login("admin", "wrong").await, Err(Error::Auth(_))));
        assert!(matches!(
            auth.login("root", "correct horse").await,
            Err(Error::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_unrepresentable_expiry_errors() {
        let hash = hash_password("correct horse").unwrap();
        let auth = Authenticator::new("admin", hash, "test-secret", chrono::Duration::MAX).unwrap();

        let result = auth.login("admin", "correct horse").await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = authenticator();
        let now = Utc::now().timestamp();
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: "admin".to_string(),
                iat: now - 9 * 60 * 60,
                exp: now - 60 * 60,
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(auth.validate_token(&expired), Err(Error::Auth(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let auth = authenticator();
        let other = Authenticator::new(
            "admin",
            hash_password("x").unwrap(),
            "other-secret",
            chrono::Duration::hours(8),
        )
        .unwrap();
        let token = other.issue_token("admin").unwrap();

        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_malformed_password_hash() {
        let result = Authenticator::new("admin", "plaintext", "s", chrono::Duration::hours(1));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_authenticate_reads_bearer_header() {
        let auth = authenticator();
        let token = auth.issue_token("admin").unwrap();

        let request = lambda_http::http::Request::builder()
            .uri("/api/verify")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::Empty)
            .unwrap();
        assert_eq!(auth.authenticate(&request).unwrap().username, "admin");

        let missing = lambda_http::http::Request::builder()
            .uri("/api/verify")
            .body(Body::Empty)
            .unwrap();
        match auth.authenticate(&missing) {
            Err(Error::Auth(msg)) => assert_eq!(msg, "Missing Authorization header"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
