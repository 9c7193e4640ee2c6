//! Configuration management for Lambda functions.

use lambda_http::http::HeaderValue;
use std::env;

use crate::{Error, Result};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_TOKEN_HOURS: i64 = 8;
const MAX_TOKEN_HOURS: i64 = 24 * 365;
const DEFAULT_MAX_FILE_SIZE: usize = 16 * 1024 * 1024;

/// Where the token signing secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Secret value given directly in `JWT_SECRET`
    Inline(String),
    /// ARN of a Secrets Manager secret holding the value
    SecretsManager(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin login name
    pub admin_username: String,
    /// Argon2 PHC string for the admin password
    pub admin_password_hash: String,
    /// Token signing secret
    pub jwt_secret: SecretSource,
    /// Lifetime of issued tokens
    pub token_ttl: chrono::Duration,
    /// Value of the Access-Control-Allow-Origin header
    pub allowed_origin: String,
    /// S3 bucket backing the blob store
    pub blob_bucket: String,
    /// Key prefix prepended to every namespace in the bucket
    pub blob_prefix: String,
    /// Upper bound for a decoded banner upload, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required =
            |name: &str| var(name).ok_or_else(|| Error::Config(format!("{} is required", name)));

        let jwt_secret = match (var("JWT_SECRET"), var("JWT_SECRET_ARN")) {
            (Some(secret), _) => SecretSource::Inline(secret),
            (None, Some(arn)) => SecretSource::SecretsManager(arn),
            (None, None) => {
                return Err(Error::Config(
                    "JWT_SECRET environment variable is required".to_string(),
                ))
            }
        };

        let token_hours = match var("JWT_EXPIRATION_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_TOKEN_HOURS).contains(h))
                .ok_or_else(|| Error::Config(format!("Invalid JWT_EXPIRATION_HOURS: {}", raw)))?,
            None => DEFAULT_TOKEN_HOURS,
        };
        let token_ttl = chrono::Duration::try_hours(token_hours).ok_or_else(|| {
            Error::Config(format!("JWT_EXPIRATION_HOURS out of range: {}", token_hours))
        })?;

        let allowed_origin = var("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string());
        HeaderValue::from_str(&allowed_origin)
            .map_err(|_| Error::Config(format!("Invalid ALLOWED_ORIGIN: {:?}", allowed_origin)))?;

        let max_upload_bytes = match var("MAX_FILE_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| Error::Config(format!("Invalid MAX_FILE_SIZE: {}", raw)))?,
            None => DEFAULT_MAX_FILE_SIZE,
        };

        Ok(Self {
            admin_username: var("ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password_hash: required("ADMIN_PASSWORD_HASH")?,
            jwt_secret,
            token_ttl,
            allowed_origin,
            blob_bucket: required("BLOB_BUCKET")?,
            blob_prefix: var("BLOB_PREFIX").unwrap_or_default(),
            max_upload_bytes,
        })
    }
}
