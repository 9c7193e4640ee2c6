//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::SecretSource;
use crate::{Error, Result};

/// Secret values by ARN.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Fetch the string value of a Secrets Manager secret.
///
/// Values are kept for the life of the Lambda instance, so a warm function
/// never calls Secrets Manager twice for the same ARN.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    if let Some(value) = get_cache().read().await.get(secret_arn) {
        return Ok(value.clone());
    }

    info!("Fetching secret {}", secret_arn);
    let output = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| {
            Error::Aws(format!("Failed to read secret {}: {}", secret_arn, e.into_service_error()))
        })?;

    let value = output
        .secret_string()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("Secret {} has no string value", secret_arn)))?
        .to_string();

    get_cache()
        .write()
        .await
        .insert(secret_arn.to_string(), value.clone());
    Ok(value)
}

/// Turn a configured secret source into the secret value.
///
/// Inline values are returned as-is; ARNs are fetched with the given client.
pub async fn resolve_secret(client: &SecretsClient, source: &SecretSource) -> Result<String> {
    match source {
        SecretSource::Inline(value) => Ok(value.clone()),
        SecretSource::SecretsManager(arn) => get_secret(client, arn).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> SecretsClient {
        let config = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(aws_sdk_secretsmanager::config::BehaviorVersion::latest())
            .region(aws_sdk_secretsmanager::config::Region::new("us-east-1"))
            .build();
        SecretsClient::from_conf(config)
    }

    #[tokio::test]
    async fn test_inline_secret_skips_secrets_manager() {
        let client = offline_client();
        let value = resolve_secret(&client, &SecretSource::Inline("s3cret".to_string()))
            .await
            .unwrap();
        assert_eq!(value, "s3cret");
    }

    #[tokio::test]
    async fn test_cached_secret_is_served_from_cache() {
        let arn = "arn:aws:secretsmanager:us-east-1:000000000000:secret:cached";
        get_cache()
            .write()
            .await
            .insert(arn.to_string(), "from-cache".to_string());

        let client = offline_client();
        let value = resolve_secret(&client, &SecretSource::SecretsManager(arn.to_string()))
            .await
            .unwrap();
        assert_eq!(value, "from-cache");
    }
}
