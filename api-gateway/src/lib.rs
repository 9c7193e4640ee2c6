//! HTTP handlers behind the event admin Lambda functions.
//!
//! Each module owns one function's routes; the binaries in `src/bin` only wire
//! a handler into the Lambda runtime.

pub mod banners;
pub mod events;
pub mod health;
pub mod login;
pub mod participants;

use lambda_http::Error;
use shared::{Authenticator, BlobStore, Config, JsonStore, S3Store};
use std::sync::Arc;

/// State shared across requests within one Lambda instance.
pub struct AppState {
    pub config: Config,
    pub auth: Authenticator,
    pub events: JsonStore,
    pub banners: Arc<dyn BlobStore>,
    pub registrations: JsonStore,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Authenticator,
        events: Arc<dyn BlobStore>,
        banners: Arc<dyn BlobStore>,
        registrations: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            auth,
            events: JsonStore::new(events),
            banners,
            registrations: JsonStore::new(registrations),
        }
    }

    /// Build state from the environment, backed by S3.
    pub async fn from_env() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
        let jwt_secret = shared::resolve_secret(&secrets_client, &config.jwt_secret).await?;
        let auth = Authenticator::new(
            config.admin_username.clone(),
            config.admin_password_hash.clone(),
            &jwt_secret,
            config.token_ttl,
        )?;

        let s3 = aws_sdk_s3::Client::new(&aws_config);
        let store = |namespace: &str| -> Arc<dyn BlobStore> {
            Arc::new(S3Store::new(
                s3.clone(),
                config.blob_bucket.clone(),
                &config.blob_prefix,
                namespace,
            ))
        };
        let (events, banners, registrations) =
            (store("events"), store("banners"), store("participants"));

        Ok(Self::new(config, auth, events, banners, registrations))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use lambda_http::{Body, Request, Response};
    use shared::{MemoryStore, SecretSource};
    use std::sync::OnceLock;

    pub const PASSWORD: &str = "hunter2-but-longer";

    fn password_hash() -> String {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| shared::hash_password(PASSWORD).unwrap())
            .clone()
    }

    pub fn config() -> Config {
        Config {
            admin_username: "admin".to_string(),
            admin_password_hash: password_hash(),
            jwt_secret: SecretSource::Inline("test-secret".to_string()),
            token_ttl: chrono::Duration::hours(8),
            allowed_origin: "*".to_string(),
            blob_bucket: "unused".to_string(),
            blob_prefix: String::new(),
            max_upload_bytes: 1024,
        }
    }

    pub fn state() -> Arc<AppState> {
        state_with_events(Arc::new(MemoryStore::new()))
    }

    pub fn state_with_events(events: Arc<dyn BlobStore>) -> Arc<AppState> {
        let config = config();
        let auth = Authenticator::new(
            config.admin_username.clone(),
            config.admin_password_hash.clone(),
            "test-secret",
            config.token_ttl,
        )
        .unwrap();
        Arc::new(AppState::new(
            config,
            auth,
            events,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        ))
    }

    pub fn token(state: &AppState) -> String {
        state.auth.issue_token("admin").unwrap()
    }

    pub fn request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request {
        let mut builder = lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "admin.example.com");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(body).unwrap()
    }

    pub fn json_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Request {
        let mut request = request(method, uri, token, Body::from(body.to_string()));
        request
            .headers_mut()
            .insert("content-type", "application/json".parse().unwrap());
        request
    }

    pub fn json_body(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }
}
