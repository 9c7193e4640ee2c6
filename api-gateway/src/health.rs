//! Health check function.
//!
//! Endpoints:
//! - GET /api/health - Report whether the event store can be listed

use lambda_http::{Body, Error, Request, Response};
use serde_json::json;
use shared::http::{json_response, preflight, respond};
use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;

pub async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    info!(
        "Received request: method={}, path={}",
        event.method(),
        event.uri().path()
    );
    respond(route(&state, &event).await, &state.config.allowed_origin)
}

async fn route(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    match event.method().as_str() {
        "OPTIONS" => preflight(),
        "GET" => check(state).await,
        _ => Err(shared::Error::MethodNotAllowed),
    }
}

async fn check(state: &AppState) -> shared::Result<Response<Body>> {
    match state.events.keys().await {
        Ok(keys) => {
            let body = json!({ "status": "healthy", "events_count": keys.len() });
            json_response(200, &body)
        }
        Err(err) => {
            error!("Health check failed: {}", err);
            json_response(500, &json!({ "status": "unhealthy" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_body, request, state, state_with_events};
    use async_trait::async_trait;
    use shared::{Blob, BlobStore, Event, Precondition};

    /// Store whose backend is unreachable.
    struct UnreachableStore;

    #[async_trait]
    impl BlobStore for UnreachableStore {
        async fn get(&self, _key: &str) -> shared::Result<Option<Blob>> {
            Err(shared::Error::Store("bucket unreachable".to_string()))
        }

        async fn put(
            &self,
            _key: &str,
            _data: Vec<u8>,
            _ct: Option<&str>,
        ) -> shared::Result<String> {
            Err(shared::Error::Store("bucket unreachable".to_string()))
        }

        async fn put_if(
            &self,
            _key: &str,
            _data: Vec<u8>,
            _ct: Option<&str>,
            _precondition: Precondition,
        ) -> shared::Result<Option<String>> {
            Err(shared::Error::Store("bucket unreachable".to_string()))
        }

        async fn delete(&self, _key: &str) -> shared::Result<()> {
            Err(shared::Error::Store("bucket unreachable".to_string()))
        }

        async fn list(&self) -> shared::Result<Vec<String>> {
            Err(shared::Error::Store("bucket unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_healthy_store() {
        let state = state();
        let stored = Event {
            id: "ev-1".to_string(),
            title: "Launch".to_string(),
            description: None,
            banner_url: "https://cdn.example.com/b.png".to_string(),
            participants: Vec::new(),
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        state.events.set(&stored.id, &stored).await.unwrap();

        let response = handler(state.clone(), request("GET", "/api/health", None, Body::Empty))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body = json_body(&response);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["events_count"], 1);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unhealthy() {
        let state = state_with_events(Arc::new(UnreachableStore));
        let response = handler(state.clone(), request("GET", "/api/health", None, Body::Empty))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body = json_body(&response);
        assert_eq!(body["status"], "unhealthy");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_only_get_is_allowed() {
        let state = state();
        let response = handler(state.clone(), request("POST", "/api/health", None, Body::Empty))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 405);
    }
}
