//! Participant registry function.
//!
//! Sign-ups that aren't tied to a stored event.
//!
//! Endpoints:
//! - POST /api/participants - Register (name required)
//! - GET /api/participants - List registrations, newest first (auth)

use chrono::Utc;
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;
use shared::http::{
    json_response, non_empty, parse_json_body, preflight, resource_path, respond,
};
use shared::models::RegistrationRequest;
use shared::Registration;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

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
    if resource_path(event.uri().path(), "participants").id.is_some() {
        return Err(shared::Error::MethodNotAllowed);
    }

    match event.method().as_str() {
        "OPTIONS" => preflight(),
        "POST" => register(state, event).await,
        "GET" => {
            state.auth.authenticate(event)?;
            let mut all: Vec<Registration> = state.registrations.list_all().await?;
            all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            json_response(200, &json!({ "participants": all }))
        }
        _ => Err(shared::Error::MethodNotAllowed),
    }
}

async fn register(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let request: RegistrationRequest = parse_json_body(event.body())?;
    let name = non_empty(request.name)
        .ok_or_else(|| shared::Error::Validation("Name is required".to_string()))?;

    let registration = Registration {
        id: Uuid::new_v4().to_string(),
        name,
        email: non_empty(request.email),
        message: request.message,
        banner: non_empty(request.banner),
        timestamp: Utc::now(),
    };
    state
        .registrations
        .create(&registration.id, &registration)
        .await?;

    info!("Registered participant {}", registration.id);
    json_response(201, &json!({ "success": true, "participant": registration }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_body, json_request, request, state, token};

    #[tokio::test]
    async fn test_register_and_list_newest_first() {
        let state = state();
        for name in ["Early", "Late"] {
            let response = handler(
                state.clone(),
                json_request("POST", "/api/participants", None, json!({ "name": name })),
            )
            .await
            .unwrap();
            assert_eq!(response.status().as_u16(), 201);
            assert!(json_body(&response)["participant"]["id"].is_string());
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let token = token(&state);
        let list = request("GET", "/api/participants", Some(&token), Body::Empty);
        let response = handler(state.clone(), list).await.unwrap();
        let body = json_body(&response);
        assert_eq!(body["participants"][0]["name"], "Late");
        assert_eq!(body["participants"][1]["name"], "Early");
    }

    #[tokio::test]
    async fn test_register_requires_name() {
        let state = state();
        let response = handler(
            state.clone(),
            json_request("POST", "/api/participants", None, json!({ "email": "x@y.z" })),
        )
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(json_body(&response)["error"], "Name is required");

        let stored: Vec<Registration> = state.registrations.list_all().await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_listing_requires_auth() {
        let state = state();
        let list = request("GET", "/api/participants", None, Body::Empty);
        let response = handler(state.clone(), list).await.unwrap();
        assert_eq!(response.status().as_u16(), 401);

        let delete = request("DELETE", "/api/participants", None, Body::Empty);
        let response = handler(state.clone(), delete).await.unwrap();
        assert_eq!(response.status().as_u16(), 405);
    }
}
