//! Login function.
//!
//! Endpoints:
//! - POST /api/login - Exchange admin credentials for a bearer token
//! - GET /api/verify - Check that the presented token is still valid

use lambda_http::{Body, Error, Request, Response};
use serde_json::json;
use shared::http::{json_response, non_empty, parse_json_body, preflight, respond};
use shared::models::{LoginRequest, LoginResponse};
use std::sync::Arc;
use tracing::info;

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
    let endpoint = event.uri().path().trim_end_matches('/').rsplit('/').next();

    match (event.method().as_str(), endpoint) {
        ("OPTIONS", _) => preflight(),
        ("POST", Some("login")) => login(state, event).await,
        ("GET", Some("verify")) => {
            let user = state.auth.authenticate(event)?;
            json_response(200, &json!({ "valid": true, "user": user.username }))
        }
        _ => Err(shared::Error::MethodNotAllowed),
    }
}

async fn login(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let request: LoginRequest = parse_json_body(event.body())?;
    // Passwords are compared verbatim; only the username is trimmed.
    let (Some(username), Some(password)) = (
        non_empty(request.username),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(shared::Error::Validation(
            "username and password required".to_string(),
        ));
    };

    let token = state.auth.login(&username, &password).await?;
    info!("Successful login for user: {}", username);

    json_response(
        200,
        &LoginResponse {
            token,
            user: username,
        },
    )
}
