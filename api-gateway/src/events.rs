//! Events function.
//!
//! Endpoints:
//! - GET /api/events - List events, newest first
//! - POST /api/events - Create an event (auth)
//! - GET /api/events/{id} - Get an event
//! - PUT /api/events/{id} - Update title/description/banner (auth)
//! - DELETE /api/events/{id} - Delete an event (auth)
//! - POST /api/events/{id}/participants - Sign up for an event
//! - GET /api/events/{id}/participants - List an event's participants (auth)
//! - GET /api/events/{id}/export?fmt=csv|json - Export participants (auth)

use chrono::Utc;
use lambda_http::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;
use shared::export::{self, ExportFormat};
use shared::http::{
    json_response, non_empty, parse_json_body, preflight, query_param, resource_path, respond,
};
use shared::models::{AddParticipantRequest, CreateEventRequest, UpdateEventRequest};
use shared::{Event, Participant};
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
    if event.method().as_str() == "OPTIONS" {
        return preflight();
    }

    let path = resource_path(event.uri().path(), "events");
    if path.trailing {
        return Err(shared::Error::MethodNotAllowed);
    }

    match (event.method().as_str(), path.id, path.sub) {
        ("GET", None, None) => list_events(state).await,
        ("POST", None, None) => {
            state.auth.authenticate(event)?;
            create_event(state, event).await
        }
        ("GET", Some(id), None) => get_event(state, id).await,
        ("PUT", Some(id), None) => {
            state.auth.authenticate(event)?;
            update_event(state, id, event).await
        }
        ("DELETE", Some(id), None) => {
            state.auth.authenticate(event)?;
            delete_event(state, id).await
        }
        ("POST", Some(id), Some("participants")) => add_participant(state, id, event).await,
        ("GET", Some(id), Some("participants")) => {
            state.auth.authenticate(event)?;
            list_participants(state, id).await
        }
        ("GET", Some(id), Some("export")) => {
            state.auth.authenticate(event)?;
            let format = ExportFormat::from_query(query_param(event, "fmt").as_deref());
            export_event(state, id, format).await
        }
        _ => Err(shared::Error::MethodNotAllowed),
    }
}

async fn find_event(state: &AppState, id: &str) -> shared::Result<Event> {
    state
        .events
        .get::<Event>(id)
        .await?
        .ok_or_else(|| shared::Error::NotFound("Event not found".to_string()))
}

async fn list_events(state: &AppState) -> shared::Result<Response<Body>> {
    let mut events: Vec<Event> = state.events.list_all().await?;
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    json_response(200, &json!({ "events": events }))
}

async fn create_event(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let request: CreateEventRequest = parse_json_body(event.body())?;
    let title = non_empty(request.title);
    let banner_url = non_empty(request.banner_url);
    let (Some(title), Some(banner_url)) = (title, banner_url) else {
        return Err(shared::Error::Validation(
            "title and banner_url required".to_string(),
        ));
    };

    let new_event = Event {
        id: Uuid::new_v4().to_string(),
        title,
        description: non_empty(request.description),
        banner_url,
        participants: Vec::new(),
        created_at: Utc::now(),
        updated_at: None,
    };
    state.events.create(&new_event.id, &new_event).await?;

    info!("Created event {} ({})", new_event.title, new_event.id);
    json_response(201, &json!({ "event": new_event }))
}

async fn get_event(state: &AppState, id: &str) -> shared::Result<Response<Body>> {
    let found = find_event(state, id).await?;
    json_response(200, &found)
}

async fn update_event(
    state: &AppState,
    id: &str,
    event: &Request,
) -> shared::Result<Response<Body>> {
    let request: UpdateEventRequest = parse_json_body(event.body())?;
    let title = non_empty(request.title);
    let banner_url = non_empty(request.banner_url);
    let description = non_empty(request.description);

    let updated = state
        .events
        .update(id, |existing: &mut Event| {
            if let Some(title) = &title {
                existing.title = title.clone();
            }
            if let Some(banner_url) = &banner_url {
                existing.banner_url = banner_url.clone();
            }
            if let Some(description) = &description {
                existing.description = Some(description.clone());
            }
            existing.updated_at = Some(Utc::now());
        })
        .await?
        .ok_or_else(|| shared::Error::NotFound("Event not found".to_string()))?;

    info!("Updated event {}", id);
    json_response(200, &json!({ "event": updated }))
}

async fn delete_event(state: &AppState, id: &str) -> shared::Result<Response<Body>> {
    state.events.delete(id).await?;
    info!("Deleted event {}", id);
    json_response(200, &json!({ "success": true }))
}

async fn add_participant(
    state: &AppState,
    id: &str,
    event: &Request,
) -> shared::Result<Response<Body>> {
    let request: AddParticipantRequest = parse_json_body(event.body())?;
    let (Some(name), Some(email)) = (non_empty(request.name), non_empty(request.email)) else {
        return Err(shared::Error::Validation("name and email required".to_string()));
    };

    let participant = Participant {
        name,
        email,
        message: request.message,
        timestamp: Utc::now(),
    };

    state
        .events
        .update(id, |existing: &mut Event| {
            existing.participants.push(participant.clone())
        })
        .await?
        .ok_or_else(|| shared::Error::NotFound("Event not found".to_string()))?;

    info!("Added participant to event {}", id);
    json_response(201, &json!({ "success": true, "participant": participant }))
}

async fn list_participants(state: &AppState, id: &str) -> shared::Result<Response<Body>> {
    let found = find_event(state, id).await?;
    json_response(200, &json!({ "participants": found.participants }))
}

async fn export_event(
    state: &AppState,
    id: &str,
    format: ExportFormat,
) -> shared::Result<Response<Body>> {
    let found = find_event(state, id).await?;
    info!(
        "Exporting {} participants of event {} as {:?}",
        found.participants.len(),
        id,
        format
    );

    match format {
        ExportFormat::Csv => Ok(Response::builder()
            .status(200)
            .header(CONTENT_TYPE, "text/csv")
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={}", export::csv_filename(id)),
            )
            .body(Body::from(export::to_csv(&found)?))?),
        ExportFormat::Json => json_response(200, &export::to_json(&found)),
    }
}
