//! Banners function.
//!
//! Endpoints:
//! - GET /api/banners - List banner URLs
//! - POST /api/banners - Upload a banner as `{filename, dataBase64}` or a raw image body (auth)
//! - GET /api/banners/{id} - Serve banner bytes
//! - DELETE /api/banners/{id} - Delete a banner (auth)

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lambda_http::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;
use shared::http::{
    base_url, header, json_response, parse_json_body, preflight, resource_path, respond,
};
use shared::models::{BannerUploadRequest, BannerUploadResponse};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

const DEFAULT_EXTENSION: &str = "png";

pub async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    info!(
        "Received request: method={}, path={}",
        event.method(),
        event.uri().path()
    );
    respond(route(&state, &event).await, &state.config.allowed_origin)
}

async fn route(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let path = resource_path(event.uri().path(), "banners");
    if path.sub.is_some() {
        return Err(shared::Error::MethodNotAllowed);
    }

    match (event.method().as_str(), path.id) {
        ("OPTIONS", _) => preflight(),
        ("GET", None) => list_banners(state, event).await,
        ("GET", Some(id)) => serve_banner(state, id).await,
        ("POST", None) => {
            state.auth.authenticate(event)?;
            upload_banner(state, event).await
        }
        ("DELETE", Some(id)) => {
            state.auth.authenticate(event)?;
            state.banners.delete(id).await?;
            info!("Deleted banner {}", id);
            json_response(200, &json!({ "success": true }))
        }
        _ => Err(shared::Error::MethodNotAllowed),
    }
}

fn banner_url(event: &Request, id: &str) -> String {
    format!("{}/api/banners/{}", base_url(event), id)
}

async fn list_banners(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let urls: Vec<String> = state
        .banners
        .list()
        .await?
        .iter()
        .map(|id| banner_url(event, id))
        .collect();
    json_response(200, &json!({ "banners": urls }))
}

/// Lowercase alphanumeric extension, or `None` if `raw` can't be one.
fn clean_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

fn extension_from_filename(filename: Option<&str>) -> String {
    filename
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| clean_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn extension_from_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .and_then(|mime| mime.trim().strip_prefix("image/"))
        .map(|subtype| subtype.split('+').next().unwrap_or(subtype))
        .and_then(clean_extension)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// MIME type for a banner id, from its extension.
pub fn mime_for(id: &str) -> &'static str {
    let ext = id.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

async fn upload_banner(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let content_type = header(event, "content-type").unwrap_or("").to_ascii_lowercase();

    // Browsers sometimes drop the header on JSON string bodies.
    let is_json = content_type.is_empty() || content_type.contains("application/json");
    let (data, extension) = if is_json {
        let request: BannerUploadRequest = parse_json_body(event.body())?;
        let encoded = request
            .data_base64
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| shared::Error::Validation("dataBase64 required".to_string()))?;
        let data = BASE64
            .decode(encoded.trim())
            .map_err(|_| shared::Error::Validation("dataBase64 is not valid base64".to_string()))?;
        (data, extension_from_filename(request.filename.as_deref()))
    } else if let Body::Binary(bytes) = event.body() {
        (bytes.clone(), extension_from_content_type(&content_type))
    } else {
        return Err(shared::Error::UnsupportedMedia(
            "Unsupported upload format".to_string(),
        ));
    };

    if data.len() > state.config.max_upload_bytes {
        return Err(shared::Error::PayloadTooLarge(format!(
            "Banner exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let id = format!("{}.{}", Uuid::new_v4(), extension);
    state.banners.put(&id, data, Some(mime_for(&id))).await?;
    info!("Uploaded banner {}", id);

    json_response(
        201,
        &BannerUploadResponse {
            success: true,
            url: banner_url(event, &id),
            id,
        },
    )
}

async fn serve_banner(state: &AppState, id: &str) -> shared::Result<Response<Body>> {
    let blob = state
        .banners
        .get(id)
        .await?
        .ok_or_else(|| shared::Error::NotFound("Banner not found".to_string()))?;

    Ok(Response::builder()
        .status(200)
        .header(CONTENT_TYPE, mime_for(id))
        .header(CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::Binary(blob.data))?)
}
