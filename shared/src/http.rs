//! HTTP helpers for Lambda functions.

use lambda_http::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use lambda_http::http::HeaderValue;
use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use crate::{Error, Result};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>> {
    json_response(
        status,
        &ErrorBody {
            error: message.into(),
        },
    )
}

/// Empty 204 answer to a CORS preflight request.
pub fn preflight() -> Result<Response<Body>> {
    Ok(Response::builder()
        .status(204)
        .header("access-control-allow-methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("access-control-allow-headers", "Authorization, Content-Type")
        .header("access-control-max-age", "86400")
        .body(Body::Empty)?)
}

/// Turn a handler result into the final Lambda response.
///
/// Errors become `{"error": ...}` bodies with their status code, and every
/// response gets the configured CORS origin.
pub fn respond(
    result: Result<Response<Body>>,
    allowed_origin: &str,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            let status = err.status_code();
            if status >= 500 {
                error!("Request failed: {}", err);
            } else {
                info!("Request rejected with {}: {}", status, err);
            }
            error_response(status, err.public_message())?
        }
    };

    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_str(allowed_origin)?);
    Ok(response)
}

/// Header value as a string, if present and valid UTF-8.
pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

/// First value of a query string parameter.
///
/// API Gateway hands the parameters over separately; fall back to the URI
/// query for invocations that only carry a raw URL.
pub fn query_param(request: &Request, name: &str) -> Option<String> {
    if let Some(value) = request
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
    {
        return Some(value.to_string());
    }

    request.uri().query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then(|| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
    })
}

/// Segments of a request path that follow a resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourcePath<'a> {
    /// Segment right after the resource name
    pub id: Option<&'a str>,
    /// Segment after the id (`participants`, `export`, ...)
    pub sub: Option<&'a str>,
    /// More segments follow the sub-resource
    pub trailing: bool,
}

/// Locate `resource` among the path segments and pick out id and sub-resource.
///
/// Works for both `/api/events/..` and `/functions/events/..` style
/// paths. A path without the resource name yields an empty `ResourcePath`.
pub fn resource_path<'a>(path: &'a str, resource: &str) -> ResourcePath<'a> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.iter().position(|s| *s == resource) {
        Some(idx) => ResourcePath {
            id: segments.get(idx + 1).copied(),
            sub: segments.get(idx + 2).copied(),
            trailing: segments.len() > idx + 3,
        },
        None => ResourcePath::default(),
    }
}

/// Parse request body as JSON. An empty body parses as `{}`.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    let bytes: &[u8] = body.as_ref();
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|_| Error::Validation("Invalid JSON".to_string()))
}

/// `scheme://host` the caller used to reach us, or empty if the host is unknown.
pub fn base_url(request: &Request) -> String {
    let proto = header(request, "x-forwarded-proto").unwrap_or("https");
    match header(request, "host") {
        Some(host) => format!("{}://{}", proto, host),
        None => String::new(),
    }
}

/// Trimmed, non-empty string field.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path_with_sub_resource() {
        let route = resource_path("/api/events/abc-123/participants", "events");
        assert_eq!(route.id, Some("abc-123"));
        assert_eq!(route.sub, Some("participants"));
        assert!(!route.trailing);
    }

    #[test]
    fn test_resource_path_function_style() {
        let route = resource_path("/functions/events/abc/export/", "events");
        assert_eq!(route.id, Some("abc"));
        assert_eq!(route.sub, Some("export"));
    }

    #[test]
    fn test_resource_path_collection_and_trailing() {
        assert_eq!(resource_path("/api/events", "events"), ResourcePath::default());
        assert!(resource_path("/api/events/a/participants/b", "events").trailing);
        assert_eq!(resource_path("/api/other", "events"), ResourcePath::default());
    }

    #[test]
    fn test_query_param_from_uri() {
        let request = lambda_http::http::Request::builder()
            .uri("https://example.com/api/events/1/export?x=1&fmt=csv")
            .body(Body::Empty)
            .unwrap();
        assert_eq!(query_param(&request, "fmt").as_deref(), Some("csv"));
        assert_eq!(query_param(&request, "missing"), None);
    }

    #[test]
    fn test_parse_empty_body_as_object() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            title: Option<String>,
        }
        let parsed: Payload = parse_json_body(&Body::Empty).unwrap();
        assert!(parsed.title.is_none());

        let err = parse_json_body::<Payload>(&Body::from("{not json")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_respond_maps_errors_and_sets_origin() {
        let response = respond(Err(Error::MethodNotAllowed), "https://admin.example.com").unwrap();
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://admin.example.com"
        );
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "Method Not Allowed");
    }
}
