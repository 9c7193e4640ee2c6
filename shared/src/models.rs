//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event with its embedded participant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub banner_url: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Someone who signed up for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Sign-up stored in the standalone participant registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Login request payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
}

/// Create event payload.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub banner_url: Option<String>,
    pub description: Option<String>,
}

/// Update event payload; absent or empty fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub banner_url: Option<String>,
    pub description: Option<String>,
}

/// Add participant payload.
#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Standalone registration payload.
#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub banner: Option<String>,
}

/// JSON banner upload payload.
#[derive(Debug, Deserialize)]
pub struct BannerUploadRequest {
    pub filename: Option<String>,
    #[serde(rename = "dataBase64")]
    pub data_base64: Option<String>,
}

/// Banner upload response payload.
#[derive(Debug, Serialize)]
pub struct BannerUploadResponse {
    pub success: bool,
    pub url: String,
    pub id: String,
}
