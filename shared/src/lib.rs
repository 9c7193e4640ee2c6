//! Shared library for the event admin Lambda functions.
//!
//! This crate provides configuration, authentication, storage, and HTTP helpers
//! used by every function in `api-gateway`.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod models;
pub mod secrets;
pub mod store;

pub use auth::{hash_password, AuthenticatedUser, Authenticator, Claims};
pub use config::{Config, SecretSource};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use models::{Event, Participant, Registration};
pub use secrets::{get_secret, resolve_secret};
pub use store::{Blob, BlobStore, JsonStore, MemoryStore, Precondition, S3Store};
