//! Banners Lambda - Handles banner image upload, listing, serving and deletion.

use api_gateway::{banners, AppState};
use lambda_http::{run, service_fn, Error};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::from_env().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { banners::handler(state, event).await }
    }))
    .await
}
