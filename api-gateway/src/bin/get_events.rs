//! Get Events Lambda - Returns every stored event as a JSON array.

use lambda_http::{run, service_fn, Error, Request};
use shared::{handlers, Config, CosmosEventStore, EventStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    store: Arc<dyn EventStore>,
}

impl AppState {
    fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        info!(
            "Using container {}/{}",
            config.database_name, config.container_name
        );

        Ok(Self {
            store: Arc::new(CosmosEventStore::new(&config)?),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new()?);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { handlers::list_events(state.store.as_ref(), &event).await }
    }))
    .await
}
