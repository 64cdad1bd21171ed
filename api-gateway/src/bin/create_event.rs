//! Create Event Lambda - Handles event creation requests.
//!
//! Validates the JSON body (`name`, `description`), stamps an id and creation
//! time, and upserts the event into the Cosmos DB container.

use lambda_http::{run, service_fn, Error, Request};
use shared::{handlers, Config, CosmosEventStore, EventIdStrategy, EventStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    store: Arc<dyn EventStore>,
    id_strategy: EventIdStrategy,
}

impl AppState {
    fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        info!(
            "Using container {}/{} with {} event ids",
            config.database_name, config.container_name, config.id_strategy
        );

        Ok(Self {
            store: Arc::new(CosmosEventStore::new(&config)?),
            id_strategy: config.id_strategy,
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
        async move { handlers::create_event(state.store.as_ref(), state.id_strategy, &event).await }
    }))
    .await
}
