//! Document store access for events.

mod cosmos;
mod memory;

pub use cosmos::CosmosEventStore;
pub use memory::MemoryEventStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Capabilities the handlers need from the document store.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert the document, or replace the one with the same identity.
    async fn upsert(&self, document: &Value) -> Result<()>;

    /// Every document in the container, across all partitions.
    ///
    /// Each call executes a fresh read.
    async fn query_all(&self) -> Result<Vec<Value>>;
}
