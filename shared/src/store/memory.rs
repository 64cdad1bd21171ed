//! In-process event store.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::EventStore;
use crate::{Error, Result};

/// Ephemeral [EventStore] keeping documents in insertion order.
///
/// Documents are identified by their `event_id`; writing the same id again
/// replaces the earlier document in place.
#[derive(Default)]
pub struct MemoryEventStore {
    documents: RwLock<Vec<Value>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn identity(document: &Value) -> Result<&str> {
    document
        .get("event_id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Internal("document has no event_id".to_string()))
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn upsert(&self, document: &Value) -> Result<()> {
        let id = identity(document)?;
        let mut documents = self.documents.write().await;

        match documents
            .iter_mut()
            .find(|existing| existing.get("event_id").and_then(Value::as_str) == Some(id))
        {
            Some(existing) => *existing = document.clone(),
            None => documents.push(document.clone()),
        }

        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Value>> {
        Ok(self.documents.read().await.clone())
    }
}
