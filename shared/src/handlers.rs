//! Request handlers for the event functions.
//!
//! The Lambda binaries only wire configuration and the store into these
//! functions, so they can be exercised directly with any [EventStore].

use lambda_http::{Body, Request, Response};
use tracing::{error, info};

use crate::http::{json_response, parse_json_object, pretty_json_response, text_response};
use crate::models::{CreateEventRequest, CreateEventResponse, Event, EventIdStrategy};
use crate::store::EventStore;
use crate::{Error, Result};

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON body. Please provide valid event data.";
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required event details (name and description).";

/// Persist an event, logging identity conflicts before passing them on.
async fn save_event(store: &dyn EventStore, event: &Event) -> Result<()> {
    match store.upsert(&event.to_document()?).await {
        Ok(()) => {
            info!("Event {} saved to Cosmos DB.", event.event_id);
            Ok(())
        }
        Err(e @ Error::Conflict(_)) => {
            error!("Error saving event to Cosmos DB: {}", e);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Validate the request body and store a new event.
///
/// 201 with the new id, 400 on a malformed body or missing fields, 500 when
/// the store fails.
pub async fn create_event(
    store: &dyn EventStore,
    id_strategy: EventIdStrategy,
    request: &Request,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    info!("Processing a request to create event.");

    let payload: CreateEventRequest = match parse_json_object(request.body()) {
        Ok(payload) => payload,
        Err(e) => {
            info!("Rejected create request: {}", e);
            return text_response(e.status_code(), INVALID_JSON_MESSAGE);
        }
    };

    let (name, description) = match payload.validate() {
        Ok(fields) => fields,
        Err(e) => return text_response(e.status_code(), MISSING_FIELDS_MESSAGE),
    };

    let event = Event::new(id_strategy, name, description);

    match save_event(store, &event).await {
        Ok(()) => json_response(201, &CreateEventResponse::created(event.event_id)),
        Err(e) => text_response(
            e.status_code(),
            format!("Error saving event to Cosmos DB: {}", e),
        ),
    }
}

/// Return every stored event as an indented JSON array.
///
/// The request body and query string are ignored.
pub async fn list_events(
    store: &dyn EventStore,
    _request: &Request,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    info!("Received request to get events.");

    match store.query_all().await {
        Ok(events) => pretty_json_response(200, &events),
        Err(e) => {
            error!("Failed to get events: {}", e);
            text_response(e.status_code(), format!("Error fetching events: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEventStore;
    use async_trait::async_trait;
    use serde_json::Value;

    /// Store whose every call fails.
    struct FailingStore {
        conflict: bool,
    }

    impl FailingStore {
        fn error(&self) -> Error {
            if self.conflict {
                Error::Conflict("Entity with the specified id already exists".to_string())
            } else {
                Error::Store {
                    status: 503,
                    message: "Service is currently unavailable".to_string(),
                }
            }
        }
    }

    #[async_trait]
    impl EventStore for FailingStore {
        async fn upsert(&self, _document: &Value) -> Result<()> {
            Err(self.error())
        }

        async fn query_all(&self) -> Result<Vec<Value>> {
            Err(self.error())
        }
    }

    fn post(body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method("POST")
            .uri("/api/events")
            .body(Body::from(body))
            .unwrap()
    }

    fn get() -> Request {
        lambda_http::http::Request::builder()
            .method("GET")
            .uri("/api/events?ignored=true")
            .body(Body::Empty)
            .unwrap()
    }

    fn body_text(response: &Response<Body>) -> String {
        String::from_utf8(response.body().as_ref().to_vec()).unwrap()
    }

    fn body_json(response: &Response<Body>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    async fn create(store: &dyn EventStore, body: &str) -> Response<Body> {
        create_event(store, EventIdStrategy::Timestamp, &post(body))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = MemoryEventStore::new();

        let response = create(&store, r#"{"name": "Launch", "description": "Product launch"}"#).await;
        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["content-type"], "application/json");

        let created = body_json(&response);
        assert_eq!(created["message"], "Event created successfully!");
        let event_id = created["event_id"].as_str().unwrap().to_string();
        assert!(!event_id.is_empty());
        assert!(event_id.parse::<f64>().is_ok());

        let response = list_events(&store, &get()).await.unwrap();
        assert_eq!(response.status(), 200);
        let events = body_json(&response);
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event_id"], event_id.as_str());
        assert_eq!(events[0]["name"], "Launch");
        assert_eq!(events[0]["description"], "Product launch");
        assert!(events[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_missing_fields_write_nothing() {
        let store = MemoryEventStore::new();

        for body in [
            r#"{"name": ""}"#,
            r#"{"name": "Launch"}"#,
            r#"{"description": "Product launch"}"#,
            r#"{"name": "Launch", "description": ""}"#,
            r#"{"name": null, "description": "Product launch"}"#,
            "{}",
        ] {
            let response = create(&store, body).await;
            assert_eq!(response.status(), 400, "body: {}", body);
            assert_eq!(body_text(&response), MISSING_FIELDS_MESSAGE);
        }

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let store = MemoryEventStore::new();

        for body in ["not-json", "", "[]", r#"{"name": 1, "description": "x"}"#] {
            let response = create(&store, body).await;
            assert_eq!(response.status(), 400, "body: {}", body);
            assert_eq!(response.headers()["content-type"], "text/plain");
            assert_eq!(body_text(&response), INVALID_JSON_MESSAGE);
        }

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let store = MemoryEventStore::new();
        let response = list_events(&store, &get()).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_text(&response), "[]");
    }

    #[tokio::test]
    async fn test_list_returns_each_event_once() {
        let store = MemoryEventStore::new();
        let mut ids = Vec::new();

        for i in 0..5 {
            let body = format!(r#"{{"name": "event {}", "description": "same"}}"#, i);
            let response = create_event(&store, EventIdStrategy::Uuid, &post(&body))
                .await
                .unwrap();
            ids.push(body_json(&response)["event_id"].as_str().unwrap().to_string());
        }

        let events = body_json(&list_events(&store, &get()).await.unwrap());
        let mut listed: Vec<String> = events
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event_id"].as_str().unwrap().to_string())
            .collect();

        listed.sort();
        ids.sort();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_list_is_indented() {
        let store = MemoryEventStore::new();
        create(&store, r#"{"name": "Launch", "description": "Product launch"}"#).await;

        let text = body_text(&list_events(&store, &get()).await.unwrap());
        assert!(text.starts_with("[\n  {\n    \""));
    }

    #[tokio::test]
    async fn test_create_is_not_idempotent() {
        let store = MemoryEventStore::new();
        let body = r#"{"name": "Launch", "description": "Product launch"}"#;

        let first = create_event(&store, EventIdStrategy::Uuid, &post(body)).await.unwrap();
        let second = create_event(&store, EventIdStrategy::Uuid, &post(body)).await.unwrap();

        assert_ne!(body_json(&first)["event_id"], body_json(&second)["event_id"]);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_store_failure_on_create() {
        let store = FailingStore { conflict: false };
        let response = create(&store, r#"{"name": "Launch", "description": "Product launch"}"#).await;

        assert_eq!(response.status(), 500);
        assert_eq!(response.headers()["content-type"], "text/plain");
        let text = body_text(&response);
        assert!(text.starts_with("Error saving event to Cosmos DB: "));
        assert!(text.contains("Service is currently unavailable"));
    }

    #[tokio::test]
    async fn test_conflict_surfaces_as_server_error() {
        let store = FailingStore { conflict: true };
        let response = create(&store, r#"{"name": "Launch", "description": "Product launch"}"#).await;

        assert_eq!(response.status(), 500);
        assert!(body_text(&response).contains("already exists"));
    }

    #[tokio::test]
    async fn test_store_failure_on_list() {
        let store = FailingStore { conflict: false };
        let response = list_events(&store, &get()).await.unwrap();

        assert_eq!(response.status(), 500);
        let text = body_text(&response);
        assert!(text.starts_with("Error fetching events: "));
        assert!(text.contains("Service is currently unavailable"));
    }

    #[tokio::test]
    async fn test_validation_failure_skips_store() {
        // A failing store would turn any write attempt into a 500.
        let store = FailingStore { conflict: false };
        let response = create(&store, r#"{"name": "Launch"}"#).await;
        assert_eq!(response.status(), 400);
    }
}
