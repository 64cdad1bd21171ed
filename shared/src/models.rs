//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Message returned when an event was stored.
pub const EVENT_CREATED_MESSAGE: &str = "Event created successfully!";

/// How a new event id is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventIdStrategy {
    /// Seconds since the Unix epoch as decimal text, e.g. `1718000000.123456`.
    ///
    /// Two events created within the same microsecond get the same id.
    #[default]
    Timestamp,
    /// Random UUID v4. Changes the `event_id` format seen by clients.
    Uuid,
}

impl EventIdStrategy {
    /// Generate an id for an event created at `now`.
    pub fn generate(&self, now: DateTime<Utc>) -> String {
        match self {
            EventIdStrategy::Timestamp => timestamp_id(now),
            EventIdStrategy::Uuid => Uuid::new_v4().to_string(),
        }
    }
}

impl FromStr for EventIdStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(EventIdStrategy::Timestamp),
            "uuid" => Ok(EventIdStrategy::Uuid),
            other => Err(Error::Config(format!(
                "Unknown event id strategy '{}' (expected 'timestamp' or 'uuid')",
                other
            ))),
        }
    }
}

impl fmt::Display for EventIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventIdStrategy::Timestamp => write!(f, "timestamp"),
            EventIdStrategy::Uuid => write!(f, "uuid"),
        }
    }
}

/// Fractional epoch seconds at microsecond resolution, always with a decimal point.
fn timestamp_id(now: DateTime<Utc>) -> String {
    let seconds =
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0;
    let text = seconds.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event stamped with the current UTC time.
    pub fn new(id_strategy: EventIdStrategy, name: String, description: String) -> Self {
        Self::created_at(id_strategy, name, description, Utc::now())
    }

    /// Create a new event stamped with the given time.
    pub fn created_at(
        id_strategy: EventIdStrategy,
        name: String,
        description: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: id_strategy.generate(now),
            name,
            description,
            created_at: now,
        }
    }

    /// The JSON document written to the store.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Create event request payload.
///
/// Both fields are optional at parse time so that a missing field can be
/// reported separately from a malformed body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateEventRequest {
    /// Return `(name, description)` when both are present and non-empty.
    pub fn validate(self) -> Result<(String, String)> {
        match (self.name, self.description) {
            (Some(name), Some(description)) if !name.is_empty() && !description.is_empty() => {
                Ok((name, description))
            }
            _ => Err(Error::Validation(
                "name and description are required".to_string(),
            )),
        }
    }
}

/// Create event response payload.
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub message: String,
    pub event_id: String,
}

impl CreateEventResponse {
    pub fn created(event_id: impl Into<String>) -> Self {
        Self {
            message: EVENT_CREATED_MESSAGE.to_string(),
            event_id: event_id.into(),
        }
    }
}
