//! Shared library for the event Lambda functions.
//!
//! This crate provides the event model, the document store clients and the
//! request handlers used by the `create_event` and `get_events` functions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{CreateEventRequest, CreateEventResponse, Event, EventIdStrategy};
pub use store::{CosmosEventStore, EventStore, MemoryEventStore};
