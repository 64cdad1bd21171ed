//! HTTP helpers for the function handlers.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let body = serde_json::to_string(data)?;
    with_body(status, "application/json", body)
}

/// Create a JSON response, indented with two spaces.
pub fn pretty_json_response<T: Serialize>(
    status: u16,
    data: &T,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let body = serde_json::to_string_pretty(data)?;
    with_body(status, "application/json", body)
}

/// Create a plain-text response with the given status code and message.
pub fn text_response(
    status: u16,
    message: impl Into<String>,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    with_body(status, "text/plain", message.into())
}

fn with_body(
    status: u16,
    content_type: &str,
    body: String,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", content_type)
        .body(Body::from(body))?)
}

/// Parse a request body that must be a JSON object.
///
/// An empty body, invalid JSON, or any JSON value other than an object of
/// the expected shape is a validation error.
pub fn parse_json_object<T: DeserializeOwned>(body: &Body) -> Result<T> {
    let value: serde_json::Value = serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(Error::Validation("Expected a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| Error::Validation(format!("Invalid fields: {}", e)))
}
