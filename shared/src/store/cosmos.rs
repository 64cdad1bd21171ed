//! Cosmos DB (SQL API) event store over the REST interface.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::OnceCell;
use tracing::info;

use super::EventStore;
use crate::{Config, Error, Result};

const API_VERSION: &str = "2018-12-31";
const QUERY_ALL: &str = "SELECT * FROM c";

type HmacSha256 = Hmac<Sha256>;

/// One page of a document query.
#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

/// [EventStore] backed by a Cosmos DB container.
///
/// Created once per process and shared across invocations. The container's
/// partition key path is fetched on first write and cached.
pub struct CosmosEventStore {
    http: reqwest::Client,
    endpoint: String,
    key: Vec<u8>,
    /// `dbs/{database}/colls/{container}`
    collection_link: String,
    partition_key_path: OnceCell<Option<Vec<String>>>,
}

impl CosmosEventStore {
    /// Create a store client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let key = BASE64
            .decode(config.cosmos_key.trim())
            .map_err(|e| Error::Config(format!("COSMOS_DB_KEY is not valid base64: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.cosmos_url.trim_end_matches('/').to_string(),
            key,
            collection_link: format!(
                "dbs/{}/colls/{}",
                config.database_name, config.container_name
            ),
            partition_key_path: OnceCell::new(),
        })
    }

    fn docs_path(&self) -> String {
        format!("{}/docs", self.collection_link)
    }

    /// Build a signed request for `path`, authorized against `resource_link`.
    fn request(
        &self,
        method: Method,
        resource_type: &str,
        resource_link: &str,
        path: &str,
    ) -> Result<RequestBuilder> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let token = master_key_token(
            &self.key,
            method.as_str(),
            resource_type,
            resource_link,
            &date,
        )?;

        Ok(self
            .http
            .request(method, format!("{}/{}", self.endpoint, path))
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header(AUTHORIZATION, token))
    }

    /// Partition key path segments of the container, `None` if it has none.
    async fn partition_key_path(&self) -> Result<Option<&[String]>> {
        let path = self
            .partition_key_path
            .get_or_try_init(|| async {
                let response = self
                    .request(
                        Method::GET,
                        "colls",
                        &self.collection_link,
                        &self.collection_link,
                    )?
                    .send()
                    .await?;
                let container: Value = check(response).await?.json().await?;
                let path = container
                    .pointer("/partitionKey/paths/0")
                    .and_then(Value::as_str)
                    .map(split_path);

                info!(
                    "Container {} partition key path: {:?}",
                    self.collection_link, path
                );
                Ok::<_, Error>(path)
            })
            .await?;

        Ok(path.as_deref())
    }
}

#[async_trait]
impl EventStore for CosmosEventStore {
    async fn upsert(&self, document: &Value) -> Result<()> {
        let document = with_identity(document)?;

        let mut request = self
            .request(Method::POST, "docs", &self.collection_link, &self.docs_path())?
            .header("x-ms-documentdb-is-upsert", "True")
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(&document)?);

        if let Some(segments) = self.partition_key_path().await? {
            request = request.header(
                "x-ms-documentdb-partitionkey",
                partition_key_header(&document, segments)?,
            );
        }

        check(request.send().await?).await?;
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Value>> {
        let body = serde_json::to_string(&json!({ "query": QUERY_ALL, "parameters": [] }))?;
        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::POST, "docs", &self.collection_link, &self.docs_path())?
                .header("x-ms-documentdb-isquery", "True")
                .header("x-ms-documentdb-query-enablecrosspartition", "True")
                .header(CONTENT_TYPE, "application/query+json")
                .body(body.clone());

            if let Some(token) = &continuation {
                request = request.header("x-ms-continuation", token.as_str());
            }

            let response = check(request.send().await?).await?;
            continuation = response
                .headers()
                .get("x-ms-continuation")
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let page: QueryPage = response.json().await?;
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

/// Authorization header value for a master-key signed request.
fn master_key_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::Config(format!("Invalid Cosmos DB key: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    Ok(urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned())
}

/// Copy of `document` with Cosmos DB's `id` set from `event_id` when absent.
fn with_identity(document: &Value) -> Result<Value> {
    let mut document = document.clone();
    let object = document
        .as_object_mut()
        .ok_or_else(|| Error::Internal("document must be a JSON object".to_string()))?;

    if !object.contains_key("id") {
        let id = object
            .get("event_id")
            .cloned()
            .ok_or_else(|| Error::Internal("document has no event_id".to_string()))?;
        object.insert("id".to_string(), id);
    }

    Ok(document)
}

/// `/a/b` -> `["a", "b"]`
fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.trim_matches('"').to_string())
        .collect()
}

/// JSON array header carrying the document's partition key value.
///
/// A document without the key is written with the undefined partition key `{}`.
fn partition_key_header(document: &Value, segments: &[String]) -> Result<String> {
    let value = segments
        .iter()
        .try_fold(document, |current, segment| current.get(segment.as_str()))
        .cloned()
        .unwrap_or_else(|| json!({}));

    Ok(serde_json::to_string(&json!([value]))?)
}

/// Turn a non-success response into an error.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);

    if status == StatusCode::CONFLICT {
        Err(Error::Conflict(message))
    } else {
        Err(Error::Store {
            status: status.as_u16(),
            message,
        })
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
