//! HTTP client for the Notion REST API.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use super::{NotionApi, Page, QueryRequest, QueryResponse};
use crate::config::NotionConfig;
use crate::error::{DbError, DbResult};

/// Protocol version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Notion client injecting the bearer credential and version header.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl NotionClient {
    /// Create a client from a resolved configuration.
    pub fn new(config: &NotionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// Base URL requests are sent to (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> DbResult<T> {
        let url = self.url(path);
        debug!(method = %method, path, "notion request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = &body {
            trace!(bytes = body.to_string().len(), "notion request body");
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &text));
        }

        debug!(status = status.as_u16(), "notion response");
        trace!(bytes = text.len(), "notion response body");
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map a non-success response body to `DbError::Upstream`.
fn upstream_error(status: u16, body: &str) -> DbError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { code, message }) => DbError::Upstream {
            status,
            code,
            message: message.unwrap_or_else(|| body.to_string()),
        },
        Err(_) => DbError::Upstream {
            status,
            code: None,
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> DbResult<QueryResponse> {
        let body = serde_json::to_value(request)?;
        self.send(
            Method::POST,
            &format!("databases/{}/query", database_id),
            Some(body),
        )
        .await
    }

    async fn retrieve_page(&self, page_id: &str) -> DbResult<Page> {
        self.send(Method::GET, &format!("pages/{}", page_id), None)
            .await
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> DbResult<Page> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        self.send(Method::POST, "pages", Some(body)).await
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> DbResult<Page> {
        let body = json!({ "properties": properties });
        self.send(Method::PATCH, &format!("pages/{}", page_id), Some(body))
            .await
    }
}
