//! Notion API access
//!
//! The [`NotionApi`] trait is the only seam through which the crate
//! touches the network. [`NotionClient`] talks HTTP to the real API;
//! [`MemoryNotion`] keeps pages in memory with the same query semantics.

mod client;
mod memory;

pub use client::{NOTION_VERSION, NotionClient};
pub use memory::MemoryNotion;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::DbResult;

/// A page record as returned by Notion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Sort direction for database queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// A property sort in a database query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

/// Body of `POST /databases/{id}/query`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sorted_by(mut self, property: &str, direction: Direction) -> Self {
        self.sorts.push(Sort {
            property: property.to_string(),
            direction,
        });
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Raw Notion operations used by the repositories
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Run one page of a database query.
    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> DbResult<QueryResponse>;

    /// Fetch a single page by id.
    async fn retrieve_page(&self, page_id: &str) -> DbResult<Page>;

    /// Create a page in a database.
    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> DbResult<Page>;

    /// Patch the given properties of a page. Properties not listed are untouched.
    async fn update_page(&self, page_id: &str, properties: Map<String, Value>)
    -> DbResult<Page>;
}

/// Run a query and follow `next_cursor` until every result is collected.
///
/// When the request sets `page_size` only the first page is returned.
pub async fn query_all<A: NotionApi + ?Sized>(
    api: &A,
    database_id: &str,
    request: QueryRequest,
) -> DbResult<Vec<Page>> {
    let limited = request.page_size.is_some();
    let mut request = request;
    let mut pages = Vec::new();

    loop {
        let response = api.query_database(database_id, &request).await?;
        trace!(
            database_id,
            count = response.results.len(),
            has_more = response.has_more,
            "query page received"
        );
        pages.extend(response.results);

        match response.next_cursor {
            Some(cursor) if response.has_more && !limited => {
                request.start_cursor = Some(cursor);
            }
            _ => break,
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_serializes_only_set_fields() {
        let request = QueryRequest::new()
            .with_filter(json!({"property": "Status", "status": {"does_not_equal": "삭제"}}))
            .sorted_by("순번 (ID)", Direction::Ascending);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "filter": {"property": "Status", "status": {"does_not_equal": "삭제"}},
                "sorts": [{"property": "순번 (ID)", "direction": "ascending"}]
            })
        );
    }

    #[test]
    fn test_query_request_page_size() {
        let request = QueryRequest::new()
            .sorted_by("순번 (ID)", Direction::Descending)
            .with_page_size(1);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["page_size"], json!(1));
        assert!(value.get("filter").is_none());
        assert!(value.get("start_cursor").is_none());
    }

    #[test]
    fn test_query_response_defaults() {
        let response: QueryResponse = serde_json::from_str(r#"{"object": "list"}"#).unwrap();
        assert!(response.results.is_empty());
        assert!(!response.has_more);
        assert!(response.next_cursor.is_none());
    }

    #[test]
    fn test_page_deserializes_notion_shape() {
        let page: Page = serde_json::from_value(json!({
            "object": "page",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "created_time": "2025-01-02T03:04:00.000Z",
            "last_edited_time": "2025-01-03T03:04:00.000Z",
            "archived": false,
            "properties": {
                "Status": {"id": "abc", "type": "status", "status": {"name": "대기"}}
            }
        }))
        .unwrap();
        assert_eq!(page.id, "59833787-2cf9-4fdf-8782-e53db20768a5");
        assert_eq!(page.properties["Status"]["status"]["name"], json!("대기"));
    }

    #[tokio::test]
    async fn test_query_all_follows_cursor() {
        let api = MemoryNotion::new().with_max_page_size(2);
        for n in 0..5 {
            let mut props = Map::new();
            props.insert("n".to_string(), json!({"number": n}));
            api.create_page("db", props).await.unwrap();
        }

        let pages = query_all(&api, "db", QueryRequest::new()).await.unwrap();
        assert_eq!(pages.len(), 5);
    }

    #[tokio::test]
    async fn test_query_all_respects_page_size() {
        let api = MemoryNotion::new().with_max_page_size(2);
        for _ in 0..5 {
            api.create_page("db", Map::new()).await.unwrap();
        }

        let pages = query_all(&api, "db", QueryRequest::new().with_page_size(1))
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
    }
}
