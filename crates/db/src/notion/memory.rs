//! In-memory Notion double
//!
//! Implements the subset of database query semantics the tracker relies on:
//! `and`/`or` compound filters, `equals`/`does_not_equal` on select and
//! status properties, number sorts with empty values last, and cursor
//! pagination. Backs `Database::in_memory` for tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::{Direction, NotionApi, Page, QueryRequest, QueryResponse};
use crate::error::{DbError, DbResult};
use crate::schema::{PropertyKind, PropertySpec, find_spec};

/// Largest page Notion returns for a query
const NOTION_MAX_PAGE_SIZE: usize = 100;

#[derive(Default)]
struct Collection {
    schema: Option<&'static [PropertySpec]>,
    pages: Vec<Page>,
}

#[derive(Default)]
struct State {
    databases: HashMap<String, Collection>,
    next_id: u64,
    offline: bool,
    requests: Vec<String>,
}

/// Notion API held entirely in memory
pub struct MemoryNotion {
    state: Mutex<State>,
    max_page_size: usize,
}

impl Default for MemoryNotion {
    fn default() -> Self {
        Self::new()
    }
}

fn upstream(status: u16, code: &str, message: impl Into<String>) -> DbError {
    DbError::Upstream {
        status,
        code: Some(code.to_string()),
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> DbError {
    upstream(400, "validation_error", message)
}

fn page_not_found(page_id: &str) -> DbError {
    upstream(
        404,
        "object_not_found",
        format!("Could not find page with ID: {}.", page_id),
    )
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl MemoryNotion {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_page_size: NOTION_MAX_PAGE_SIZE,
        }
    }

    /// Cap the number of results per query page (to exercise pagination).
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.clamp(1, NOTION_MAX_PAGE_SIZE);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Declare a database with a property table.
    ///
    /// Pages created in it get every declared property, writes to
    /// undeclared or computed properties are rejected.
    pub fn register_database(&self, database_id: &str, schema: &'static [PropertySpec]) {
        let mut state = self.lock();
        state
            .databases
            .entry(database_id.to_string())
            .or_default()
            .schema = Some(schema);
    }

    /// Make every following request fail with 503 until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Store a page exactly as given, bypassing validation.
    pub fn insert_raw_page(&self, database_id: &str, page: Page) {
        let mut state = self.lock();
        state
            .databases
            .entry(database_id.to_string())
            .or_default()
            .pages
            .push(page);
    }

    /// Current stored copy of a page.
    pub fn page(&self, page_id: &str) -> Option<Page> {
        let state = self.lock();
        state
            .databases
            .values()
            .flat_map(|db| db.pages.iter())
            .find(|p| p.id == page_id)
            .cloned()
    }

    /// Every request received so far, as `METHOD path`.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    fn begin(&self, state: &mut State, request: String) -> DbResult<()> {
        state.requests.push(request);
        if state.offline {
            return Err(upstream(503, "service_unavailable", "Notion is unavailable"));
        }
        Ok(())
    }
}

/// Add the `type` tag and plain text the way Notion echoes written values.
fn normalize(kind: PropertyKind, mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("type".to_string(), Value::from(kind.key()));
        if matches!(kind, PropertyKind::Title | PropertyKind::RichText)
            && let Some(Value::Array(segments)) = map.get_mut(kind.key())
        {
            for segment in segments {
                let content = segment
                    .get("text")
                    .and_then(|t| t.get("content"))
                    .cloned();
                if let (Some(content), Value::Object(seg)) = (content, segment) {
                    seg.entry("plain_text").or_insert(content);
                }
            }
        }
    }
    value
}

fn apply_properties(
    schema: Option<&'static [PropertySpec]>,
    target: &mut Map<String, Value>,
    properties: Map<String, Value>,
) -> DbResult<()> {
    let Some(schema) = schema else {
        target.extend(properties);
        return Ok(());
    };

    for (name, value) in properties {
        let spec = find_spec(schema, &name).ok_or_else(|| {
            bad_request(format!("{} is not a property that exists.", name))
        })?;
        if spec.kind.is_read_only() {
            return Err(bad_request(format!("{} is a read-only property.", name)));
        }
        if value.get(spec.kind.key()).is_none() {
            return Err(bad_request(format!(
                "{} is expected to be {}.",
                name,
                spec.kind.key()
            )));
        }
        target.insert(name, normalize(spec.kind, value));
    }
    Ok(())
}

fn touch(schema: Option<&'static [PropertySpec]>, page: &mut Page, timestamp: &str) {
    page.last_edited_time = Some(timestamp.to_string());
    for spec in schema.unwrap_or_default() {
        if spec.kind == PropertyKind::LastEditedTime {
            page.properties.insert(
                spec.name.to_string(),
                normalize(spec.kind, serde_json::json!({ "last_edited_time": timestamp })),
            );
        }
    }
}

fn option_name<'p>(page: &'p Page, property: &str, key: &str) -> Option<&'p str> {
    page.properties
        .get(property)
        .and_then(|p| p.get(key))
        .and_then(|o| o.get("name"))
        .and_then(Value::as_str)
}

fn matches_filter(
    filter: &Value,
    page: &Page,
    schema: Option<&'static [PropertySpec]>,
) -> DbResult<bool> {
    if let Some(all) = filter.get("and").and_then(Value::as_array) {
        for f in all {
            if !matches_filter(f, page, schema)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if let Some(any) = filter.get("or").and_then(Value::as_array) {
        for f in any {
            if matches_filter(f, page, schema)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    let property = filter
        .get("property")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("filter needs a property or a compound condition"))?;
    if let Some(schema) = schema
        && find_spec(schema, property).is_none()
    {
        return Err(bad_request(format!(
            "Could not find property with name or id: {}",
            property
        )));
    }

    for key in ["status", "select"] {
        let Some(condition) = filter.get(key) else {
            continue;
        };
        let current = option_name(page, property, key);
        if let Some(expected) = condition.get("equals").and_then(Value::as_str) {
            return Ok(current == Some(expected));
        }
        if let Some(expected) = condition.get("does_not_equal").and_then(Value::as_str) {
            return Ok(current != Some(expected));
        }
        return Err(bad_request(format!(
            "unsupported {} condition on {}",
            key, property
        )));
    }

    Err(bad_request(format!("unsupported filter on {}", property)))
}

fn sort_number(page: &Page, property: &str) -> Option<f64> {
    page.properties
        .get(property)
        .and_then(|p| p.get("number"))
        .and_then(Value::as_f64)
}

fn compare_pages(a: &Page, b: &Page, request: &QueryRequest) -> Ordering {
    for sort in &request.sorts {
        let ordering = match (
            sort_number(a, &sort.property),
            sort_number(b, &sort.property),
        ) {
            (Some(x), Some(y)) => {
                let o = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match sort.direction {
                    Direction::Ascending => o,
                    Direction::Descending => o.reverse(),
                }
            }
            // empty values sort last in either direction
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl NotionApi for MemoryNotion {
    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> DbResult<QueryResponse> {
        let mut state = self.lock();
        self.begin(&mut state, format!("POST databases/{}/query", database_id))?;

        let collection = state.databases.get(database_id).ok_or_else(|| {
            upstream(
                404,
                "object_not_found",
                format!("Could not find database with ID: {}.", database_id),
            )
        })?;

        let mut matched = Vec::new();
        for page in &collection.pages {
            let keep = match &request.filter {
                Some(filter) => matches_filter(filter, page, collection.schema)?,
                None => true,
            };
            if keep {
                matched.push(page);
            }
        }
        matched.sort_by(|a, b| compare_pages(a, b, request));

        let start = match &request.start_cursor {
            Some(cursor) => matched
                .iter()
                .position(|p| &p.id == cursor)
                .ok_or_else(|| bad_request("start_cursor provided is invalid"))?,
            None => 0,
        };
        let size = request
            .page_size
            .map(|n| n as usize)
            .unwrap_or(NOTION_MAX_PAGE_SIZE)
            .clamp(1, self.max_page_size);
        let end = (start + size).min(matched.len());
        let has_more = end < matched.len();

        Ok(QueryResponse {
            results: matched[start..end].iter().map(|p| (*p).clone()).collect(),
            has_more,
            next_cursor: has_more.then(|| matched[end].id.clone()),
        })
    }

    async fn retrieve_page(&self, page_id: &str) -> DbResult<Page> {
        let mut state = self.lock();
        self.begin(&mut state, format!("GET pages/{}", page_id))?;
        state
            .databases
            .values()
            .flat_map(|db| db.pages.iter())
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| page_not_found(page_id))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> DbResult<Page> {
        let mut state = self.lock();
        self.begin(&mut state, "POST pages".to_string())?;

        state.next_id += 1;
        let id = format!("00000000-0000-4000-8000-{:012x}", state.next_id);
        let timestamp = now();

        let collection = state.databases.entry(database_id.to_string()).or_default();
        let mut page = Page {
            id,
            created_time: Some(timestamp.clone()),
            last_edited_time: Some(timestamp.clone()),
            properties: Map::new(),
        };
        for spec in collection.schema.unwrap_or_default() {
            let value = match spec.kind {
                PropertyKind::CreatedTime => {
                    normalize(spec.kind, serde_json::json!({ "created_time": timestamp }))
                }
                _ => spec.kind.empty_value(),
            };
            page.properties.insert(spec.name.to_string(), value);
        }
        apply_properties(collection.schema, &mut page.properties, properties)?;
        touch(collection.schema, &mut page, &timestamp);

        collection.pages.push(page.clone());
        Ok(page)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> DbResult<Page> {
        let mut state = self.lock();
        self.begin(&mut state, format!("PATCH pages/{}", page_id))?;

        for collection in state.databases.values_mut() {
            let schema = collection.schema;
            if let Some(page) = collection.pages.iter_mut().find(|p| p.id == page_id) {
                // validate against a copy so a rejected patch changes nothing
                let mut patched = page.properties.clone();
                apply_properties(schema, &mut patched, properties)?;
                page.properties = patched;
                touch(schema, page, &now());
                return Ok(page.clone());
            }
        }
        Err(page_not_found(page_id))
    }
}
