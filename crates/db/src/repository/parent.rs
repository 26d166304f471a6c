//! Parent (1-depth) item repository

use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{map_not_found, next_sequence_number, parse_label};
use crate::error::{DbError, DbResult};
use crate::models::{Category, NewParent, ParentItem, ParentStatus, ParentUpdate};
use crate::notion::{Direction, NotionApi, Page, QueryRequest, query_all};
use crate::schema::{
    PARENT_PROPERTIES, Properties, number_value, parent, select_value, status_value, title_value,
};

const KIND: &str = "Parent item";

/// Decode a parent page, validating it against the property table.
pub fn decode_parent(page: &Page) -> DbResult<ParentItem> {
    let props = Properties::new(page);
    props.check(PARENT_PROPERTIES)?;

    let status = match props.status(parent::STATUS)? {
        Some(label) => parse_label(parent::STATUS, label, ParentStatus::from_label)?,
        None => {
            warn!(page_id = %page.id, "parent page has no status, using default");
            ParentStatus::Waiting
        }
    };
    let category = props
        .select(parent::CATEGORY)?
        .map(|label| parse_label(parent::CATEGORY, label, Category::from_label))
        .transpose()?;

    Ok(ParentItem {
        id: page.id.clone(),
        title: props.title(parent::TITLE)?,
        sequence_number: props.number(parent::SEQUENCE)?.unwrap_or(0.0) as i64,
        category,
        status,
        created_time: props.created_time(parent::CREATED)?,
        child_ids: props.relation(parent::CHILDREN)?,
    })
}

/// Properties for `POST /pages` of a new parent.
pub fn encode_new_parent(item: &NewParent, sequence_number: i64) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(parent::TITLE.to_string(), title_value(&item.title));
    props.insert(parent::SEQUENCE.to_string(), number_value(sequence_number));
    props.insert(
        parent::CATEGORY.to_string(),
        select_value(Some(item.category.as_str())),
    );
    props.insert(parent::STATUS.to_string(), status_value(item.status.as_str()));
    props
}

/// Properties for `PATCH /pages/{id}`. Only fields set in the update appear.
pub fn encode_parent_update(update: &ParentUpdate) -> Map<String, Value> {
    let mut props = Map::new();
    if let Some(title) = &update.title {
        props.insert(parent::TITLE.to_string(), title_value(title));
    }
    if let Some(category) = update.category {
        props.insert(
            parent::CATEGORY.to_string(),
            select_value(Some(category.as_str())),
        );
    }
    if let Some(status) = update.status {
        props.insert(parent::STATUS.to_string(), status_value(status.as_str()));
    }
    props
}

/// Repository for parent items
pub struct ParentRepository<'a, A: NotionApi + ?Sized> {
    api: &'a A,
    database_id: &'a str,
    create_lock: &'a Mutex<()>,
}

impl<'a, A: NotionApi + ?Sized> ParentRepository<'a, A> {
    pub fn new(api: &'a A, database_id: &'a str, create_lock: &'a Mutex<()>) -> Self {
        Self {
            api,
            database_id,
            create_lock,
        }
    }

    /// List non-deleted parents in sequence order, optionally for one category.
    pub async fn list(&self, category: Option<Category>) -> DbResult<Vec<ParentItem>> {
        debug!(database_id = self.database_id, ?category, "listing parent items");
        let mut conditions = vec![json!({
            "property": parent::STATUS,
            "status": { "does_not_equal": ParentStatus::Deleted.as_str() }
        })];
        if let Some(category) = category {
            conditions.push(json!({
                "property": parent::CATEGORY,
                "select": { "equals": category.as_str() }
            }));
        }
        let request = QueryRequest::new()
            .with_filter(json!({ "and": conditions }))
            .sorted_by(parent::SEQUENCE, Direction::Ascending);

        query_all(self.api, self.database_id, request)
            .await?
            .iter()
            .map(decode_parent)
            .collect()
    }

    /// Fetch one parent. Deleted parents are reported as not found.
    pub async fn get(&self, id: &str) -> DbResult<ParentItem> {
        let page = self
            .api
            .retrieve_page(id)
            .await
            .map_err(|e| map_not_found(e, KIND, id))?;
        let item = decode_parent(&page)?;
        if item.status == ParentStatus::Deleted {
            return Err(DbError::NotFound {
                kind: KIND,
                id: id.to_string(),
            });
        }
        Ok(item)
    }

    pub async fn next_sequence_number(&self) -> DbResult<i64> {
        next_sequence_number(self.api, self.database_id, parent::SEQUENCE).await
    }

    /// Create a parent with the next sequence number.
    pub async fn create(&self, item: &NewParent) -> DbResult<ParentItem> {
        item.validate()?;

        // number assignment and page creation must not interleave
        let _guard = self.create_lock.lock().await;
        let sequence_number = self.next_sequence_number().await?;
        let page = self
            .api
            .create_page(self.database_id, encode_new_parent(item, sequence_number))
            .await?;
        let created = decode_parent(&page)?;

        info!(id = %created.id, sequence_number, "created parent item");
        Ok(created)
    }

    /// Apply a partial update. Deleted parents are reported as not found.
    pub async fn update(&self, id: &str, update: &ParentUpdate) -> DbResult<ParentItem> {
        update.validate()?;
        debug!(id, "updating parent item");

        self.get(id).await?;
        let updated = self.patch(id, encode_parent_update(update)).await?;
        info!(id, "updated parent item");
        Ok(updated)
    }

    /// Change only the status.
    pub async fn set_status(&self, id: &str, status: ParentStatus) -> DbResult<ParentItem> {
        self.update(id, &ParentUpdate::new().with_status(status))
            .await
    }

    /// Mark the parent deleted. It disappears from every later listing and
    /// can no longer be changed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        self.set_status(id, ParentStatus::Deleted).await?;
        info!(id, "soft-deleted parent item");
        Ok(())
    }

    async fn patch(&self, id: &str, properties: Map<String, Value>) -> DbResult<ParentItem> {
        let page = self
            .api
            .update_page(id, properties)
            .await
            .map_err(|e| map_not_found(e, KIND, id))?;
        decode_parent(&page)
    }
}
