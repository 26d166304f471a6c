//! Child (2-depth) item repository

use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{map_not_found, next_sequence_number, parse_label};
use crate::error::{DbError, DbResult};
use crate::models::{Assignee, ChildItem, ChildUpdate, NewChild, ProgressStatus};
use crate::notion::{Direction, NotionApi, Page, QueryRequest, query_all};
use crate::schema::{
    CHILD_PROPERTIES, Properties, child, date_value, multi_select_value, number_value,
    parse_timestamp, relation_value, rich_text_value, select_value, title_value,
};

const KIND: &str = "Child item";

/// Decode a child page, validating it against the property table.
pub fn decode_child(page: &Page) -> DbResult<ChildItem> {
    let props = Properties::new(page);
    props.check(CHILD_PROPERTIES)?;

    let progress_status = match props.select(child::STATUS)? {
        Some(label) => parse_label(child::STATUS, label, ProgressStatus::from_label)?,
        None => {
            warn!(page_id = %page.id, "child page has no progress status, using default");
            ProgressStatus::Idea
        }
    };
    let assignees = props
        .multi_select(child::ASSIGNEES)?
        .into_iter()
        .map(|label| parse_label(child::ASSIGNEES, label, Assignee::from_label))
        .collect::<DbResult<Vec<_>>>()?;

    Ok(ChildItem {
        id: page.id.clone(),
        title: props.title(child::TITLE)?,
        sequence_number: props.number(child::SEQUENCE)?.unwrap_or(0.0) as i64,
        parent_id: props.relation(child::PARENT)?.into_iter().next(),
        assignees,
        progress_status,
        plan_start_date: props.date(child::PLAN_START)?,
        plan_end_date: props.date(child::PLAN_END)?,
        actual_start_date: props.date(child::ACTUAL_START)?,
        actual_end_date: props.date(child::ACTUAL_END)?,
        precedent_item_id: props.relation(child::PRECEDENT)?.into_iter().next(),
        details: props.rich_text(child::DETAILS)?,
        unique_notes: props.rich_text(child::NOTES)?,
        last_modified_by: props
            .select(child::MODIFIED_BY)?
            .unwrap_or_default()
            .to_string(),
        last_modified_at: props
            .last_edited_time(child::MODIFIED_AT)?
            .or_else(|| page.last_edited_time.as_deref().and_then(parse_timestamp)),
    })
}

/// Properties for `POST /pages` of a new child. Empty optional fields are omitted.
pub fn encode_new_child(item: &NewChild, sequence_number: i64) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(child::TITLE.to_string(), title_value(&item.title));
    props.insert(child::SEQUENCE.to_string(), number_value(sequence_number));
    props.insert(
        child::PARENT.to_string(),
        relation_value([item.parent_id.as_str()]),
    );
    props.insert(
        child::STATUS.to_string(),
        select_value(Some(item.progress_status.as_str())),
    );
    if !item.assignees.is_empty() {
        props.insert(
            child::ASSIGNEES.to_string(),
            multi_select_value(item.assignees.iter().map(|a| a.as_str())),
        );
    }
    if item.plan_start_date.is_some() {
        props.insert(child::PLAN_START.to_string(), date_value(item.plan_start_date));
    }
    if item.plan_end_date.is_some() {
        props.insert(child::PLAN_END.to_string(), date_value(item.plan_end_date));
    }
    if !item.details.is_empty() {
        props.insert(child::DETAILS.to_string(), rich_text_value(&item.details));
    }
    if !item.unique_notes.is_empty() {
        props.insert(child::NOTES.to_string(), rich_text_value(&item.unique_notes));
    }
    if let Some(precedent) = &item.precedent_item_id {
        props.insert(
            child::PRECEDENT.to_string(),
            relation_value([precedent.as_str()]),
        );
    }
    props
}

/// Properties for `PATCH /pages/{id}`.
///
/// Fields absent from the update are not sent; cleared dates are sent as
/// `{"date": null}` and a cleared precedent as `{"relation": []}`.
pub fn encode_child_update(update: &ChildUpdate) -> Map<String, Value> {
    let mut props = Map::new();
    if let Some(title) = &update.title {
        props.insert(child::TITLE.to_string(), title_value(title));
    }
    if let Some(parent_id) = &update.parent_id {
        props.insert(
            child::PARENT.to_string(),
            relation_value([parent_id.as_str()]),
        );
    }
    if let Some(assignees) = &update.assignees {
        props.insert(
            child::ASSIGNEES.to_string(),
            multi_select_value(assignees.iter().map(|a| a.as_str())),
        );
    }
    if let Some(status) = update.progress_status {
        props.insert(
            child::STATUS.to_string(),
            select_value(Some(status.as_str())),
        );
    }
    for (name, date) in [
        (child::PLAN_START, update.plan_start_date),
        (child::PLAN_END, update.plan_end_date),
        (child::ACTUAL_START, update.actual_start_date),
        (child::ACTUAL_END, update.actual_end_date),
    ] {
        if let Some(date) = date {
            props.insert(name.to_string(), date_value(date));
        }
    }
    if let Some(details) = &update.details {
        props.insert(child::DETAILS.to_string(), rich_text_value(details));
    }
    if let Some(notes) = &update.unique_notes {
        props.insert(child::NOTES.to_string(), rich_text_value(notes));
    }
    if let Some(precedent) = &update.precedent_item_id {
        props.insert(
            child::PRECEDENT.to_string(),
            relation_value(precedent.as_deref()),
        );
    }
    props
}

/// Repository for child items
pub struct ChildRepository<'a, A: NotionApi + ?Sized> {
    api: &'a A,
    database_id: &'a str,
    create_lock: &'a Mutex<()>,
}

impl<'a, A: NotionApi + ?Sized> ChildRepository<'a, A> {
    pub fn new(api: &'a A, database_id: &'a str, create_lock: &'a Mutex<()>) -> Self {
        Self {
            api,
            database_id,
            create_lock,
        }
    }

    /// List every non-deleted child in sequence order.
    pub async fn list(&self) -> DbResult<Vec<ChildItem>> {
        debug!(database_id = self.database_id, "listing child items");
        let request = QueryRequest::new()
            .with_filter(json!({
                "property": child::STATUS,
                "select": { "does_not_equal": ProgressStatus::Deleted.as_str() }
            }))
            .sorted_by(child::SEQUENCE, Direction::Ascending);

        query_all(self.api, self.database_id, request)
            .await?
            .iter()
            .map(decode_child)
            .collect()
    }

    /// Fetch one child. Deleted children are reported as not found.
    pub async fn get(&self, id: &str) -> DbResult<ChildItem> {
        let page = self
            .api
            .retrieve_page(id)
            .await
            .map_err(|e| map_not_found(e, KIND, id))?;
        let item = decode_child(&page)?;
        if item.is_deleted() {
            return Err(DbError::NotFound {
                kind: KIND,
                id: id.to_string(),
            });
        }
        Ok(item)
    }

    pub async fn next_sequence_number(&self) -> DbResult<i64> {
        next_sequence_number(self.api, self.database_id, child::SEQUENCE).await
    }

    /// Create a child with the next sequence number.
    pub async fn create(&self, item: &NewChild) -> DbResult<ChildItem> {
        item.validate()?;

        // number assignment and page creation must not interleave
        let _guard = self.create_lock.lock().await;
        let sequence_number = self.next_sequence_number().await?;
        let page = self
            .api
            .create_page(self.database_id, encode_new_child(item, sequence_number))
            .await?;
        let created = decode_child(&page)?;

        info!(id = %created.id, sequence_number, "created child item");
        Ok(created)
    }

    /// Apply a partial update. Deleted children are reported as not found.
    ///
    /// When the update touches the status or the actual dates, the stored
    /// status is re-derived: an actual end date means done, otherwise an
    /// actual start date means in progress.
    pub async fn update(&self, id: &str, update: &ChildUpdate) -> DbResult<ChildItem> {
        update.validate()?;
        debug!(id, "updating child item");

        let current = self.get(id).await?;
        let mut update = update.clone();
        if update.progress_status.is_some()
            || update.actual_start_date.is_some()
            || update.actual_end_date.is_some()
        {
            let start = update.actual_start_date.unwrap_or(current.actual_start_date);
            let end = update.actual_end_date.unwrap_or(current.actual_end_date);
            let chosen = update.progress_status.unwrap_or(current.progress_status);
            let derived = ProgressStatus::derive_from_actual(start, end, chosen);
            if derived != current.progress_status || update.progress_status.is_some() {
                update.progress_status = Some(derived);
            }
        }

        let updated = self.patch(id, encode_child_update(&update)).await?;
        info!(id, status = %updated.progress_status, "updated child item");
        Ok(updated)
    }

    /// Change only the status, without deriving it from dates.
    pub async fn set_status(&self, id: &str, status: ProgressStatus) -> DbResult<ChildItem> {
        self.get(id).await?;
        let updated = self.patch(id, status_properties(status)).await?;
        info!(id, status = %status, "changed child status");
        Ok(updated)
    }

    /// Mark the child deleted. It disappears from every later listing and
    /// can no longer be changed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        self.get(id).await?;
        self.patch(id, status_properties(ProgressStatus::Deleted))
            .await?;
        info!(id, "soft-deleted child item");
        Ok(())
    }

    async fn patch(&self, id: &str, properties: Map<String, Value>) -> DbResult<ChildItem> {
        let page = self
            .api
            .update_page(id, properties)
            .await
            .map_err(|e| map_not_found(e, KIND, id))?;
        decode_child(&page)
    }
}

fn status_properties(status: ProgressStatus) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(
        child::STATUS.to_string(),
        select_value(Some(status.as_str())),
    );
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::MemoryNotion;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        api: MemoryNotion,
        lock: Mutex<()>,
    }

    impl Fixture {
        fn new() -> Self {
            let api = MemoryNotion::new();
            api.register_database("children", CHILD_PROPERTIES);
            Self {
                api,
                lock: Mutex::new(()),
            }
        }

        fn repo(&self) -> ChildRepository<'_, MemoryNotion> {
            ChildRepository::new(&self.api, "children", &self.lock)
        }
    }

    #[tokio::test]
    async fn test_create_and_decode_all_fields() {
        let f = Fixture::new();
        let repo = f.repo();
        let first = repo.create(&NewChild::new("T0", "p1")).await.unwrap();
        let created = repo
            .create(
                &NewChild::new("T1", "p1")
                    .with_assignees([Assignee::Sanghyuk, Assignee::Jongok])
                    .with_status(ProgressStatus::Reviewing)
                    .with_plan(Some(date(2025, 3, 1)), Some(date(2025, 3, 10)))
                    .with_details("line one\nline two")
                    .with_unique_notes("note")
                    .with_precedent(first.id.clone()),
            )
            .await
            .unwrap();

        assert_eq!(created.sequence_number, 2);
        assert_eq!(created.parent_id.as_deref(), Some("p1"));
        assert_eq!(created.assignees, vec![Assignee::Sanghyuk, Assignee::Jongok]);
        assert_eq!(created.progress_status, ProgressStatus::Reviewing);
        assert_eq!(created.plan_start_date, Some(date(2025, 3, 1)));
        assert_eq!(created.plan_end_date, Some(date(2025, 3, 10)));
        assert_eq!(created.actual_start_date, None);
        assert_eq!(created.details, "line one\nline two");
        assert_eq!(created.unique_notes, "note");
        assert_eq!(created.precedent_item_id, Some(first.id));
        assert!(created.last_modified_at.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_assignees() {
        let f = Fixture::new();
        let err = f
            .repo()
            .create(&NewChild::new("T1", "p1").with_assignees([
                Assignee::Sanghyuk,
                Assignee::Gwangcheol,
                Assignee::Jongok,
                Assignee::Other,
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
        assert!(f.api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_removes_from_list() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        repo.create(&NewChild::new("B", "p1")).await.unwrap();

        repo.soft_delete(&a.id).await.unwrap();

        let stored = f.api.page(&a.id).unwrap();
        assert_eq!(stored.properties[child::STATUS]["select"]["name"], json!("삭제"));
        let titles: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["B"]);
    }

    #[tokio::test]
    async fn test_update_clears_dates_and_precedent() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        let b = repo
            .create(
                &NewChild::new("B", "p1")
                    .with_plan(Some(date(2025, 1, 1)), Some(date(2025, 1, 5)))
                    .with_precedent(a.id.clone()),
            )
            .await
            .unwrap();

        let updated = repo
            .update(
                &b.id,
                &ChildUpdate::new().with_plan_start(None).with_precedent(None),
            )
            .await
            .unwrap();
        assert_eq!(updated.plan_start_date, None);
        assert_eq!(updated.plan_end_date, Some(date(2025, 1, 5)));
        assert_eq!(updated.precedent_item_id, None);
    }

    #[test]
    fn test_encode_update_clear_shapes() {
        let props = encode_child_update(
            &ChildUpdate::new()
                .with_actual_end(None)
                .with_precedent(None),
        );
        assert_eq!(props.len(), 2);
        assert_eq!(props[child::ACTUAL_END], json!({"date": null}));
        assert_eq!(props[child::PRECEDENT], json!({"relation": []}));
    }

    #[tokio::test]
    async fn test_actual_end_forces_done() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        let updated = repo
            .update(&a.id, &ChildUpdate::new().with_actual_end(Some(date(2025, 2, 1))))
            .await
            .unwrap();
        assert_eq!(updated.progress_status, ProgressStatus::Done);
    }

    #[tokio::test]
    async fn test_actual_start_forces_in_progress_over_chosen_status() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        repo.update(&a.id, &ChildUpdate::new().with_actual_start(Some(date(2025, 2, 1))))
            .await
            .unwrap();

        let updated = repo
            .update(&a.id, &ChildUpdate::new().with_status(ProgressStatus::Idea))
            .await
            .unwrap();
        assert_eq!(updated.progress_status, ProgressStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_checks_target_then_patches() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        let before = f.api.requests().len();
        repo.update(&a.id, &ChildUpdate::new().with_details("more"))
            .await
            .unwrap();
        assert_eq!(f.api.requests().len(), before + 2);
    }

    #[tokio::test]
    async fn test_deleted_child_cannot_be_changed() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        repo.soft_delete(&a.id).await.unwrap();

        let err = repo
            .update(&a.id, &ChildUpdate::new().with_title("renamed"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err = repo.set_status(&a.id, ProgressStatus::Done).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        let err = repo.soft_delete(&a.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert!(repo.list().await.unwrap().is_empty());
        let stored = decode_child(&f.api.page(&a.id).unwrap()).unwrap();
        assert_eq!(stored.title, "A");
        assert!(stored.is_deleted());
    }

    #[tokio::test]
    async fn test_set_status_does_not_derive() {
        let f = Fixture::new();
        let repo = f.repo();
        let a = repo.create(&NewChild::new("A", "p1")).await.unwrap();
        repo.update(&a.id, &ChildUpdate::new().with_actual_end(Some(date(2025, 2, 1))))
            .await
            .unwrap();
        let updated = repo.set_status(&a.id, ProgressStatus::OnHold).await.unwrap();
        assert_eq!(updated.progress_status, ProgressStatus::OnHold);
    }

    #[tokio::test]
    async fn test_update_missing_child() {
        let f = Fixture::new();
        let err = f
            .repo()
            .update("missing", &ChildUpdate::new().with_title("x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Child item 'missing' not found");
    }

    #[tokio::test]
    async fn test_list_follows_pagination() {
        let api = MemoryNotion::new().with_max_page_size(2);
        api.register_database("children", CHILD_PROPERTIES);
        let lock = Mutex::new(());
        let repo = ChildRepository::new(&api, "children", &lock);
        for i in 0..5 {
            repo.create(&NewChild::new(format!("T{}", i), "p1"))
                .await
                .unwrap();
        }
        let listed = repo.list().await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|c| c.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_decode_unknown_assignee_is_schema_error() {
        let mut page = Page {
            id: "c1".to_string(),
            created_time: None,
            last_edited_time: None,
            properties: Map::new(),
        };
        for spec in CHILD_PROPERTIES {
            page.properties
                .insert(spec.name.to_string(), spec.kind.empty_value());
        }
        page.properties.insert(
            child::ASSIGNEES.to_string(),
            json!({"type": "multi_select", "multi_select": [{"name": "외부인"}]}),
        );
        let err = decode_child(&page).unwrap_err();
        assert!(matches!(err, DbError::Schema { property: "담당자", .. }));
    }
}
