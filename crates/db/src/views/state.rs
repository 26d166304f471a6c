//! Application state container
//!
//! Holds the category tab, active view, table sort and filters, and the two
//! loaded collections. View changes go through [`AppState::apply`]; the
//! collections only change through [`AppState::refresh`].

use chrono::NaiveDate;
use tracing::{info, warn};

use super::hierarchy::{ListView, build_list, filter_by_category};
use super::stats::{Statistics, StatsWindow};
use super::table::{Column, SortState, TableFilter, TableRow, build_rows};
use super::timeline::TimelineLayout;
use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::{Category, ChildItem, ParentItem};
use crate::notion::NotionApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    Table,
    Timeline,
    Stats,
}

/// State transitions that do not touch the upstream
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectCategory(Option<Category>),
    SelectView(View),
    /// Sort by a column, flipping direction when it is already selected
    SortBy(Column),
    ResetSort,
    SetFilter(TableFilter),
    ClearFilter,
    SetStatsWindow(StatsWindow),
    DismissError,
}

/// Answer to a destructive prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl Confirmation {
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Confirmation::Confirmed,
            _ => Confirmation::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub category: Option<Category>,
    pub view: View,
    pub sort: SortState,
    pub filter: TableFilter,
    pub stats_window: StatsWindow,
    pub parents: Vec<ParentItem>,
    pub children: Vec<ChildItem>,
    /// Message from the last failed refresh
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a view transition. Returns true when the collections need a
    /// refresh, which is the case when the category changes.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::SelectCategory(category) => {
                let changed = self.category != category;
                self.category = category;
                return changed;
            }
            Action::SelectView(view) => self.view = view,
            Action::SortBy(column) => self.sort = self.sort.toggle(column),
            Action::ResetSort => self.sort = SortState::default(),
            Action::SetFilter(filter) => self.filter = filter,
            Action::ClearFilter => self.filter = TableFilter::default(),
            Action::SetStatsWindow(window) => self.stats_window = window,
            Action::DismissError => self.last_error = None,
        }
        false
    }

    /// Reload parents for the current category and all children.
    ///
    /// Both collections are replaced together on success. On failure the
    /// previous collections are kept and the error is recorded.
    pub async fn refresh<A: NotionApi>(&mut self, db: &Database<A>) -> DbResult<()> {
        let loaded = async {
            let parents = db.parents().list(self.category).await?;
            let children = db.children().list().await?;
            Ok::<_, DbError>((parents, children))
        }
        .await;

        match loaded {
            Ok((parents, children)) => {
                info!(
                    parents = parents.len(),
                    children = children.len(),
                    "Refreshed collections"
                );
                self.parents = parents;
                self.children = children;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed, keeping previous collections");
                self.last_error = Some(err.full_message());
                Err(err)
            }
        }
    }

    /// Children under the current category tab.
    pub fn visible_children(&self) -> Vec<&ChildItem> {
        filter_by_category(self.category, &self.parents, &self.children)
    }

    pub fn list_view(&self) -> ListView<'_> {
        build_list(&self.parents, &self.visible_children())
    }

    pub fn table_rows(&self) -> Vec<TableRow<'_>> {
        build_rows(
            &self.parents,
            &self.visible_children(),
            self.filter.active_for(self.category),
            &self.sort,
        )
    }

    pub fn timeline(&self, today: NaiveDate) -> TimelineLayout<'_> {
        TimelineLayout::build(&self.parents, &self.visible_children(), today)
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics<'_> {
        Statistics::compute(&self.visible_children(), self.stats_window, today)
    }
}

/// Soft-delete a child once confirmed. Returns whether anything was deleted.
pub async fn delete_child<A: NotionApi>(
    db: &Database<A>,
    id: &str,
    confirmation: Confirmation,
) -> DbResult<bool> {
    if confirmation == Confirmation::Cancelled {
        return Ok(false);
    }
    db.children().soft_delete(id).await?;
    Ok(true)
}

/// Soft-delete a parent once confirmed. Its children are left untouched.
pub async fn delete_parent<A: NotionApi>(
    db: &Database<A>,
    id: &str,
    confirmation: Confirmation,
) -> DbResult<bool> {
    if confirmation == Confirmation::Cancelled {
        return Ok(false);
    }
    db.parents().soft_delete(id).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewChild, NewParent, ProgressStatus};
    use crate::views::table::SortDirection;
    use crate::MemoryNotion;

    #[test]
    fn test_apply_category_requests_refresh() {
        let mut state = AppState::new();
        assert!(state.apply(Action::SelectCategory(Some(Category::Planning))));
        assert!(!state.apply(Action::SelectCategory(Some(Category::Planning))));
        assert!(!state.apply(Action::SelectView(View::Table)));
        assert_eq!(state.view, View::Table);
    }

    #[test]
    fn test_apply_sort_toggles() {
        let mut state = AppState::new();
        state.apply(Action::SortBy(Column::Title));
        state.apply(Action::SortBy(Column::Title));
        assert_eq!(
            state.sort,
            SortState::by(Column::Title, SortDirection::Descending)
        );
        state.apply(Action::ResetSort);
        assert_eq!(state.sort, SortState::default());
    }

    #[test]
    fn test_confirmation_from_answer() {
        assert_eq!(Confirmation::from_answer("y"), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_answer(" YES\n"), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_answer(""), Confirmation::Cancelled);
        assert_eq!(Confirmation::from_answer("no"), Confirmation::Cancelled);
    }

    async fn seeded() -> Database<MemoryNotion> {
        let db = Database::in_memory();
        let a = db
            .parents()
            .create(&NewParent::new("A", Category::Strategy))
            .await
            .unwrap();
        let b = db
            .parents()
            .create(&NewParent::new("B", Category::Planning))
            .await
            .unwrap();
        db.children().create(&NewChild::new("T1", a.id)).await.unwrap();
        db.children().create(&NewChild::new("T2", b.id)).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_refresh_and_category_filter() {
        let db = seeded().await;
        let mut state = AppState::new();
        state.refresh(&db).await.unwrap();
        assert_eq!(state.parents.len(), 2);
        assert_eq!(state.visible_children().len(), 2);

        if state.apply(Action::SelectCategory(Some(Category::Strategy))) {
            state.refresh(&db).await.unwrap();
        }
        assert_eq!(state.parents.len(), 1);
        let visible: Vec<_> = state.visible_children().iter().map(|c| c.title.clone()).collect();
        assert_eq!(visible, vec!["T1"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_collections() {
        let db = seeded().await;
        let mut state = AppState::new();
        state.refresh(&db).await.unwrap();

        db.api().set_offline(true);
        let err = state.refresh(&db).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(state.parents.len(), 2);
        assert_eq!(state.children.len(), 2);
        assert!(state.last_error.is_some());

        db.api().set_offline(false);
        state.refresh(&db).await.unwrap();
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_delete_does_nothing() {
        let db = seeded().await;
        let children = db.children().list().await.unwrap();
        let id = children[0].id.clone();

        assert!(!delete_child(&db, &id, Confirmation::Cancelled).await.unwrap());
        assert_eq!(db.children().list().await.unwrap().len(), 2);

        assert!(delete_child(&db, &id, Confirmation::Confirmed).await.unwrap());
        let remaining = db.children().list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|c| c.progress_status != ProgressStatus::Deleted));
    }

    #[tokio::test]
    async fn test_deleted_parent_children_become_orphans() {
        let db = seeded().await;
        let parents = db.parents().list(None).await.unwrap();
        let a = parents.iter().find(|p| p.title == "A").unwrap();
        assert!(delete_parent(&db, &a.id, Confirmation::Confirmed).await.unwrap());

        let mut state = AppState::new();
        state.refresh(&db).await.unwrap();
        let view = state.list_view();
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.orphans.len(), 1);
        assert_eq!(view.orphans[0].title, "T1");
    }
}
