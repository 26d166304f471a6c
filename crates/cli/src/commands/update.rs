//! Update commands for editing parent and child items
//!
//! Implements `actrack update-parent` and `actrack update-child`. Only the
//! fields given on the command line are sent; `--clear-*` flags empty a
//! date or the precedent link.

use actrack_db::{
    Assignee, Category, ChildItem, ChildUpdate, Database, DbError, NotionApi, ParentItem,
    ParentStatus, ParentUpdate, ProgressStatus,
};
use chrono::NaiveDate;
use clap::Args;

use super::{parse_assignee, parse_category, parse_date, parse_parent_status, parse_progress_status};

/// Edit a parent item
#[derive(Debug, Args)]
pub struct UpdateParentCommand {
    /// Parent item id
    #[arg(required = true)]
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New category
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,

    /// New status
    #[arg(short, long, value_parser = parse_parent_status)]
    pub status: Option<ParentStatus>,
}

impl UpdateParentCommand {
    pub fn update(&self) -> ParentUpdate {
        let mut update = ParentUpdate::new();
        if let Some(title) = &self.title {
            update = update.with_title(title.clone());
        }
        if let Some(category) = self.category {
            update = update.with_category(category);
        }
        if let Some(status) = self.status {
            update = update.with_status(status);
        }
        update
    }

    /// Execute the update-parent command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if nothing is changed, the item does not exist, or
    /// the upstream rejects the patch.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<ParentItem, DbError> {
        db.parents().update(&self.id, &self.update()).await
    }
}

/// Edit a child item
#[derive(Debug, Args)]
pub struct UpdateChildCommand {
    /// Child item id
    #[arg(required = true)]
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Move under another parent
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Replace assignees; repeatable, at most 3
    #[arg(short, long = "assignee", value_parser = parse_assignee)]
    pub assignees: Vec<Assignee>,

    /// Remove all assignees
    #[arg(long, conflicts_with = "assignees")]
    pub clear_assignees: bool,

    /// New status (actual dates take precedence)
    #[arg(short, long, value_parser = parse_progress_status)]
    pub status: Option<ProgressStatus>,

    #[arg(long, value_parser = parse_date)]
    pub plan_start: Option<NaiveDate>,

    #[arg(long, conflicts_with = "plan_start")]
    pub clear_plan_start: bool,

    #[arg(long, value_parser = parse_date)]
    pub plan_end: Option<NaiveDate>,

    #[arg(long, conflicts_with = "plan_end")]
    pub clear_plan_end: bool,

    #[arg(long, value_parser = parse_date)]
    pub actual_start: Option<NaiveDate>,

    #[arg(long, conflicts_with = "actual_start")]
    pub clear_actual_start: bool,

    #[arg(long, value_parser = parse_date)]
    pub actual_end: Option<NaiveDate>,

    #[arg(long, conflicts_with = "actual_end")]
    pub clear_actual_end: bool,

    /// Replace the details text
    #[arg(short, long)]
    pub details: Option<String>,

    /// Replace the notes text
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Id of the child item this one waits on
    #[arg(long)]
    pub precedent: Option<String>,

    /// Remove the precedent link
    #[arg(long, conflicts_with = "precedent")]
    pub clear_precedent: bool,
}

/// `Some(Some(d))` to set, `Some(None)` to clear, `None` to leave alone.
fn date_change(value: Option<NaiveDate>, clear: bool) -> Option<Option<NaiveDate>> {
    if clear { Some(None) } else { value.map(Some) }
}

impl UpdateChildCommand {
    pub fn update(&self) -> ChildUpdate {
        let mut update = ChildUpdate::new();
        if let Some(title) = &self.title {
            update = update.with_title(title.clone());
        }
        if let Some(parent) = &self.parent {
            update = update.with_parent(parent.clone());
        }
        if self.clear_assignees {
            update = update.with_assignees([]);
        } else if !self.assignees.is_empty() {
            update = update.with_assignees(self.assignees.iter().copied());
        }
        if let Some(status) = self.status {
            update = update.with_status(status);
        }
        update.plan_start_date = date_change(self.plan_start, self.clear_plan_start);
        update.plan_end_date = date_change(self.plan_end, self.clear_plan_end);
        update.actual_start_date = date_change(self.actual_start, self.clear_actual_start);
        update.actual_end_date = date_change(self.actual_end, self.clear_actual_end);
        if let Some(details) = &self.details {
            update = update.with_details(details.clone());
        }
        if let Some(notes) = &self.notes {
            update = update.with_unique_notes(notes.clone());
        }
        if self.clear_precedent {
            update = update.with_precedent(None);
        } else if let Some(precedent) = &self.precedent {
            update = update.with_precedent(Some(precedent.clone()));
        }
        update
    }

    /// Execute the update-child command.
    ///
    /// When a new parent is given it must exist.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if nothing is changed, validation fails, a
    /// referenced item does not exist, or the upstream rejects the patch.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<ChildItem, DbError> {
        let update = self.update();
        update.validate()?;
        if let Some(parent) = &update.parent_id {
            db.parents().get(parent).await?;
        }
        db.children().update(&self.id, &update).await
    }
}
