//! Add commands for creating parent and child items
//!
//! Implements `actrack add-parent` and `actrack add-child`. Sequence numbers
//! are assigned by the repository.

use actrack_db::{
    Assignee, Category, ChildItem, Database, DbError, NewChild, NewParent, NotionApi,
    ParentItem, ParentStatus, ProgressStatus,
};
use chrono::NaiveDate;
use clap::Args;

use super::{parse_assignee, parse_category, parse_date, parse_parent_status, parse_progress_status};

/// Create a parent item
#[derive(Debug, Args)]
pub struct AddParentCommand {
    /// Title of the parent item
    #[arg(required = true)]
    pub title: String,

    /// Category (strategy, operations, planning)
    #[arg(short, long, value_parser = parse_category)]
    pub category: Category,

    /// Initial status (defaults to waiting)
    #[arg(short, long, value_parser = parse_parent_status)]
    pub status: Option<ParentStatus>,
}

impl AddParentCommand {
    /// Execute the add-parent command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the title is blank or the upstream rejects the
    /// page.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<ParentItem, DbError> {
        let mut item = NewParent::new(self.title.clone(), self.category);
        if let Some(status) = self.status {
            item = item.with_status(status);
        }
        db.parents().create(&item).await
    }
}

/// Create a child item
#[derive(Debug, Args)]
pub struct AddChildCommand {
    /// Title of the child item
    #[arg(required = true)]
    pub title: String,

    /// Parent item id
    #[arg(short, long)]
    pub parent: String,

    /// Assignee; repeatable, at most 3
    #[arg(short, long = "assignee", value_parser = parse_assignee)]
    pub assignees: Vec<Assignee>,

    /// Initial status (defaults to idea)
    #[arg(short, long, value_parser = parse_progress_status)]
    pub status: Option<ProgressStatus>,

    /// Planned start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub plan_start: Option<NaiveDate>,

    /// Planned end date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub plan_end: Option<NaiveDate>,

    /// Longer description
    #[arg(short, long)]
    pub details: Option<String>,

    /// Notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Id of the child item this one waits on
    #[arg(long)]
    pub precedent: Option<String>,
}

impl AddChildCommand {
    /// Build the create payload from the options.
    pub fn new_child(&self) -> NewChild {
        let mut item = NewChild::new(self.title.clone(), self.parent.clone())
            .with_assignees(self.assignees.iter().copied())
            .with_plan(self.plan_start, self.plan_end);
        if let Some(status) = self.status {
            item = item.with_status(status);
        }
        if let Some(details) = &self.details {
            item = item.with_details(details.clone());
        }
        if let Some(notes) = &self.notes {
            item = item.with_unique_notes(notes.clone());
        }
        if let Some(precedent) = &self.precedent {
            item = item.with_precedent(precedent.clone());
        }
        item
    }

    /// Execute the add-child command.
    ///
    /// The parent must exist and must not be deleted.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if validation fails, the parent is unknown, or the
    /// upstream rejects the page.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<ChildItem, DbError> {
        let item = self.new_child();
        item.validate()?;
        db.parents().get(&self.parent).await?;
        db.children().create(&item).await
    }
}
