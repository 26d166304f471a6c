//! CLI subcommands
//!
//! Each command is a `clap::Args` struct with an `execute` method taking the
//! database handle. [`Command`] dispatches to them and renders the result.

pub mod add;
pub mod delete;
pub mod export;
pub mod gantt;
pub mod list;
pub mod stats;
pub mod status;
pub mod table;
pub mod update;

pub use add::{AddChildCommand, AddParentCommand};
pub use delete::DeleteCommand;
pub use export::ExportCommand;
pub use gantt::GanttCommand;
pub use list::ListCommand;
pub use stats::StatsCommand;
pub use status::StatusCommand;
pub use table::TableCommand;
pub use update::{UpdateChildCommand, UpdateParentCommand};

use actrack_db::views::{Action, AppState, Column};
use actrack_db::{
    Assignee, Category, Database, DbError, NotionApi, ParentStatus, ProgressStatus,
};
use chrono::NaiveDate;
use clap::Subcommand;

use crate::output;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show parents with their children and status counts
    List(ListCommand),
    /// Show children as a sortable, filterable table
    Table(TableCommand),
    /// Show planned and actual ranges on a weekly timeline
    Gantt(GanttCommand),
    /// Show per-assignee, per-status and overdue statistics
    Stats(StatsCommand),
    /// Write the table as CSV
    Export(ExportCommand),
    /// Create a parent item
    AddParent(AddParentCommand),
    /// Create a child item under a parent
    AddChild(AddChildCommand),
    /// Edit a parent item
    UpdateParent(UpdateParentCommand),
    /// Edit a child item
    UpdateChild(UpdateChildCommand),
    /// Change the status of a parent or child
    Status(StatusCommand),
    /// Soft-delete a parent or child
    Delete(DeleteCommand),
}

impl Command {
    /// Run the command and render its result for the terminal.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        match self {
            Command::List(cmd) => cmd.execute(db).await,
            Command::Table(cmd) => cmd.execute(db).await,
            Command::Gantt(cmd) => cmd.execute(db).await,
            Command::Stats(cmd) => cmd.execute(db).await,
            Command::Export(cmd) => cmd.execute(db).await.map(|r| r.to_string()),
            Command::AddParent(cmd) => cmd
                .execute(db)
                .await
                .map(|p| output::format_parent("Created", &p)),
            Command::AddChild(cmd) => cmd
                .execute(db)
                .await
                .map(|c| output::format_child("Created", &c)),
            Command::UpdateParent(cmd) => cmd
                .execute(db)
                .await
                .map(|p| output::format_parent("Updated", &p)),
            Command::UpdateChild(cmd) => cmd
                .execute(db)
                .await
                .map(|c| output::format_child("Updated", &c)),
            Command::Status(cmd) => cmd.execute(db).await,
            Command::Delete(cmd) => cmd.execute(db).await,
        }
    }
}

/// Load both collections for a category tab.
pub(crate) async fn load_state<A: NotionApi>(
    db: &Database<A>,
    category: Option<Category>,
) -> Result<AppState, DbError> {
    let mut state = AppState::new();
    state.apply(Action::SelectCategory(category));
    state.refresh(db).await?;
    Ok(state)
}

/// Today in local time.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn valid_values<T: Copy>(all: &[T], slug: fn(&T) -> &'static str) -> String {
    all.iter().map(slug).collect::<Vec<_>>().join(", ")
}

/// Parse a category slug or label.
pub(crate) fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse(s).ok_or_else(|| {
        format!(
            "invalid category '{}'. Valid values: {}",
            s,
            valid_values(&Category::ALL, Category::slug)
        )
    })
}

/// Parse a parent status slug or label.
pub(crate) fn parse_parent_status(s: &str) -> Result<ParentStatus, String> {
    ParentStatus::parse(s)
        .filter(|status| *status != ParentStatus::Deleted)
        .ok_or_else(|| {
            format!(
                "invalid parent status '{}'. Valid values: waiting, in-progress, done, on-hold",
                s
            )
        })
}

/// Parse a progress status slug or label.
pub(crate) fn parse_progress_status(s: &str) -> Result<ProgressStatus, String> {
    ProgressStatus::parse(s)
        .filter(|status| *status != ProgressStatus::Deleted)
        .ok_or_else(|| {
            format!(
                "invalid status '{}'. Valid values: idea, reviewing, in-progress, done, on-hold",
                s
            )
        })
}

/// Parse an assignee slug or label.
pub(crate) fn parse_assignee(s: &str) -> Result<Assignee, String> {
    Assignee::parse(s).ok_or_else(|| {
        format!(
            "invalid assignee '{}'. Valid values: {}",
            s,
            valid_values(&Assignee::ALL, Assignee::slug)
        )
    })
}

/// Parse a `YYYY-MM-DD` date.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}'. Expected YYYY-MM-DD", s))
}

/// Parse a table column slug or header label.
pub(crate) fn parse_column(s: &str) -> Result<Column, String> {
    Column::parse(s).ok_or_else(|| {
        format!(
            "invalid column '{}'. Valid values: {}",
            s,
            valid_values(&Column::ALL, Column::slug)
        )
    })
}
