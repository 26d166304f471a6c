//! Test infrastructure for integration tests
//!
//! Each test gets its own in-memory Notion double with both databases
//! registered, so no state is shared and no network is used.

#![allow(dead_code)]

use actrack_cli::commands::{
    AddChildCommand, AddParentCommand, DeleteCommand, ExportCommand, StatsCommand, StatusCommand,
    TableCommand, UpdateChildCommand, table::TableViewArgs,
};
use actrack_db::{
    Category, ChildItem, ChildUpdate, Database, MemoryNotion, NewChild, NewParent, ParentItem,
    ProgressStatus,
};
use chrono::NaiveDate;

/// Test context holding an isolated in-memory database
pub struct TestContext {
    pub db: Database<MemoryNotion>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            db: Database::in_memory(),
        }
    }

    /// The in-memory upstream, for toggling failures and inspecting requests.
    pub fn api(&self) -> &MemoryNotion {
        self.db.api()
    }

    pub async fn parent(&self, title: &str, category: Category) -> ParentItem {
        self.db
            .parents()
            .create(&NewParent::new(title, category))
            .await
            .unwrap()
    }

    pub async fn child(&self, title: &str, parent_id: &str) -> ChildItem {
        self.db
            .children()
            .create(&NewChild::new(title, parent_id))
            .await
            .unwrap()
    }

    pub async fn child_with(&self, item: NewChild) -> ChildItem {
        self.db.children().create(&item).await.unwrap()
    }

    pub async fn patch_child(&self, id: &str, update: ChildUpdate) -> ChildItem {
        self.db.children().update(id, &update).await.unwrap()
    }

    pub async fn children(&self) -> Vec<ChildItem> {
        self.db.children().list().await.unwrap()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

pub fn add_parent_cmd(title: &str, category: Category) -> AddParentCommand {
    AddParentCommand {
        title: title.to_string(),
        category,
        status: None,
    }
}

pub fn add_child_cmd(title: &str, parent: &str) -> AddChildCommand {
    AddChildCommand {
        title: title.to_string(),
        parent: parent.to_string(),
        assignees: Vec::new(),
        status: None,
        plan_start: None,
        plan_end: None,
        details: None,
        notes: None,
        precedent: None,
    }
}

pub fn update_child_cmd(id: &str) -> UpdateChildCommand {
    UpdateChildCommand {
        id: id.to_string(),
        title: None,
        parent: None,
        assignees: Vec::new(),
        clear_assignees: false,
        status: None,
        plan_start: None,
        clear_plan_start: false,
        plan_end: None,
        clear_plan_end: false,
        actual_start: None,
        clear_actual_start: false,
        actual_end: None,
        clear_actual_end: false,
        details: None,
        notes: None,
        precedent: None,
        clear_precedent: false,
    }
}

pub fn status_cmd(id: &str, status: &str) -> StatusCommand {
    StatusCommand {
        id: id.to_string(),
        status: status.to_string(),
        parent: false,
    }
}

pub fn delete_cmd(id: &str, parent: bool) -> DeleteCommand {
    DeleteCommand {
        id: id.to_string(),
        parent,
        yes: true,
    }
}

pub fn table_cmd(category: Option<Category>) -> TableCommand {
    TableCommand {
        category,
        view: TableViewArgs::default(),
        json: false,
    }
}

pub fn stats_cmd(today: NaiveDate) -> StatsCommand {
    StatsCommand {
        category: None,
        from: None,
        to: None,
        today: Some(today),
        json: false,
    }
}

pub fn export_cmd(output: std::path::PathBuf) -> ExportCommand {
    ExportCommand {
        category: None,
        view: TableViewArgs::default(),
        output: Some(output),
    }
}

/// A unique temp file path.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "actrack-integration-{}-{}-{:?}-{}",
        name,
        std::process::id(),
        std::thread::current().id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

pub fn is_status(item: &ChildItem, status: ProgressStatus) -> bool {
    item.progress_status == status
}
