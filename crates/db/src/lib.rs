//! Action tracker data layer
//!
//! Provides the Notion repository adapter for parent and child action items
//! and the pure view engines (hierarchy, timeline, table, statistics) that
//! run over the collections it returns.

pub mod config;
pub mod error;
pub mod models;
pub mod notion;
pub mod repository;
pub mod schema;
pub mod views;

pub use config::{ConfigLayer, DEFAULT_API_URL, NotionConfig, config_file_path};
pub use error::{DbError, DbResult, ErrorKind};
pub use models::{
    Assignee, Category, ChildItem, ChildUpdate, MAX_ASSIGNEES, NewChild, NewParent, ParentItem,
    ParentStatus, ParentUpdate, ProgressStatus,
};
pub use notion::{MemoryNotion, NotionApi, NotionClient};
pub use repository::{ChildRepository, ParentRepository};

use tokio::sync::Mutex;

/// Handle on the two Notion databases backing the tracker
pub struct Database<A: NotionApi = NotionClient> {
    api: A,
    parent_database_id: String,
    child_database_id: String,
    /// Serializes sequence number assignment across both repositories
    create_lock: Mutex<()>,
}

impl Database<NotionClient> {
    /// Connect to the Notion API with resolved settings.
    ///
    /// No request is made until the first repository call.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Config` if the settings are unusable.
    pub fn connect(config: &NotionConfig) -> DbResult<Self> {
        config.validate()?;
        Ok(Self::with_api(
            NotionClient::new(config),
            config.parent_database_id.clone(),
            config.child_database_id.clone(),
        ))
    }
}

impl<A: NotionApi> Database<A> {
    /// Build a database handle over any API implementation.
    pub fn with_api(
        api: A,
        parent_database_id: impl Into<String>,
        child_database_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            parent_database_id: parent_database_id.into(),
            child_database_id: child_database_id.into(),
            create_lock: Mutex::new(()),
        }
    }

    /// The underlying API implementation.
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn parent_database_id(&self) -> &str {
        &self.parent_database_id
    }

    pub fn child_database_id(&self) -> &str {
        &self.child_database_id
    }

    /// Repository for parent (1-depth) items.
    pub fn parents(&self) -> ParentRepository<'_, A> {
        ParentRepository::new(&self.api, &self.parent_database_id, &self.create_lock)
    }

    /// Repository for child (2-depth) items.
    pub fn children(&self) -> ChildRepository<'_, A> {
        ChildRepository::new(&self.api, &self.child_database_id, &self.create_lock)
    }
}

impl Database<MemoryNotion> {
    /// A database backed by an in-memory API with both property tables
    /// registered.
    pub fn in_memory() -> Self {
        let api = MemoryNotion::new();
        api.register_database("parent-db", schema::PARENT_PROPERTIES);
        api.register_database("child-db", schema::CHILD_PROPERTIES);
        Self::with_api(api, "parent-db", "child-db")
    }
}

// Ensure Database is Send + Sync for async compatibility
static_assertions::assert_impl_all!(Database: Send, Sync);
static_assertions::assert_impl_all!(Database<MemoryNotion>: Send, Sync);
