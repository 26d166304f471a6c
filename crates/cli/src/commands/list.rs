//! List command
//!
//! Implements `actrack list`: parents in sequence order, each with its
//! children and status counts, followed by children whose parent is unknown.

use actrack_db::{Category, Database, DbError, NotionApi};
use clap::Args;

use super::{load_state, parse_category};
use crate::output::format_list;

/// Show parents with their children
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show parents in this category (strategy, operations, planning)
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,
}

impl ListCommand {
    /// Execute the list command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if either collection cannot be loaded.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        let state = load_state(db, self.category).await?;
        Ok(format_list(&state.list_view()))
    }
}
