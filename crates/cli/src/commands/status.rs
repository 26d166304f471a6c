//! Status command for quick status changes
//!
//! Implements `actrack status <id> <status>`. The status is written as
//! given, without deriving it from actual dates.

use actrack_db::{Database, DbError, NotionApi};
use clap::Args;

use super::{parse_parent_status, parse_progress_status};

/// Change the status of an item
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Item id
    #[arg(required = true)]
    pub id: String,

    /// New status: for children idea, reviewing, in-progress, done, on-hold;
    /// for parents waiting, in-progress, done, on-hold
    #[arg(required = true)]
    pub status: String,

    /// The id refers to a parent item
    #[arg(long)]
    pub parent: bool,
}

impl StatusCommand {
    /// Execute the status command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the status is not valid for the item type, the
    /// item does not exist, or the upstream rejects the patch.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        if self.parent {
            let status = parse_parent_status(&self.status).map_err(DbError::validation)?;
            let item = db.parents().set_status(&self.id, status).await?;
            Ok(format!("{}: {}", item.title, item.status))
        } else {
            let status = parse_progress_status(&self.status).map_err(DbError::validation)?;
            let item = db.children().set_status(&self.id, status).await?;
            Ok(format!("{}: {}", item.title, item.progress_status))
        }
    }
}
