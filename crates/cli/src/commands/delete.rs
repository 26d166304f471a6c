//! Delete command
//!
//! Implements `actrack delete <id>`. Items are soft-deleted by setting the
//! delete sentinel status. Without `--yes` the user is asked to confirm.

use std::io::{self, BufRead, Write};

use actrack_db::views::{Confirmation, delete_child, delete_parent};
use actrack_db::{Database, DbError, NotionApi};
use clap::Args;

/// Soft-delete an item
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Item id
    #[arg(required = true)]
    pub id: String,

    /// The id refers to a parent item (its children are kept)
    #[arg(long)]
    pub parent: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Ask on stderr and read one line from stdin. Any read failure cancels.
fn prompt(question: &str) -> Confirmation {
    eprint!("{} [y/N] ", question);
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => Confirmation::from_answer(&answer),
        Err(_) => Confirmation::Cancelled,
    }
}

impl DeleteCommand {
    /// Execute the delete command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the item does not exist or the upstream rejects
    /// the patch.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        let (kind, title) = if self.parent {
            ("parent", db.parents().get(&self.id).await?.title)
        } else {
            ("child", db.children().get(&self.id).await?.title)
        };

        let confirmation = if self.yes {
            Confirmation::Confirmed
        } else {
            prompt(&format!("Delete {} '{}'?", kind, title))
        };

        let deleted = if self.parent {
            delete_parent(db, &self.id, confirmation).await?
        } else {
            delete_child(db, &self.id, confirmation).await?
        };

        if deleted {
            Ok(format!("Deleted {} '{}'", kind, title))
        } else {
            Ok("Cancelled.".to_string())
        }
    }
}
