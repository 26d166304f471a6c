//! Gantt command
//!
//! Implements `actrack gantt`: a weekly timeline of planned and actual
//! ranges, grouped by parent, with precedent labels.

use actrack_db::{Category, Database, DbError, NotionApi};
use chrono::NaiveDate;
use clap::Args;

use super::{load_state, parse_category, parse_date, today};
use crate::output::format_timeline;

/// Show the timeline
#[derive(Debug, Args)]
pub struct GanttCommand {
    /// Only show children of parents in this category
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,

    /// Date to treat as today (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,
}

impl GanttCommand {
    /// Execute the gantt command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if either collection cannot be loaded.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        let today = self.today.unwrap_or_else(today);
        let state = load_state(db, self.category).await?;
        Ok(format_timeline(&state.timeline(today), today))
    }
}
