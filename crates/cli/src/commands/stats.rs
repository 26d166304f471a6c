//! Stats command
//!
//! Implements `actrack stats` over an optional planned-start window.

use actrack_db::views::{Action, StatsWindow};
use actrack_db::{Category, Database, DbError, NotionApi};
use chrono::NaiveDate;
use clap::Args;

use super::{load_state, parse_category, parse_date, today};
use crate::output::format_stats;

/// Show statistics
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Only count children of parents in this category
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,

    /// Earliest planned start to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Latest planned start to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Date to treat as today (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the window is inverted or the collections
    /// cannot be loaded.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(DbError::validation(format!(
                "--from {} is after --to {}",
                from, to
            )));
        }

        let today = self.today.unwrap_or_else(today);
        let mut state = load_state(db, self.category).await?;
        state.apply(Action::SetStatsWindow(StatsWindow::new(self.from, self.to)));
        let stats = state.statistics(today);

        if self.json {
            return Ok(serde_json::to_string_pretty(&stats)?);
        }
        Ok(format_stats(&stats))
    }
}
