//! Table command
//!
//! Implements `actrack table` with column sorting, the all-categories
//! filters, and optional JSON output.

use actrack_db::views::{Action, AppState, Column, SortDirection, SortState, TableFilter, TableRow};
use actrack_db::{Assignee, Category, ChildItem, Database, DbError, NotionApi, ProgressStatus};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use super::{
    load_state, parse_assignee, parse_category, parse_column, parse_date, parse_progress_status,
};
use crate::output::format_table;

/// Show children as a table
#[derive(Debug, Args)]
pub struct TableCommand {
    /// Only show children of parents in this category
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,

    #[command(flatten)]
    pub view: TableViewArgs,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

/// Sort and filter options shared by `table` and `export`
#[derive(Debug, Args, Default, Clone)]
pub struct TableViewArgs {
    /// Sort by column (e.g. title, status, plan-start, assignees)
    #[arg(short, long, value_parser = parse_column)]
    pub sort: Option<Column>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Keep items assigned to this person (ignored with --category)
    #[arg(short, long, value_parser = parse_assignee)]
    pub assignee: Option<Assignee>,

    /// Keep items whose planned range covers this date (ignored with --category)
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,

    /// Keep items with this status; repeatable (ignored with --category)
    #[arg(long = "status", value_parser = parse_progress_status)]
    pub statuses: Vec<ProgressStatus>,
}

impl TableViewArgs {
    pub fn sort_state(&self) -> SortState {
        match self.sort {
            None => SortState::default(),
            Some(column) => {
                let direction = if self.desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                SortState::by(column, direction)
            }
        }
    }

    pub fn filter(&self) -> TableFilter {
        let mut filter = TableFilter::new();
        if let Some(assignee) = self.assignee {
            filter = filter.with_assignee(assignee);
        }
        if let Some(date) = self.as_of {
            filter = filter.with_as_of(date);
        }
        for status in &self.statuses {
            filter = filter.with_status(*status);
        }
        filter
    }

    /// Push the sort and filter choices into the state.
    pub fn apply_to(&self, state: &mut AppState) {
        state.apply(Action::SetFilter(self.filter()));
        state.sort = self.sort_state();
    }
}

/// JSON shape of one table row
#[derive(Debug, Serialize)]
pub struct RowRecord<'a> {
    pub parent_title: &'a str,
    pub precedent_title: &'a str,
    #[serde(flatten)]
    pub item: &'a ChildItem,
}

impl<'a> From<&TableRow<'a>> for RowRecord<'a> {
    fn from(row: &TableRow<'a>) -> Self {
        RowRecord {
            parent_title: row.parent_title,
            precedent_title: row.precedent_title,
            item: row.item,
        }
    }
}

impl TableCommand {
    /// Execute the table command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the collections cannot be loaded or the rows
    /// cannot be serialized.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<String, DbError> {
        let mut state = load_state(db, self.category).await?;
        self.view.apply_to(&mut state);
        let rows = state.table_rows();

        if self.json {
            let records: Vec<RowRecord<'_>> = rows.iter().map(RowRecord::from).collect();
            return Ok(serde_json::to_string_pretty(&records)?);
        }
        Ok(format_table(&rows))
    }
}
