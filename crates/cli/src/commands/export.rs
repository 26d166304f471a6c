//! Export command for writing the table as CSV
//!
//! Implements `actrack export`. The rows are exactly what `actrack table`
//! would show with the same options.

use std::path::PathBuf;

use actrack_db::views::{export_filename, to_csv};
use actrack_db::{Category, Database, DbError, NotionApi};
use clap::Args;
use tracing::info;

use super::table::TableViewArgs;
use super::{load_state, parse_category, today};

/// Export visible rows to a CSV file
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Only export children of parents in this category
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,

    #[command(flatten)]
    pub view: TableViewArgs,

    /// Output file path (defaults to action_tracker_<date>.csv in the
    /// current directory; `-` writes to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Result of the export command
#[derive(Debug)]
pub struct ExportResult {
    /// Number of data rows written
    pub rows: usize,
    /// Output destination
    pub destination: String,
    /// CSV text when written to stdout
    pub stdout: Option<String>,
}

impl std::fmt::Display for ExportResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(csv) = &self.stdout {
            return write!(f, "{}", csv);
        }
        writeln!(f, "Export complete!")?;
        writeln!(f, "  Rows: {}", self.rows)?;
        write!(f, "  Output: {}", self.destination)
    }
}

impl ExportCommand {
    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the collections cannot be loaded or the file
    /// cannot be written.
    pub async fn execute<A: NotionApi>(&self, db: &Database<A>) -> Result<ExportResult, DbError> {
        let mut state = load_state(db, self.category).await?;
        self.view.apply_to(&mut state);
        let rows = state.table_rows();
        let csv = to_csv(&rows);

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export_filename(today())));

        if path.as_os_str() == "-" {
            return Ok(ExportResult {
                rows: rows.len(),
                destination: "stdout".to_string(),
                stdout: Some(csv),
            });
        }

        std::fs::write(&path, csv.as_bytes()).map_err(|source| DbError::WriteFile {
            path: path.clone(),
            source,
        })?;
        info!(rows = rows.len(), path = %path.display(), "Exported CSV");

        Ok(ExportResult {
            rows: rows.len(),
            destination: path.display().to_string(),
            stdout: None,
        })
    }
}
