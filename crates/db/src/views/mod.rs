//! Pure view engines over loaded collections
//!
//! None of these touch the upstream except [`state::AppState::refresh`] and
//! the confirmed delete helpers.

pub mod export;
pub mod hierarchy;
pub mod state;
pub mod stats;
pub mod table;
pub mod timeline;

pub use export::{export_filename, to_csv};
pub use hierarchy::{
    ListView, ParentNode, StatusCounts, UNKNOWN_PARENT, build_list, children_of, filter_by_category,
    parent_title, resolve_parent, status_counts,
};
pub use state::{Action, AppState, Confirmation, View, delete_child, delete_parent};
pub use stats::{
    AssigneeStats, OverdueItem, Statistics, StatsWindow, StatusTotal, Summary, completion_rate,
};
pub use table::{
    Column, SortDirection, SortState, TableFilter, TableRow, build_rows, display_date, locale_cmp,
};
pub use timeline::{Bar, DependencyInfo, TimelineGroup, TimelineLayout, TimelineRow, WeekCell, Window};
