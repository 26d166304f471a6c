//! Flat table of child items
//!
//! Projects each child into a row with its resolved parent and precedent
//! titles, then filters and sorts the rows. The same rows feed the CSV export.

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::hierarchy::resolve_parent;
use crate::models::{Assignee, Category, ChildItem, ParentItem, ProgressStatus};

/// Display value for a missing cell
pub const EMPTY_CELL: &str = "-";

/// Status order of the default sort. Anything else sorts after these.
pub const STATUS_RANK: [ProgressStatus; 5] = [
    ProgressStatus::Idea,
    ProgressStatus::Reviewing,
    ProgressStatus::InProgress,
    ProgressStatus::Done,
    ProgressStatus::OnHold,
];

/// Table columns in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ParentTitle,
    Title,
    Assignees,
    ProgressStatus,
    PlanStart,
    PlanEnd,
    ActualStart,
    ActualEnd,
    Precedent,
    Details,
    UniqueNotes,
    LastModifiedBy,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::ParentTitle,
        Column::Title,
        Column::Assignees,
        Column::ProgressStatus,
        Column::PlanStart,
        Column::PlanEnd,
        Column::ActualStart,
        Column::ActualEnd,
        Column::Precedent,
        Column::Details,
        Column::UniqueNotes,
        Column::LastModifiedBy,
    ];

    /// Header label
    pub fn label(&self) -> &'static str {
        match self {
            Column::ParentTitle => "상위 아이템",
            Column::Title => "액션아이템명",
            Column::Assignees => "담당자",
            Column::ProgressStatus => "진행상태",
            Column::PlanStart => "계획시작일",
            Column::PlanEnd => "계획완료일",
            Column::ActualStart => "진행시작일",
            Column::ActualEnd => "진행완료일",
            Column::Precedent => "선행아이템",
            Column::Details => "상세내용",
            Column::UniqueNotes => "특이사항",
            Column::LastModifiedBy => "최근수정자",
        }
    }

    /// Name accepted on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Column::ParentTitle => "parent",
            Column::Title => "title",
            Column::Assignees => "assignees",
            Column::ProgressStatus => "status",
            Column::PlanStart => "plan-start",
            Column::PlanEnd => "plan-end",
            Column::ActualStart => "actual-start",
            Column::ActualEnd => "actual-end",
            Column::Precedent => "precedent",
            Column::Details => "details",
            Column::UniqueNotes => "notes",
            Column::LastModifiedBy => "modified-by",
        }
    }

    /// Parse a slug or a header label.
    pub fn parse(s: &str) -> Option<Column> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.slug().eq_ignore_ascii_case(s) || c.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Chosen sort column. No column means the default ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<Column>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(column: Column, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction,
        }
    }

    /// Select `column`: ascending on first pick, flipping on repeated picks.
    pub fn toggle(self, column: Column) -> Self {
        let direction = match self {
            SortState {
                column: Some(current),
                direction: SortDirection::Ascending,
            } if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        Self::by(column, direction)
    }
}

/// Optional table filters
///
/// Criteria combine with AND; an empty status list means any status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    pub assignee: Option<Assignee>,
    pub as_of: Option<NaiveDate>,
    pub statuses: Vec<ProgressStatus>,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignee(mut self, assignee: Assignee) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignee.is_none() && self.as_of.is_none() && self.statuses.is_empty()
    }

    /// The filter in effect for a category tab. Filters only apply to the
    /// all-categories view.
    pub fn active_for(&self, category: Option<Category>) -> Option<&TableFilter> {
        (category.is_none() && !self.is_empty()).then_some(self)
    }

    pub fn matches(&self, item: &ChildItem) -> bool {
        if let Some(assignee) = self.assignee
            && !item.assignees.contains(&assignee)
        {
            return false;
        }
        if let Some(day) = self.as_of {
            let covered = match (item.plan_start_date, item.plan_end_date) {
                (None, None) => false,
                (start, end) => start.is_none_or(|s| s <= day) && end.is_none_or(|e| day <= e),
            };
            if !covered {
                return false;
            }
        }
        self.statuses.is_empty() || self.statuses.contains(&item.progress_status)
    }
}

/// One row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<'a> {
    pub item: &'a ChildItem,
    /// Parent title, or `-` when the parent does not resolve
    pub parent_title: &'a str,
    pub parent_category: Option<Category>,
    /// Precedent title, or `-` when there is none or it does not resolve
    pub precedent_title: &'a str,
}

/// Date as shown in table cells
pub fn display_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y.%m.%d").to_string(),
        None => EMPTY_CELL.to_string(),
    }
}

fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl<'a> TableRow<'a> {
    /// Raw value of a column: ISO dates, empty string when missing.
    /// Used for explicit sorting and for export.
    pub fn value(&self, column: Column) -> String {
        let item = self.item;
        match column {
            Column::ParentTitle => self.parent_title.to_string(),
            Column::Title => item.title.clone(),
            Column::Assignees => item.assignee_names(),
            Column::ProgressStatus => item.progress_status.as_str().to_string(),
            Column::PlanStart => iso_date(item.plan_start_date),
            Column::PlanEnd => iso_date(item.plan_end_date),
            Column::ActualStart => iso_date(item.actual_start_date),
            Column::ActualEnd => iso_date(item.actual_end_date),
            Column::Precedent => self.precedent_title.to_string(),
            Column::Details => item.details.clone(),
            Column::UniqueNotes => item.unique_notes.clone(),
            Column::LastModifiedBy => item.last_modified_by.clone(),
        }
    }

    /// Value as displayed in a cell.
    pub fn cell(&self, column: Column) -> String {
        let item = self.item;
        let text = match column {
            Column::PlanStart => return display_date(item.plan_start_date),
            Column::PlanEnd => return display_date(item.plan_end_date),
            Column::ActualStart => return display_date(item.actual_start_date),
            Column::ActualEnd => return display_date(item.actual_end_date),
            other => self.value(other),
        };
        if text.is_empty() {
            EMPTY_CELL.to_string()
        } else {
            text
        }
    }
}

/// Project children into rows with resolved titles.
pub fn project<'a>(parents: &'a [ParentItem], children: &[&'a ChildItem]) -> Vec<TableRow<'a>> {
    children
        .iter()
        .copied()
        .map(|item| {
            let parent = resolve_parent(item.parent_id.as_deref(), parents);
            let precedent = item
                .precedent_item_id
                .as_deref()
                .and_then(|id| children.iter().copied().find(|c| c.id == id));
            TableRow {
                item,
                parent_title: parent.map(|p| p.title.as_str()).unwrap_or(EMPTY_CELL),
                parent_category: parent.and_then(|p| p.category),
                precedent_title: precedent.map(|p| p.title.as_str()).unwrap_or(EMPTY_CELL),
            }
        })
        .collect()
}

/// Script order of the Korean collation: symbols, digits, Hangul, then
/// other letters.
fn script_class(c: char) -> u8 {
    match c {
        '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => 2,
        c if c.is_numeric() => 1,
        c if c.is_alphabetic() => 3,
        _ => 0,
    }
}

fn primary_key(c: char) -> (u8, char) {
    (script_class(c), c.to_lowercase().next().unwrap_or(c))
}

/// Korean-locale string comparison.
///
/// Compares by script (Hangul before Latin) and case-folded letter first,
/// then puts lowercase before uppercase, then falls back to code points.
/// Precomposed Hangul syllables are encoded in dictionary order, so code
/// point order within the Hangul class matches Korean collation.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_key)
        .cmp(b.chars().map(primary_key))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Position in [`STATUS_RANK`]; unranked statuses sort last.
pub fn status_rank(status: ProgressStatus) -> usize {
    STATUS_RANK
        .iter()
        .position(|s| *s == status)
        .unwrap_or(STATUS_RANK.len())
}

fn default_order(a: &TableRow<'_>, b: &TableRow<'_>) -> Ordering {
    locale_cmp(a.parent_title, b.parent_title)
        .then_with(|| status_rank(a.item.progress_status).cmp(&status_rank(b.item.progress_status)))
        .then_with(|| {
            let a_start = a.item.plan_start_date.unwrap_or(NaiveDate::MAX);
            let b_start = b.item.plan_start_date.unwrap_or(NaiveDate::MAX);
            a_start.cmp(&b_start)
        })
}

/// Stable sort of rows by the chosen column, or by the default ordering.
pub fn sort_rows(rows: &mut [TableRow<'_>], sort: &SortState) {
    match sort.column {
        None => rows.sort_by(default_order),
        Some(column) => rows.sort_by(|a, b| {
            let ordering = locale_cmp(&a.value(column), &b.value(column));
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }),
    }
}

/// Rows for the table view: projected, filtered, then sorted.
pub fn build_rows<'a>(
    parents: &'a [ParentItem],
    children: &[&'a ChildItem],
    filter: Option<&TableFilter>,
    sort: &SortState,
) -> Vec<TableRow<'a>> {
    let mut rows: Vec<TableRow<'a>> = project(parents, children)
        .into_iter()
        .filter(|row| !row.item.is_deleted())
        .filter(|row| filter.is_none_or(|f| f.matches(row.item)))
        .collect();
    sort_rows(&mut rows, sort);
    rows
}
