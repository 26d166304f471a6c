//! Data models for the action tracker
//!
//! Defines the two entity shapes stored upstream (parent and child action
//! items), their option enums, and the create/patch payload types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Maximum number of assignees on a child item.
pub const MAX_ASSIGNEES: usize = 3;

/// Declares an option enum whose variants map to the fixed option labels
/// stored upstream, plus an English slug accepted on the command line.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($label:literal, $slug:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every value, in canonical display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the option label stored upstream
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Returns the ASCII slug used on the command line
            pub fn slug(&self) -> &'static str {
                match self {
                    $( $name::$variant => $slug, )+
                }
            }

            /// Exact match on the upstream label only
            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == label)
            }

            /// Parse either the upstream label or the slug.
            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s || v.slug().eq_ignore_ascii_case(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

option_enum! {
    /// Organizational bucket a parent item belongs to
    Category {
        Strategy => ("기조실", "strategy"),
        Operations => ("실무총괄", "operations"),
        Planning => ("기획실", "planning"),
    }
}

option_enum! {
    /// Status of a parent (1-depth) item
    ParentStatus {
        Waiting => ("대기", "waiting"),
        InProgress => ("진행", "in-progress"),
        Done => ("완료", "done"),
        OnHold => ("보류", "on-hold"),
        /// Soft-delete sentinel
        Deleted => ("삭제", "deleted"),
    }
}

option_enum! {
    /// Progress status of a child (2-depth) item
    ProgressStatus {
        Idea => ("아이디어", "idea"),
        Reviewing => ("검토 중", "reviewing"),
        InProgress => ("진행 중", "in-progress"),
        Done => ("완료", "done"),
        OnHold => ("보류", "on-hold"),
        /// Soft-delete sentinel
        Deleted => ("삭제", "deleted"),
    }
}

option_enum! {
    /// Team members an item can be assigned to
    Assignee {
        Sanghyuk => ("상혁님", "sanghyuk"),
        Gwangcheol => ("광철님", "gwangcheol"),
        Jongok => ("종옥님", "jongok"),
        Other => ("기타", "other"),
    }
}

impl ParentStatus {
    /// Statuses a user may pick (everything but the delete sentinel)
    pub fn selectable() -> impl Iterator<Item = ParentStatus> {
        Self::ALL.iter().copied().filter(|s| *s != ParentStatus::Deleted)
    }
}

impl ProgressStatus {
    /// Statuses a user may pick (everything but the delete sentinel)
    pub fn selectable() -> impl Iterator<Item = ProgressStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| *s != ProgressStatus::Deleted)
    }

    /// Status implied by the actual execution dates.
    ///
    /// An actual end date means the item is done; an actual start date
    /// means it is in progress; otherwise the chosen status stands.
    pub fn derive_from_actual(
        actual_start: Option<NaiveDate>,
        actual_end: Option<NaiveDate>,
        chosen: ProgressStatus,
    ) -> ProgressStatus {
        if actual_end.is_some() {
            ProgressStatus::Done
        } else if actual_start.is_some() {
            ProgressStatus::InProgress
        } else {
            chosen
        }
    }
}

/// A parent (1-depth) action item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentItem {
    /// Upstream page id
    pub id: String,
    pub title: String,
    /// Creation-order number used for default ordering
    pub sequence_number: i64,
    pub category: Option<Category>,
    pub status: ParentStatus,
    pub created_time: Option<DateTime<Utc>>,
    /// Ids of the child items linked from this parent upstream
    pub child_ids: Vec<String>,
}

impl ParentItem {
    /// Create a parent item with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sequence_number: 0,
            category: None,
            status: ParentStatus::Waiting,
            created_time: None,
            child_ids: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: ParentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_sequence_number(mut self, n: i64) -> Self {
        self.sequence_number = n;
        self
    }
}

/// A child (2-depth) action item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildItem {
    /// Upstream page id
    pub id: String,
    pub title: String,
    pub sequence_number: i64,
    /// May reference a parent that no longer exists
    pub parent_id: Option<String>,
    pub assignees: Vec<Assignee>,
    pub progress_status: ProgressStatus,
    pub plan_start_date: Option<NaiveDate>,
    pub plan_end_date: Option<NaiveDate>,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    /// Single predecessor; never checked for cycles
    pub precedent_item_id: Option<String>,
    pub details: String,
    pub unique_notes: String,
    pub last_modified_by: String,
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl ChildItem {
    /// Create a child item with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sequence_number: 0,
            parent_id: None,
            assignees: Vec::new(),
            progress_status: ProgressStatus::Idea,
            plan_start_date: None,
            plan_end_date: None,
            actual_start_date: None,
            actual_end_date: None,
            precedent_item_id: None,
            details: String::new(),
            unique_notes: String::new(),
            last_modified_by: String::new(),
            last_modified_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        self.progress_status = status;
        self
    }

    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = Assignee>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    pub fn with_plan(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.plan_start_date = start;
        self.plan_end_date = end;
        self
    }

    pub fn with_actual(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.actual_start_date = start;
        self.actual_end_date = end;
        self
    }

    pub fn with_precedent(mut self, precedent_id: impl Into<String>) -> Self {
        self.precedent_item_id = Some(precedent_id.into());
        self
    }

    /// All four schedule dates that are set, in field order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        [
            self.plan_start_date,
            self.plan_end_date,
            self.actual_start_date,
            self.actual_end_date,
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_deleted(&self) -> bool {
        self.progress_status == ProgressStatus::Deleted
    }

    /// Planned end is strictly before `today` and the item is not done.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_deleted()
            && self.progress_status != ProgressStatus::Done
            && self.plan_end_date.is_some_and(|end| end < today)
    }

    /// Assignee labels joined for display.
    pub fn assignee_names(&self) -> String {
        self.assignees
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn require_title(title: &str) -> DbResult<()> {
    if title.trim().is_empty() {
        return Err(DbError::validation("Title is required"));
    }
    Ok(())
}

fn validate_assignees(assignees: &[Assignee]) -> DbResult<()> {
    if assignees.len() > MAX_ASSIGNEES {
        return Err(DbError::validation(format!(
            "At most {} assignees are allowed, got {}",
            MAX_ASSIGNEES,
            assignees.len()
        )));
    }
    for (i, a) in assignees.iter().enumerate() {
        if assignees[..i].contains(a) {
            return Err(DbError::validation(format!("Duplicate assignee '{}'", a)));
        }
    }
    Ok(())
}

/// Fields for creating a parent item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParent {
    pub title: String,
    pub category: Category,
    pub status: ParentStatus,
}

impl NewParent {
    /// New parent with the default `대기` status.
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            status: ParentStatus::Waiting,
        }
    }

    pub fn with_status(mut self, status: ParentStatus) -> Self {
        self.status = status;
        self
    }

    /// Check required fields before any request is issued.
    pub fn validate(&self) -> DbResult<()> {
        require_title(&self.title)
    }
}

/// Fields for creating a child item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChild {
    pub title: String,
    pub parent_id: String,
    pub assignees: Vec<Assignee>,
    pub progress_status: ProgressStatus,
    pub plan_start_date: Option<NaiveDate>,
    pub plan_end_date: Option<NaiveDate>,
    pub details: String,
    pub unique_notes: String,
    pub precedent_item_id: Option<String>,
}

impl NewChild {
    /// New child under `parent_id` with the default `아이디어` status.
    pub fn new(title: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            parent_id: parent_id.into(),
            assignees: Vec::new(),
            progress_status: ProgressStatus::Idea,
            plan_start_date: None,
            plan_end_date: None,
            details: String::new(),
            unique_notes: String::new(),
            precedent_item_id: None,
        }
    }

    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        self.progress_status = status;
        self
    }

    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = Assignee>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    pub fn with_plan(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.plan_start_date = start;
        self.plan_end_date = end;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_unique_notes(mut self, notes: impl Into<String>) -> Self {
        self.unique_notes = notes.into();
        self
    }

    pub fn with_precedent(mut self, precedent_id: impl Into<String>) -> Self {
        self.precedent_item_id = Some(precedent_id.into());
        self
    }

    /// Check required fields before any request is issued.
    pub fn validate(&self) -> DbResult<()> {
        require_title(&self.title)?;
        if self.parent_id.trim().is_empty() {
            return Err(DbError::validation("Parent item is required"));
        }
        validate_assignees(&self.assignees)
    }
}

/// Partial update for a parent item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentUpdate {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub status: Option<ParentStatus>,
}

impl ParentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: ParentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any updates are specified
    pub fn has_updates(&self) -> bool {
        self.title.is_some() || self.category.is_some() || self.status.is_some()
    }

    pub fn validate(&self) -> DbResult<()> {
        if !self.has_updates() {
            return Err(DbError::validation("No fields to update"));
        }
        if let Some(title) = &self.title {
            require_title(title)?;
        }
        Ok(())
    }
}

/// Partial update for a child item.
///
/// Outer `None` leaves a field untouched. For clearable fields the inner
/// `None` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildUpdate {
    pub title: Option<String>,
    pub parent_id: Option<String>,
    pub assignees: Option<Vec<Assignee>>,
    pub progress_status: Option<ProgressStatus>,
    pub plan_start_date: Option<Option<NaiveDate>>,
    pub plan_end_date: Option<Option<NaiveDate>>,
    pub actual_start_date: Option<Option<NaiveDate>>,
    pub actual_end_date: Option<Option<NaiveDate>>,
    pub details: Option<String>,
    pub unique_notes: Option<String>,
    pub precedent_item_id: Option<Option<String>>,
}

impl ChildUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = Assignee>) -> Self {
        self.assignees = Some(assignees.into_iter().collect());
        self
    }

    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        self.progress_status = Some(status);
        self
    }

    pub fn with_plan_start(mut self, date: Option<NaiveDate>) -> Self {
        self.plan_start_date = Some(date);
        self
    }

    pub fn with_plan_end(mut self, date: Option<NaiveDate>) -> Self {
        self.plan_end_date = Some(date);
        self
    }

    pub fn with_actual_start(mut self, date: Option<NaiveDate>) -> Self {
        self.actual_start_date = Some(date);
        self
    }

    pub fn with_actual_end(mut self, date: Option<NaiveDate>) -> Self {
        self.actual_end_date = Some(date);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_unique_notes(mut self, notes: impl Into<String>) -> Self {
        self.unique_notes = Some(notes.into());
        self
    }

    pub fn with_precedent(mut self, precedent_id: Option<String>) -> Self {
        self.precedent_item_id = Some(precedent_id);
        self
    }

    /// Check if any updates are specified
    pub fn has_updates(&self) -> bool {
        self.title.is_some()
            || self.parent_id.is_some()
            || self.assignees.is_some()
            || self.progress_status.is_some()
            || self.plan_start_date.is_some()
            || self.plan_end_date.is_some()
            || self.actual_start_date.is_some()
            || self.actual_end_date.is_some()
            || self.details.is_some()
            || self.unique_notes.is_some()
            || self.precedent_item_id.is_some()
    }

    pub fn validate(&self) -> DbResult<()> {
        if !self.has_updates() {
            return Err(DbError::validation("No fields to update"));
        }
        if let Some(title) = &self.title {
            require_title(title)?;
        }
        if let Some(parent_id) = &self.parent_id
            && parent_id.trim().is_empty()
        {
            return Err(DbError::validation("Parent item is required"));
        }
        if let Some(assignees) = &self.assignees {
            validate_assignees(assignees)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_progress_status_labels() {
        assert_eq!(ProgressStatus::Idea.as_str(), "아이디어");
        assert_eq!(ProgressStatus::Reviewing.as_str(), "검토 중");
        assert_eq!(ProgressStatus::InProgress.as_str(), "진행 중");
        assert_eq!(ProgressStatus::Done.as_str(), "완료");
        assert_eq!(ProgressStatus::OnHold.as_str(), "보류");
        assert_eq!(ProgressStatus::Deleted.as_str(), "삭제");
    }

    #[test]
    fn test_parent_status_in_progress_differs_from_child() {
        assert_eq!(ParentStatus::InProgress.as_str(), "진행");
        assert_ne!(
            ParentStatus::InProgress.as_str(),
            ProgressStatus::InProgress.as_str()
        );
    }

    #[test]
    fn test_parse_accepts_label_and_slug() {
        assert_eq!(Category::parse("기조실"), Some(Category::Strategy));
        assert_eq!(Category::parse("planning"), Some(Category::Planning));
        assert_eq!(Category::parse("PLANNING"), Some(Category::Planning));
        assert_eq!(ProgressStatus::parse("검토 중"), Some(ProgressStatus::Reviewing));
        assert_eq!(ProgressStatus::parse("in-progress"), Some(ProgressStatus::InProgress));
        assert_eq!(Assignee::parse("기타"), Some(Assignee::Other));
        assert_eq!(Assignee::parse("nobody"), None);
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(format!("{}", ParentStatus::OnHold), "보류");
        assert_eq!(format!("{}", Assignee::Jongok), "종옥님");
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&ProgressStatus::InProgress).unwrap();
        assert_eq!(json, "\"진행 중\"");
        let parsed: Category = serde_json::from_str("\"실무총괄\"").unwrap();
        assert_eq!(parsed, Category::Operations);
    }

    #[test]
    fn test_selectable_excludes_deleted() {
        assert!(ProgressStatus::selectable().all(|s| s != ProgressStatus::Deleted));
        assert_eq!(ProgressStatus::selectable().count(), 5);
        assert_eq!(ParentStatus::selectable().count(), 4);
    }

    #[test]
    fn test_derive_from_actual() {
        let d = Some(date(2025, 3, 1));
        assert_eq!(
            ProgressStatus::derive_from_actual(d, d, ProgressStatus::Idea),
            ProgressStatus::Done
        );
        assert_eq!(
            ProgressStatus::derive_from_actual(None, d, ProgressStatus::Reviewing),
            ProgressStatus::Done
        );
        assert_eq!(
            ProgressStatus::derive_from_actual(d, None, ProgressStatus::Idea),
            ProgressStatus::InProgress
        );
        assert_eq!(
            ProgressStatus::derive_from_actual(None, None, ProgressStatus::OnHold),
            ProgressStatus::OnHold
        );
    }

    #[test]
    fn test_child_dates_skips_missing() {
        let child = ChildItem::new("c1", "T").with_plan(Some(date(2025, 1, 2)), None).with_actual(
            None,
            Some(date(2025, 1, 9)),
        );
        let dates: Vec<_> = child.dates().collect();
        assert_eq!(dates, vec![date(2025, 1, 2), date(2025, 1, 9)]);
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2025, 5, 10);
        let late = ChildItem::new("c1", "T")
            .with_status(ProgressStatus::InProgress)
            .with_plan(None, Some(date(2025, 5, 9)));
        assert!(late.is_overdue(today));

        let due_today = late.clone().with_plan(None, Some(today));
        assert!(!due_today.is_overdue(today));

        let done = late.clone().with_status(ProgressStatus::Done);
        assert!(!done.is_overdue(today));

        let deleted = late.with_status(ProgressStatus::Deleted);
        assert!(!deleted.is_overdue(today));
    }

    #[test]
    fn test_assignee_names_joined() {
        let child = ChildItem::new("c1", "T").with_assignees([Assignee::Sanghyuk, Assignee::Other]);
        assert_eq!(child.assignee_names(), "상혁님, 기타");
    }

    #[test]
    fn test_new_parent_requires_title() {
        let err = NewParent::new("   ", Category::Strategy).validate().unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
        assert!(NewParent::new("A", Category::Strategy).validate().is_ok());
    }

    #[test]
    fn test_new_parent_defaults_to_waiting() {
        assert_eq!(NewParent::new("A", Category::Planning).status, ParentStatus::Waiting);
    }

    #[test]
    fn test_new_child_requires_parent() {
        let err = NewChild::new("T1", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "Parent item is required");
    }

    #[test]
    fn test_new_child_assignee_limit() {
        let child = NewChild::new("T1", "p1").with_assignees([
            Assignee::Sanghyuk,
            Assignee::Gwangcheol,
            Assignee::Jongok,
            Assignee::Other,
        ]);
        let err = child.validate().unwrap_err();
        assert_eq!(err.to_string(), "At most 3 assignees are allowed, got 4");
    }

    #[test]
    fn test_new_child_duplicate_assignee() {
        let child = NewChild::new("T1", "p1").with_assignees([Assignee::Other, Assignee::Other]);
        assert!(child.validate().is_err());
    }

    #[test]
    fn test_parent_update_empty_is_rejected() {
        let err = ParentUpdate::new().validate().unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[test]
    fn test_child_update_distinguishes_clear_from_absent() {
        let update = ChildUpdate::new().with_plan_start(None);
        assert_eq!(update.plan_start_date, Some(None));
        assert_eq!(update.plan_end_date, None);
        assert!(update.has_updates());
    }

    #[test]
    fn test_child_update_rejects_blank_title() {
        assert!(ChildUpdate::new().with_title(" ").validate().is_err());
        assert!(ChildUpdate::new().with_title("ok").validate().is_ok());
    }
}
