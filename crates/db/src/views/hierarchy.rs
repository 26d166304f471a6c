//! Parent/child resolution, category filtering and status counts

use std::collections::BTreeMap;

use crate::models::{Category, ChildItem, ParentItem, ProgressStatus};

/// Display value for a child whose parent cannot be resolved
pub const UNKNOWN_PARENT: &str = "(알 수 없음)";

/// Count of children per progress status
pub type StatusCounts = BTreeMap<ProgressStatus, usize>;

/// Children whose `parent_id` equals `parent_id`, in input order.
pub fn children_of<'a>(parent_id: &str, children: &'a [ChildItem]) -> Vec<&'a ChildItem> {
    children
        .iter()
        .filter(|c| c.parent_id.as_deref() == Some(parent_id))
        .collect()
}

/// Find the parent a child points at, if it is in the collection.
pub fn resolve_parent<'a>(
    parent_id: Option<&str>,
    parents: &'a [ParentItem],
) -> Option<&'a ParentItem> {
    let parent_id = parent_id?;
    parents.iter().find(|p| p.id == parent_id)
}

/// Parent title for display, or the unknown-parent placeholder.
pub fn parent_title<'a>(child: &ChildItem, parents: &'a [ParentItem]) -> &'a str {
    resolve_parent(child.parent_id.as_deref(), parents)
        .map(|p| p.title.as_str())
        .unwrap_or(UNKNOWN_PARENT)
}

/// Children visible under a category tab.
///
/// With a category, only children whose resolved parent has it are kept;
/// children with an unresolved parent only appear when `category` is `None`.
pub fn filter_by_category<'a>(
    category: Option<Category>,
    parents: &[ParentItem],
    children: &'a [ChildItem],
) -> Vec<&'a ChildItem> {
    match category {
        None => children.iter().collect(),
        Some(category) => children
            .iter()
            .filter(|c| {
                resolve_parent(c.parent_id.as_deref(), parents)
                    .is_some_and(|p| p.category == Some(category))
            })
            .collect(),
    }
}

/// Count per status. Deleted children are never counted.
pub fn status_counts<'a>(children: impl IntoIterator<Item = &'a ChildItem>) -> StatusCounts {
    let mut counts = StatusCounts::new();
    for child in children {
        if child.is_deleted() {
            continue;
        }
        *counts.entry(child.progress_status).or_insert(0) += 1;
    }
    counts
}

/// One parent with its children for the list view
#[derive(Debug, Clone, PartialEq)]
pub struct ParentNode<'a> {
    pub parent: &'a ParentItem,
    pub children: Vec<&'a ChildItem>,
    pub counts: StatusCounts,
}

/// List view model: parents in input order, then children without a known parent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView<'a> {
    pub groups: Vec<ParentNode<'a>>,
    pub orphans: Vec<&'a ChildItem>,
}

impl ListView<'_> {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.orphans.is_empty()
    }
}

/// Build the list view from already-filtered collections.
pub fn build_list<'a>(parents: &'a [ParentItem], children: &[&'a ChildItem]) -> ListView<'a> {
    let live: Vec<&'a ChildItem> = children.iter().copied().filter(|c| !c.is_deleted()).collect();

    let groups = parents
        .iter()
        .map(|parent| {
            let kids: Vec<&'a ChildItem> = live
                .iter()
                .copied()
                .filter(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                .collect();
            ParentNode {
                parent,
                counts: status_counts(kids.iter().copied()),
                children: kids,
            }
        })
        .collect();

    let orphans = live
        .iter()
        .copied()
        .filter(|c| resolve_parent(c.parent_id.as_deref(), parents).is_none())
        .collect();

    ListView { groups, orphans }
}
