//! Statistics over child items
//!
//! Everything here works on the non-deleted children inside an optional
//! planned-start window.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Assignee, ChildItem, ProgressStatus};

/// Inclusive window on `plan_start_date`. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StatsWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether an item counts. With any bound set, items without a planned
    /// start are excluded.
    pub fn contains(&self, item: &ChildItem) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(start) = item.plan_start_date else {
            return false;
        };
        self.from.is_none_or(|from| from <= start) && self.to.is_none_or(|to| start <= to)
    }
}

/// Per-assignee counts by status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeStats {
    pub assignee: Assignee,
    pub total: usize,
    /// One entry per selectable status, in declaration order, zero-filled
    pub counts: Vec<(ProgressStatus, usize)>,
}

impl AssigneeStats {
    fn new(assignee: Assignee) -> Self {
        Self {
            assignee,
            total: 0,
            counts: ProgressStatus::selectable().map(|s| (s, 0)).collect(),
        }
    }

    pub fn count(&self, status: ProgressStatus) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Number of items with one status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTotal {
    pub status: ProgressStatus,
    pub count: usize,
}

/// An overdue item with how many days it is late
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueItem<'a> {
    pub item: &'a ChildItem,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub on_hold: usize,
    pub overdue: usize,
    pub completion_rate: u32,
}

/// Percentage of done items, rounded half up. 0 for an empty set.
pub fn completion_rate(total: usize, done: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}

/// Full statistics view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics<'a> {
    /// Sorted by total, largest first
    pub by_assignee: Vec<AssigneeStats>,
    /// Statuses present in the window, largest count first
    pub by_status: Vec<StatusTotal>,
    /// Sorted by planned end, earliest first
    pub overdue: Vec<OverdueItem<'a>>,
    pub summary: Summary,
}

impl<'a> Statistics<'a> {
    pub fn compute(children: &[&'a ChildItem], window: StatsWindow, today: NaiveDate) -> Self {
        let items: Vec<&'a ChildItem> = children
            .iter()
            .copied()
            .filter(|c| !c.is_deleted() && window.contains(c))
            .collect();

        let by_assignee = assignee_stats(&items);
        let by_status = status_totals(&items);
        let overdue = overdue_items(&items, today);

        let count = |status: ProgressStatus| {
            items
                .iter()
                .filter(|c| c.progress_status == status)
                .count()
        };
        let done = count(ProgressStatus::Done);
        let summary = Summary {
            total: items.len(),
            done,
            in_progress: count(ProgressStatus::InProgress),
            on_hold: count(ProgressStatus::OnHold),
            overdue: overdue.len(),
            completion_rate: completion_rate(items.len(), done),
        };

        Self {
            by_assignee,
            by_status,
            overdue,
            summary,
        }
    }
}

/// Counts per assignee. An item with several assignees counts once for
/// each; items without one are not counted here. Ties keep first-seen order.
pub fn assignee_stats(items: &[&ChildItem]) -> Vec<AssigneeStats> {
    let mut stats: Vec<AssigneeStats> = Vec::new();
    for item in items {
        for assignee in &item.assignees {
            let entry = match stats.iter().position(|s| s.assignee == *assignee) {
                Some(i) => &mut stats[i],
                None => {
                    stats.push(AssigneeStats::new(*assignee));
                    let last = stats.len() - 1;
                    &mut stats[last]
                }
            };
            entry.total += 1;
            if let Some((_, n)) = entry
                .counts
                .iter_mut()
                .find(|(s, _)| *s == item.progress_status)
            {
                *n += 1;
            }
        }
    }
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

/// Totals for statuses that occur. Ties keep first-seen order.
pub fn status_totals(items: &[&ChildItem]) -> Vec<StatusTotal> {
    let mut totals: Vec<StatusTotal> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|t| t.status == item.progress_status) {
            Some(total) => total.count += 1,
            None => totals.push(StatusTotal {
                status: item.progress_status,
                count: 1,
            }),
        }
    }
    totals.sort_by(|a, b| b.count.cmp(&a.count));
    totals
}

/// Items past their planned end and not done, earliest end first.
pub fn overdue_items<'a>(items: &[&'a ChildItem], today: NaiveDate) -> Vec<OverdueItem<'a>> {
    let mut overdue: Vec<OverdueItem<'a>> = items
        .iter()
        .copied()
        .filter(|c| c.is_overdue(today))
        .map(|item| OverdueItem {
            item,
            days_overdue: item
                .plan_end_date
                .map(|end| (today - end).num_days().max(0))
                .unwrap_or(0),
        })
        .collect();
    overdue.sort_by_key(|o| o.item.plan_end_date);
    overdue
}
