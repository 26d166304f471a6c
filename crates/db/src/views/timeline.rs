//! Timeline (Gantt) layout
//!
//! Computes a calendar window aligned to Monday-based weeks, the week grid
//! over it, and for every child the planned and actual bars as fractions
//! of the window width. Rendering is left to the caller.

use chrono::{Datelike, Duration, NaiveDate};

use super::hierarchy::{UNKNOWN_PARENT, resolve_parent};
use crate::models::{Assignee, ChildItem, ParentItem, ProgressStatus};

/// Days of padding added on each side of the dated range
pub const PADDING_DAYS: i64 = 7;

/// Window around today when no item has a date
pub const FALLBACK_DAYS_BEFORE: i64 = 14;
pub const FALLBACK_DAYS_AFTER: i64 = 28;

/// Precedent titles longer than this are shortened in labels
pub const DEPENDENCY_LABEL_CHARS: usize = 8;

/// Korean weekday names indexed by days from Monday
const WEEKDAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// Column label in the form `yy/M/d(요일)`.
pub fn week_label(date: NaiveDate) -> String {
    format!(
        "{}/{}/{}({})",
        date.format("%y"),
        date.month(),
        date.day(),
        WEEKDAYS[date.weekday().num_days_from_monday() as usize]
    )
}

/// Shorten a title to `max_chars` characters followed by `...`.
pub fn truncate_label(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let head: String = title.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Inclusive calendar window of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Horizontal placement of a bar, as fractions of the window width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub offset: f64,
    pub width: f64,
}

impl Window {
    /// Window covering `dates` with one week of padding on each side,
    /// or a fixed span around `today` when there are no dates.
    pub fn covering(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Self {
        let mut range: Option<(NaiveDate, NaiveDate)> = None;
        for d in dates {
            range = Some(match range {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            });
        }

        match range {
            Some((min, max)) => Window {
                start: week_start(min - Duration::days(PADDING_DAYS)),
                end: week_end(max + Duration::days(PADDING_DAYS)),
            },
            None => Window {
                start: week_start(today - Duration::days(FALLBACK_DAYS_BEFORE)),
                end: week_end(today + Duration::days(FALLBACK_DAYS_AFTER)),
            },
        }
    }

    /// Number of days in the window, both ends included.
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Position of `date` within the window. A missing date sits at 0.
    pub fn offset(&self, date: Option<NaiveDate>) -> f64 {
        match date {
            Some(d) => (d - self.start).num_days() as f64 / self.total_days() as f64,
            None => 0.0,
        }
    }

    /// Width of the inclusive range. Zero when either bound is missing or
    /// the range is inverted.
    pub fn width(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> f64 {
        match (start, end) {
            (Some(s), Some(e)) => {
                let days = (e - s).num_days() + 1;
                if days <= 0 {
                    0.0
                } else {
                    days as f64 / self.total_days() as f64
                }
            }
            _ => 0.0,
        }
    }

    /// The bar for a range, or `None` when it would have no width.
    pub fn bar(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Bar> {
        let width = self.width(start, end);
        (width > 0.0).then(|| Bar {
            offset: self.offset(start),
            width,
        })
    }

    /// Week columns across the window.
    pub fn weeks(&self) -> Vec<WeekCell> {
        let width = 7.0 / self.total_days() as f64;
        let mut cells = Vec::new();
        let mut start = week_start(self.start);
        while start <= self.end {
            cells.push(WeekCell {
                start,
                label: week_label(start),
                width,
            });
            start += Duration::days(7);
        }
        cells
    }
}

/// One column of the week grid
#[derive(Debug, Clone, PartialEq)]
pub struct WeekCell {
    pub start: NaiveDate,
    pub label: String,
    /// Fraction of the window width
    pub width: f64,
}

/// Resolved precedent of a child
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyInfo<'a> {
    pub precedent: &'a ChildItem,
    /// Title of the precedent's parent, if it resolves
    pub parent_title: Option<&'a str>,
}

impl DependencyInfo<'_> {
    /// Short label for the row, e.g. `🔗 회의록 정리...`.
    pub fn label(&self) -> String {
        format!(
            "🔗 {}",
            truncate_label(&self.precedent.title, DEPENDENCY_LABEL_CHARS)
        )
    }

    pub fn status(&self) -> ProgressStatus {
        self.precedent.progress_status
    }

    pub fn plan_end(&self) -> Option<NaiveDate> {
        self.precedent.plan_end_date
    }

    pub fn actual_end(&self) -> Option<NaiveDate> {
        self.precedent.actual_end_date
    }

    pub fn assignees(&self) -> &[Assignee] {
        &self.precedent.assignees
    }
}

/// Resolve the precedent of `item` among `children`. A dangling link means
/// no dependency.
pub fn resolve_dependency<'a>(
    item: &ChildItem,
    children: &[&'a ChildItem],
    parents: &'a [ParentItem],
) -> Option<DependencyInfo<'a>> {
    let precedent_id = item.precedent_item_id.as_deref()?;
    let precedent = children.iter().copied().find(|c| c.id == precedent_id)?;
    Some(DependencyInfo {
        precedent,
        parent_title: resolve_parent(precedent.parent_id.as_deref(), parents)
            .map(|p| p.title.as_str()),
    })
}

/// One child row of the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow<'a> {
    pub item: &'a ChildItem,
    pub plan: Option<Bar>,
    pub actual: Option<Bar>,
    pub dependency: Option<DependencyInfo<'a>>,
}

/// Rows under one parent. `parent` is `None` for the unknown-parent group.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineGroup<'a> {
    pub parent: Option<&'a ParentItem>,
    pub rows: Vec<TimelineRow<'a>>,
}

impl TimelineGroup<'_> {
    pub fn title(&self) -> &str {
        self.parent.map(|p| p.title.as_str()).unwrap_or(UNKNOWN_PARENT)
    }
}

/// Complete timeline layout
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout<'a> {
    pub window: Window,
    pub weeks: Vec<WeekCell>,
    pub groups: Vec<TimelineGroup<'a>>,
}

impl<'a> TimelineLayout<'a> {
    /// Lay out `children` grouped under `parents` (in parent order).
    ///
    /// Deleted children are skipped. Children whose parent does not resolve
    /// are collected in a trailing unknown-parent group.
    pub fn build(
        parents: &'a [ParentItem],
        children: &[&'a ChildItem],
        today: NaiveDate,
    ) -> Self {
        let live: Vec<&'a ChildItem> = children
            .iter()
            .copied()
            .filter(|c| !c.is_deleted())
            .collect();
        let window = Window::covering(live.iter().flat_map(|c| c.dates()), today);

        let row = |item: &'a ChildItem| TimelineRow {
            item,
            plan: window.bar(item.plan_start_date, item.plan_end_date),
            actual: window.bar(item.actual_start_date, item.actual_end_date),
            dependency: resolve_dependency(item, &live, parents),
        };

        let mut groups: Vec<TimelineGroup<'a>> = parents
            .iter()
            .map(|parent| TimelineGroup {
                parent: Some(parent),
                rows: live
                    .iter()
                    .copied()
                    .filter(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                    .map(row)
                    .collect(),
            })
            .collect();

        let orphans: Vec<TimelineRow<'a>> = live
            .iter()
            .copied()
            .filter(|c| resolve_parent(c.parent_id.as_deref(), parents).is_none())
            .map(row)
            .collect();
        if !orphans.is_empty() {
            groups.push(TimelineGroup {
                parent: None,
                rows: orphans,
            });
        }

        Self {
            window,
            weeks: window.weeks(),
            groups,
        }
    }

    pub fn total_days(&self) -> i64 {
        self.window.total_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_bounds() {
        // 2025-01-15 is a Wednesday
        assert_eq!(week_start(date(2025, 1, 15)), date(2025, 1, 13));
        assert_eq!(week_end(date(2025, 1, 15)), date(2025, 1, 19));
        assert_eq!(week_start(date(2025, 1, 13)), date(2025, 1, 13));
        assert_eq!(week_end(date(2025, 1, 19)), date(2025, 1, 19));
    }

    #[test]
    fn test_week_label() {
        assert_eq!(week_label(date(2025, 1, 6)), "25/1/6(월)");
        assert_eq!(week_label(date(2024, 12, 29)), "24/12/29(일)");
    }

    #[test]
    fn test_window_pads_to_weeks() {
        let window = Window::covering([date(2025, 1, 20), date(2025, 1, 15)], date(2030, 1, 1));
        assert_eq!(window.start, date(2025, 1, 6));
        assert_eq!(window.end, date(2025, 2, 2));
        assert_eq!(window.total_days(), 28);
        assert!(window.start <= date(2025, 1, 15) - Duration::days(PADDING_DAYS));
        assert!(window.end >= date(2025, 1, 20) + Duration::days(PADDING_DAYS));
    }

    #[test]
    fn test_fallback_window_around_today() {
        for offset in 0..7 {
            let today = date(2025, 6, 2) + Duration::days(offset);
            let window = Window::covering([], today);
            assert!(window.total_days() >= 42);
            assert!(window.start <= today - Duration::days(FALLBACK_DAYS_BEFORE));
            assert!(window.end >= today + Duration::days(FALLBACK_DAYS_AFTER));
        }
    }

    #[test]
    fn test_week_count_matches_total_days() {
        let window = Window::covering([date(2025, 3, 3), date(2025, 4, 17)], date(2025, 1, 1));
        let weeks = window.weeks();
        let expected = (window.total_days() + 6) / 7;
        assert_eq!(weeks.len() as i64, expected);
        assert_eq!(weeks[0].start, window.start);
        assert!(weeks.iter().all(|w| w.start.weekday().num_days_from_monday() == 0));
    }

    #[test]
    fn test_offsets_and_widths() {
        let window = Window {
            start: date(2025, 1, 6),
            end: date(2025, 2, 2),
        };
        let bar = window
            .bar(Some(date(2025, 1, 15)), Some(date(2025, 1, 20)))
            .unwrap();
        assert!((bar.offset - 9.0 / 28.0).abs() < 1e-9);
        assert!((bar.width - 6.0 / 28.0).abs() < 1e-9);
        assert_eq!(window.offset(None), 0.0);
    }

    #[test]
    fn test_partial_or_inverted_range_has_no_width() {
        let window = Window {
            start: date(2025, 1, 6),
            end: date(2025, 2, 2),
        };
        assert_eq!(window.width(Some(date(2025, 1, 10)), None), 0.0);
        assert_eq!(window.width(None, Some(date(2025, 1, 10))), 0.0);
        assert_eq!(
            window.width(Some(date(2025, 1, 20)), Some(date(2025, 1, 10))),
            0.0
        );
        assert!(window.bar(Some(date(2025, 1, 10)), None).is_none());
        // a single-day range still has a bar
        assert!(
            window
                .bar(Some(date(2025, 1, 10)), Some(date(2025, 1, 10)))
                .is_some()
        );
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("짧은 제목", 8), "짧은 제목");
        assert_eq!(truncate_label("아주 긴 선행 아이템 제목", 8), "아주 긴 선행 ...");
        assert_eq!(truncate_label("12345678", 8), "12345678");
        assert_eq!(truncate_label("123456789", 8), "12345678...");
    }

    #[test]
    fn test_layout_groups_rows_and_dependencies() {
        let parents = vec![
            ParentItem::new("p1", "Alpha"),
            ParentItem::new("p2", "Beta"),
        ];
        let children = vec![
            ChildItem::new("c1", "Write the long proposal")
                .with_parent("p1")
                .with_plan(Some(date(2025, 1, 15)), Some(date(2025, 1, 20))),
            ChildItem::new("c2", "Review")
                .with_parent("p2")
                .with_plan(Some(date(2025, 1, 21)), None)
                .with_precedent("c1"),
            ChildItem::new("c3", "Lost").with_parent("gone").with_precedent("missing"),
            ChildItem::new("c4", "Removed")
                .with_parent("p1")
                .with_status(ProgressStatus::Deleted),
        ];
        let visible: Vec<_> = children.iter().collect();
        let layout = TimelineLayout::build(&parents, &visible, date(2030, 1, 1));

        assert_eq!(layout.groups.len(), 3);
        assert_eq!(layout.groups[0].title(), "Alpha");
        assert_eq!(layout.groups[0].rows.len(), 1);
        assert!(layout.groups[0].rows[0].plan.is_some());
        assert!(layout.groups[0].rows[0].actual.is_none());

        let review = &layout.groups[1].rows[0];
        assert!(review.plan.is_none());
        let dep = review.dependency.as_ref().unwrap();
        assert_eq!(dep.precedent.id, "c1");
        assert_eq!(dep.parent_title, Some("Alpha"));
        assert_eq!(dep.label(), "🔗 Write th...");

        assert_eq!(layout.groups[2].title(), UNKNOWN_PARENT);
        assert!(layout.groups[2].rows[0].dependency.is_none());
        assert_eq!(layout.weeks.len() as i64, layout.total_days() / 7);
    }
}
