//! Output formatting for the action tracker CLI
//!
//! Renders the view models from `actrack_db::views` as plain text.

use std::fmt::Write;

use actrack_db::views::{
    Column, ListView, Statistics, StatusCounts, TableRow, TimelineLayout, display_date,
};
use actrack_db::{ChildItem, ParentItem, ProgressStatus};
use chrono::NaiveDate;

/// Maximum width of a table cell before truncation
const MAX_CELL_WIDTH: usize = 24;

/// Width of the label column in the timeline
const TIMELINE_LABEL_WIDTH: usize = 24;

/// Characters per day in the timeline grid
const DAY_WIDTH: usize = 2;

/// Truncate to `max_width` characters, adding an ellipsis when cut.
pub fn truncate(s: &str, max_width: usize) -> String {
    let count = s.chars().count();
    if count <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    }
}

/// Left-align to `width` characters.
fn pad(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - count))
    }
}

/// Render counts as `아이디어 1 · 완료 2`, in status order.
pub fn format_counts(counts: &StatusCounts) -> String {
    counts
        .iter()
        .map(|(status, n)| format!("{} {}", status, n))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn format_plan(item: &ChildItem) -> String {
    match (item.plan_start_date, item.plan_end_date) {
        (None, None) => String::new(),
        (start, end) => format!("  {} ~ {}", display_date(start), display_date(end)),
    }
}

fn format_child_line(item: &ChildItem) -> String {
    let assignees = item.assignee_names();
    let mut line = format!("  - #{} {} [{}]", item.sequence_number, item.title, item.progress_status);
    if !assignees.is_empty() {
        let _ = write!(line, " {}", assignees);
    }
    line.push_str(&format_plan(item));
    let _ = write!(line, "  ({})", item.id);
    line
}

/// Format the list view: each parent with its children, then the children
/// without a known parent.
///
/// ```text
/// [기조실] #1 Quarterly plan (대기)  아이디어 1 · 진행 중 1
///   - #3 Draft [진행 중] 상혁님  2025.01.06 ~ 2025.01.31  (page-id)
/// ```
pub fn format_list(view: &ListView<'_>) -> String {
    if view.is_empty() {
        return "No items found.".to_string();
    }

    let mut output = String::new();
    for node in &view.groups {
        let parent = node.parent;
        let _ = write!(output, "{}", parent_heading(parent));
        if !node.counts.is_empty() {
            let _ = write!(output, "  {}", format_counts(&node.counts));
        }
        output.push('\n');
        for child in &node.children {
            output.push_str(&format_child_line(child));
            output.push('\n');
        }
    }

    if !view.orphans.is_empty() {
        output.push_str(actrack_db::views::UNKNOWN_PARENT);
        output.push('\n');
        for child in &view.orphans {
            output.push_str(&format_child_line(child));
            output.push('\n');
        }
    }

    output.trim_end().to_string()
}

fn parent_heading(parent: &ParentItem) -> String {
    let category = parent.category.map(|c| c.as_str()).unwrap_or("-");
    format!(
        "[{}] #{} {} ({})  ({})",
        category, parent.sequence_number, parent.title, parent.status, parent.id
    )
}

/// Format table rows with every column, aligned.
pub fn format_table(rows: &[TableRow<'_>]) -> String {
    if rows.is_empty() {
        return "No items found.".to_string();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            Column::ALL
                .iter()
                .map(|c| truncate(&row.cell(*c), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = Column::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .max()
                .unwrap_or(0)
                .max(c.label().chars().count())
        })
        .collect();

    let render = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| pad(v, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    output.push_str(&render(Column::ALL.iter().map(|c| c.label().to_string()).collect()));
    output.push('\n');
    output.push_str(&render(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in cells {
        output.push('\n');
        output.push_str(&render(row));
    }
    output
}

fn bar_span(offset: f64, width: f64, days: usize) -> (usize, usize) {
    let start = (offset * days as f64).round() as usize;
    let len = (width * days as f64).round().max(1.0) as usize;
    (start.min(days), len.min(days.saturating_sub(start)))
}

/// Format the timeline as a character grid, one row per child.
///
/// Planned ranges draw as `=`, actual ranges as `#` on top, and today as
/// `|` where nothing else is drawn.
pub fn format_timeline(layout: &TimelineLayout<'_>, today: NaiveDate) -> String {
    let days = layout.total_days().max(0) as usize;
    let mut output = String::new();

    let mut header = pad("", TIMELINE_LABEL_WIDTH);
    for week in &layout.weeks {
        header.push_str(&pad(&week.label, 7 * DAY_WIDTH));
    }
    output.push_str(header.trim_end());

    if layout.groups.is_empty() {
        output.push_str("\nNo items found.");
        return output;
    }

    let today_col = (today >= layout.window.start && today <= layout.window.end)
        .then(|| (today - layout.window.start).num_days() as usize);

    for group in &layout.groups {
        let _ = write!(output, "\n{}", group.title());
        for row in &group.rows {
            let mut grid = vec![' '; days];
            if let Some(col) = today_col {
                grid[col] = '|';
            }
            for (bar, mark) in [(row.plan, '='), (row.actual, '#')] {
                if let Some(bar) = bar {
                    let (start, len) = bar_span(bar.offset, bar.width, days);
                    for cell in grid.iter_mut().skip(start).take(len) {
                        *cell = mark;
                    }
                }
            }

            let label = truncate(&format!("  {}", row.item.title), TIMELINE_LABEL_WIDTH - 1);
            let mut line = pad(&label, TIMELINE_LABEL_WIDTH);
            for cell in grid {
                for _ in 0..DAY_WIDTH {
                    line.push(cell);
                }
            }
            if let Some(dep) = &row.dependency {
                let _ = write!(line, " {}", dep.label());
            }
            output.push('\n');
            output.push_str(line.trim_end());
        }
    }
    output
}

/// Format the statistics view.
pub fn format_stats(stats: &Statistics<'_>) -> String {
    let s = &stats.summary;
    let mut output = String::new();
    let _ = writeln!(output, "Summary");
    let _ = writeln!(output, "  Total:       {}", s.total);
    let _ = writeln!(output, "  Done:        {}", s.done);
    let _ = writeln!(output, "  In progress: {}", s.in_progress);
    let _ = writeln!(output, "  On hold:     {}", s.on_hold);
    let _ = writeln!(output, "  Overdue:     {}", s.overdue);
    let _ = writeln!(output, "  Completion:  {}%", s.completion_rate);

    let _ = writeln!(output, "\nBy assignee");
    if stats.by_assignee.is_empty() {
        let _ = writeln!(output, "  (none)");
    }
    for entry in &stats.by_assignee {
        let counts = entry
            .counts
            .iter()
            .map(|(status, n)| format!("{} {}", status, n))
            .collect::<Vec<_>>()
            .join(" · ");
        let _ = writeln!(output, "  {} {}: {}", entry.assignee, entry.total, counts);
    }

    let _ = writeln!(output, "\nBy status");
    if stats.by_status.is_empty() {
        let _ = writeln!(output, "  (none)");
    }
    for total in &stats.by_status {
        let _ = writeln!(output, "  {}: {}", total.status, total.count);
    }

    let _ = write!(output, "\nOverdue");
    if stats.overdue.is_empty() {
        let _ = write!(output, "\n  (none)");
    }
    for overdue in &stats.overdue {
        let item = overdue.item;
        let _ = write!(
            output,
            "\n  {} ({}) due {} +{}d",
            item.title,
            status_or_assignees(item),
            display_date(item.plan_end_date),
            overdue.days_overdue
        );
    }
    output
}

fn status_or_assignees(item: &ChildItem) -> String {
    let names = item.assignee_names();
    if names.is_empty() {
        item.progress_status.to_string()
    } else {
        format!("{}, {}", item.progress_status, names)
    }
}

/// One-line confirmation for a created or updated parent.
pub fn format_parent(verb: &str, parent: &ParentItem) -> String {
    format!("{} parent #{} {} ({})", verb, parent.sequence_number, parent.title, parent.id)
}

/// One-line confirmation for a created or updated child.
pub fn format_child(verb: &str, child: &ChildItem) -> String {
    let mut line = format!("{} child #{} {} ({})", verb, child.sequence_number, child.title, child.id);
    if child.progress_status != ProgressStatus::Idea {
        let _ = write!(line, " [{}]", child.progress_status);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use actrack_db::views::{build_list, build_rows, SortState};
    use actrack_db::{Assignee, Category};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("회의록 정리하기 작업", 6), "회의록...");
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[test]
    fn test_format_list_empty() {
        let view = build_list(&[], &[]);
        assert_eq!(format_list(&view), "No items found.");
    }

    #[test]
    fn test_format_list_groups() {
        let parents = vec![ParentItem::new("p1", "Plan").with_category(Category::Strategy)];
        let children = vec![
            ChildItem::new("c1", "Draft")
                .with_parent("p1")
                .with_assignees([Assignee::Sanghyuk]),
            ChildItem::new("c2", "Lost"),
        ];
        let visible: Vec<_> = children.iter().collect();
        let out = format_list(&build_list(&parents, &visible));
        assert!(out.starts_with("[기조실] #0 Plan (대기)"));
        assert!(out.contains("Draft [아이디어] 상혁님"));
        assert!(out.contains("(알 수 없음)\n  - #0 Lost"));
    }

    #[test]
    fn test_format_table_headers_and_placeholders() {
        let children = vec![ChildItem::new("c1", "Only").with_plan(Some(date(2025, 1, 6)), None)];
        let visible: Vec<_> = children.iter().collect();
        let rows = build_rows(&[], &visible, None, &SortState::default());
        let out = format_table(&rows);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("상위 아이템"));
        assert!(lines[2].contains("2025.01.06"));
        assert!(lines[2].starts_with("-"));
    }

    #[test]
    fn test_bar_span_clamps() {
        assert_eq!(bar_span(0.0, 0.5, 10), (0, 5));
        assert_eq!(bar_span(0.9, 0.5, 10), (9, 1));
        assert_eq!(bar_span(0.5, 0.01, 10), (5, 1));
    }
}
