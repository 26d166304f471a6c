//! CSV export of table rows

use chrono::NaiveDate;

use super::table::{Column, TableRow};

/// Byte order mark so spreadsheet tools detect UTF-8
pub const BOM: char = '\u{feff}';

/// Quote a CSV field, doubling embedded quotes.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn line(fields: impl Iterator<Item = String>) -> String {
    fields.map(|f| quote(&f)).collect::<Vec<_>>().join(",")
}

/// Render rows as CSV: a BOM, a header line with every column label, then
/// one line per row. Every field is quoted and lines are joined with `\n`.
///
/// Dates are written as `YYYY-MM-DD`; missing values are empty.
pub fn to_csv(rows: &[TableRow<'_>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(Column::ALL.iter().map(|c| c.label().to_string())));
    for row in rows {
        lines.push(line(Column::ALL.iter().map(|c| row.value(*c))));
    }

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\n"));
    out
}

/// Default file name for an export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("action_tracker_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignee, ChildItem, ParentItem, ProgressStatus};
    use crate::views::table::project;

    /// Minimal reader for fully quoted CSV with `\n` line breaks.
    fn parse(text: &str) -> Vec<Vec<String>> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut records = Vec::new();
        let mut record = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                ('"', true) => in_quotes = false,
                ('"', false) => in_quotes = true,
                (',', false) => record.push(std::mem::take(&mut field)),
                ('\n', false) => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                (c, _) => field.push(c),
            }
        }
        record.push(field);
        records.push(record);
        records
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quote_doubles_quotes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with(BOM));
        assert!(!csv.contains('\n'));
        let records = parse(&csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][0], "상위 아이템");
        assert_eq!(records[0].len(), 12);
    }

    #[test]
    fn test_rows_survive_reparse() {
        let parents = vec![ParentItem::new("p1", "Parent, \"quoted\"")];
        let mut tricky = ChildItem::new("c1", "Line one\nline two")
            .with_parent("p1")
            .with_assignees([Assignee::Sanghyuk, Assignee::Jongok])
            .with_status(ProgressStatus::InProgress)
            .with_plan(Some(date(2025, 1, 6)), Some(date(2025, 1, 31)));
        tricky.details = "a,b,\"c\"".to_string();
        let plain = ChildItem::new("c2", "Second").with_precedent("c1");
        let children = vec![tricky, plain];
        let visible: Vec<_> = children.iter().collect();
        let rows = project(&parents, &visible);

        let records = parse(&to_csv(&rows));
        assert_eq!(records.len(), 3);
        for (record, row) in records[1..].iter().zip(&rows) {
            let expected: Vec<String> = Column::ALL.iter().map(|c| row.value(*c)).collect();
            assert_eq!(record, &expected);
        }
        assert_eq!(records[1][0], "Parent, \"quoted\"");
        assert_eq!(records[1][1], "Line one\nline two");
        assert_eq!(records[1][2], "상혁님, 종옥님");
        assert_eq!(records[1][4], "2025-01-06");
        assert_eq!(records[2][0], "-");
        assert_eq!(records[2][4], "");
        assert_eq!(records[2][8], "Line one\nline two");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename(date(2025, 3, 4)),
            "action_tracker_2025-03-04.csv"
        );
    }
}
