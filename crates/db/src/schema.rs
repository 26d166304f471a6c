//! Property table for the two Notion databases
//!
//! Every upstream property the tracker reads or writes is declared here once,
//! with its Notion property type. Decoding checks a page against the table
//! and fails with the property name when the upstream schema has drifted.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value, json};

use crate::error::{DbError, DbResult};
use crate::notion::Page;

/// Notion limits a single rich text segment to this many characters
pub const RICH_TEXT_CHUNK: usize = 2000;

/// Notion property types used by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Select,
    Status,
    MultiSelect,
    Relation,
    Date,
    CreatedTime,
    LastEditedTime,
}

impl PropertyKind {
    /// The `type` tag Notion uses for this kind.
    pub fn key(&self) -> &'static str {
        match self {
            PropertyKind::Title => "title",
            PropertyKind::RichText => "rich_text",
            PropertyKind::Number => "number",
            PropertyKind::Select => "select",
            PropertyKind::Status => "status",
            PropertyKind::MultiSelect => "multi_select",
            PropertyKind::Relation => "relation",
            PropertyKind::Date => "date",
            PropertyKind::CreatedTime => "created_time",
            PropertyKind::LastEditedTime => "last_edited_time",
        }
    }

    /// Property value of a page where this property was never set.
    pub fn empty_value(&self) -> Value {
        let inner = match self {
            PropertyKind::Title
            | PropertyKind::RichText
            | PropertyKind::MultiSelect
            | PropertyKind::Relation => json!([]),
            _ => Value::Null,
        };
        let mut value = Map::new();
        value.insert("type".to_string(), Value::from(self.key()));
        value.insert(self.key().to_string(), inner);
        Value::Object(value)
    }

    /// Whether the upstream computes the value and rejects writes.
    pub fn is_read_only(&self) -> bool {
        matches!(self, PropertyKind::CreatedTime | PropertyKind::LastEditedTime)
    }
}

/// One declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
}

const fn spec(name: &'static str, kind: PropertyKind) -> PropertySpec {
    PropertySpec { name, kind }
}

/// Property names of the parent (1-depth) database
pub mod parent {
    pub const TITLE: &str = "액션 아이템 상위 명";
    pub const SEQUENCE: &str = "순번 (ID)";
    pub const CATEGORY: &str = "Category";
    pub const STATUS: &str = "Status";
    pub const CREATED: &str = "생성일";
    pub const CHILDREN: &str = "2 Depth Child Items";
}

/// Property names of the child (2-depth) database
pub mod child {
    pub const TITLE: &str = "액션 아이템 명";
    pub const SEQUENCE: &str = "순번 (ID)";
    pub const PARENT: &str = "1 Depth Parent";
    pub const ASSIGNEES: &str = "담당자";
    pub const STATUS: &str = "progress_status";
    pub const PLAN_START: &str = "plan_start_date";
    pub const PLAN_END: &str = "plan_end_date";
    pub const ACTUAL_START: &str = "actual_start_date";
    pub const ACTUAL_END: &str = "actual_end_date";
    pub const PRECEDENT: &str = "Precedent Item";
    pub const MODIFIED_BY: &str = "last_modified_by";
    pub const MODIFIED_AT: &str = "last_modified_at";
    pub const DETAILS: &str = "details";
    pub const NOTES: &str = "unique_notes";
}

pub const PARENT_PROPERTIES: &[PropertySpec] = &[
    spec(parent::TITLE, PropertyKind::Title),
    spec(parent::SEQUENCE, PropertyKind::Number),
    spec(parent::CATEGORY, PropertyKind::Select),
    spec(parent::STATUS, PropertyKind::Status),
    spec(parent::CREATED, PropertyKind::CreatedTime),
    spec(parent::CHILDREN, PropertyKind::Relation),
];

pub const CHILD_PROPERTIES: &[PropertySpec] = &[
    spec(child::TITLE, PropertyKind::Title),
    spec(child::SEQUENCE, PropertyKind::Number),
    spec(child::PARENT, PropertyKind::Relation),
    spec(child::ASSIGNEES, PropertyKind::MultiSelect),
    spec(child::STATUS, PropertyKind::Select),
    spec(child::PLAN_START, PropertyKind::Date),
    spec(child::PLAN_END, PropertyKind::Date),
    spec(child::ACTUAL_START, PropertyKind::Date),
    spec(child::ACTUAL_END, PropertyKind::Date),
    spec(child::PRECEDENT, PropertyKind::Relation),
    spec(child::MODIFIED_BY, PropertyKind::Select),
    spec(child::MODIFIED_AT, PropertyKind::LastEditedTime),
    spec(child::DETAILS, PropertyKind::RichText),
    spec(child::NOTES, PropertyKind::RichText),
];

/// Look up a declared property by name.
pub fn find_spec(table: &[PropertySpec], name: &str) -> Option<PropertySpec> {
    table.iter().copied().find(|s| s.name == name)
}

static NULL: Value = Value::Null;

fn schema_error(property: &'static str, reason: impl Into<String>) -> DbError {
    DbError::Schema {
        property,
        reason: reason.into(),
    }
}

/// Typed read access to the properties of one page.
pub struct Properties<'a> {
    props: &'a Map<String, Value>,
}

impl<'a> Properties<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self {
            props: &page.properties,
        }
    }

    /// Verify every declared property is present with the declared type.
    pub fn check(&self, table: &[PropertySpec]) -> DbResult<()> {
        for spec in table {
            self.raw(*spec)?;
        }
        Ok(())
    }

    fn raw(&self, spec: PropertySpec) -> DbResult<&'a Value> {
        let prop = self
            .props
            .get(spec.name)
            .ok_or_else(|| schema_error(spec.name, "is missing from page"))?;
        if let Some(found) = prop.get("type").and_then(Value::as_str)
            && found != spec.kind.key()
        {
            return Err(schema_error(
                spec.name,
                format!("has type '{}', expected '{}'", found, spec.kind.key()),
            ));
        }
        Ok(prop.get(spec.kind.key()).unwrap_or(&NULL))
    }

    fn array(&self, spec: PropertySpec) -> DbResult<&'a [Value]> {
        match self.raw(spec)? {
            Value::Null => Ok(&[]),
            Value::Array(items) => Ok(items.as_slice()),
            other => Err(schema_error(
                spec.name,
                format!("expected a list, got {}", other),
            )),
        }
    }

    fn text(&self, spec: PropertySpec) -> DbResult<String> {
        Ok(self
            .array(spec)?
            .iter()
            .filter_map(|segment| {
                segment
                    .get("plain_text")
                    .or_else(|| segment.get("text").and_then(|t| t.get("content")))
                    .and_then(Value::as_str)
            })
            .collect())
    }

    /// Concatenated plain text of a title property.
    pub fn title(&self, name: &'static str) -> DbResult<String> {
        self.text(spec(name, PropertyKind::Title))
    }

    /// Concatenated plain text of a rich text property.
    pub fn rich_text(&self, name: &'static str) -> DbResult<String> {
        self.text(spec(name, PropertyKind::RichText))
    }

    pub fn number(&self, name: &'static str) -> DbResult<Option<f64>> {
        match self.raw(spec(name, PropertyKind::Number))? {
            Value::Null => Ok(None),
            value => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| schema_error(name, format!("is not a number: {}", value))),
        }
    }

    fn option_name(&self, spec: PropertySpec) -> DbResult<Option<&'a str>> {
        match self.raw(spec)? {
            Value::Null => Ok(None),
            option => option
                .get("name")
                .and_then(Value::as_str)
                .map(Some)
                .ok_or_else(|| schema_error(spec.name, "option has no name")),
        }
    }

    /// Selected option name of a select property.
    pub fn select(&self, name: &'static str) -> DbResult<Option<&'a str>> {
        self.option_name(spec(name, PropertyKind::Select))
    }

    /// Selected option name of a status property.
    pub fn status(&self, name: &'static str) -> DbResult<Option<&'a str>> {
        self.option_name(spec(name, PropertyKind::Status))
    }

    pub fn multi_select(&self, name: &'static str) -> DbResult<Vec<&'a str>> {
        self.array(spec(name, PropertyKind::MultiSelect))?
            .iter()
            .map(|option| {
                option
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| schema_error(name, "option has no name"))
            })
            .collect()
    }

    /// Related page ids, in upstream order.
    pub fn relation(&self, name: &'static str) -> DbResult<Vec<String>> {
        self.array(spec(name, PropertyKind::Relation))?
            .iter()
            .map(|link| {
                link.get("id")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| schema_error(name, "relation entry has no id"))
            })
            .collect()
    }

    /// Start of a date property. Date-times keep only their calendar date.
    pub fn date(&self, name: &'static str) -> DbResult<Option<NaiveDate>> {
        let value = self.raw(spec(name, PropertyKind::Date))?;
        let Some(start) = value.get("start").and_then(Value::as_str) else {
            return Ok(None);
        };
        let day = start.get(..10).unwrap_or(start);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| schema_error(name, format!("has invalid date '{}'", start)))
    }

    fn timestamp(&self, spec: PropertySpec) -> DbResult<Option<DateTime<Utc>>> {
        match self.raw(spec)?.as_str() {
            None => Ok(None),
            Some(raw) => parse_timestamp(raw)
                .map(Some)
                .ok_or_else(|| schema_error(spec.name, format!("has invalid timestamp '{}'", raw))),
        }
    }

    pub fn created_time(&self, name: &'static str) -> DbResult<Option<DateTime<Utc>>> {
        self.timestamp(spec(name, PropertyKind::CreatedTime))
    }

    pub fn last_edited_time(&self, name: &'static str) -> DbResult<Option<DateTime<Utc>>> {
        self.timestamp(spec(name, PropertyKind::LastEditedTime))
    }
}

/// Parse an RFC 3339 timestamp as sent by Notion.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn text_segments(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(RICH_TEXT_CHUNK)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}

pub fn title_value(text: &str) -> Value {
    json!({ "title": text_segments(text) })
}

/// Rich text value. Empty text writes an empty segment list.
pub fn rich_text_value(text: &str) -> Value {
    json!({ "rich_text": text_segments(text) })
}

pub fn number_value(n: i64) -> Value {
    json!({ "number": n })
}

pub fn select_value(option: Option<&str>) -> Value {
    match option {
        Some(name) => json!({ "select": { "name": name } }),
        None => json!({ "select": null }),
    }
}

pub fn status_value(option: &str) -> Value {
    json!({ "status": { "name": option } })
}

pub fn multi_select_value<'s>(options: impl IntoIterator<Item = &'s str>) -> Value {
    let options: Vec<Value> = options
        .into_iter()
        .map(|name| json!({ "name": name }))
        .collect();
    json!({ "multi_select": options })
}

/// Relation value. An empty id list clears the relation.
pub fn relation_value<'s>(ids: impl IntoIterator<Item = &'s str>) -> Value {
    let links: Vec<Value> = ids.into_iter().map(|id| json!({ "id": id })).collect();
    json!({ "relation": links })
}

/// Date value. `None` clears the date.
pub fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => json!({ "date": { "start": d.format("%Y-%m-%d").to_string() } }),
        None => json!({ "date": null }),
    }
}
