//! Repository modules for the two Notion databases
//!
//! Each repository maps upstream pages to typed items and back, and issues
//! the create/update/soft-delete requests. They are the only code that
//! talks to [`NotionApi`](crate::notion::NotionApi).

mod child;
mod parent;

pub use child::{ChildRepository, decode_child, encode_child_update, encode_new_child};
pub use parent::{ParentRepository, decode_parent, encode_new_parent, encode_parent_update};

use crate::error::{DbError, DbResult};
use crate::notion::{Direction, NotionApi, QueryRequest};
use crate::schema::Properties;

/// Turn an upstream 404 for a by-id lookup into `NotFound`.
fn map_not_found(err: DbError, kind: &'static str, id: &str) -> DbError {
    match err {
        DbError::Upstream { status: 404, .. } => DbError::NotFound {
            kind,
            id: id.to_string(),
        },
        other => other,
    }
}

/// Resolve an upstream option label, failing loudly on labels the
/// tracker does not know.
fn parse_label<T>(
    property: &'static str,
    label: &str,
    from_label: fn(&str) -> Option<T>,
) -> DbResult<T> {
    from_label(label).ok_or_else(|| DbError::Schema {
        property,
        reason: format!("has unknown option '{}'", label),
    })
}

/// Current maximum of the sequence property plus one.
///
/// Deleted records are included so numbers are never reused.
async fn next_sequence_number<A: NotionApi + ?Sized>(
    api: &A,
    database_id: &str,
    property: &'static str,
) -> DbResult<i64> {
    let request = QueryRequest::new()
        .sorted_by(property, Direction::Descending)
        .with_page_size(1);
    let response = api.query_database(database_id, &request).await?;
    let max = match response.results.first() {
        Some(page) => Properties::new(page).number(property)?.unwrap_or(0.0) as i64,
        None => 0,
    };
    Ok(max + 1)
}
