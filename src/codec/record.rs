//! Single-record extraction driven by a node's `S` schema entries.
//!
//! Each schema entry names a field (`N`), optionally the dictionary that
//! field's index refers to (`DN`), and a type tag (`T`). Date-typed fields
//! without a dictionary carry an epoch-millisecond value in the node's `C`
//! array at a position fixed by the query.

use crate::dictionary::ValueDicts;
use crate::envelope::Envelope;
use crate::schema::{RecordField, RecordLayout};
use crate::table::Record;
use crate::value::{Value, date_from_json};
use serde_json::Map;
use tracing::debug;

/// Type tag of date-valued schema entries.
pub const DATE_TYPE_TAG: u64 = 7;

/// Extracts one record from the first `DM0` entry of the first page.
///
/// `None` when the envelope has no root node. When several roots are
/// present the first one wins.
pub fn extract_record(env: &Envelope, layout: &RecordLayout) -> Option<Record> {
    let mut roots = env.pages().next()?.iter();
    let Some(node) = roots.next() else {
        debug!("envelope has no DM0 root; no record extracted");
        return None;
    };
    let extra = roots.count();
    if extra > 0 {
        debug!(ignored_roots = extra, "several DM0 roots; extracting the first");
    }
    Some(extract_record_from_node(&env.value_dicts(), layout, node))
}

pub fn extract_record_from_node(
    dicts: &ValueDicts<'_>,
    layout: &RecordLayout,
    node: &serde_json::Value,
) -> Record {
    let mut record = Record::with_capacity(layout.fields().len());
    let node = node.as_object();
    for field in layout.fields().iter() {
        let v = node.map_or(Value::Null, |n| resolve_field(dicts, n, field));
        record.push(&field.column, v);
    }
    record
}

fn resolve_field(
    dicts: &ValueDicts<'_>,
    node: &Map<String, serde_json::Value>,
    field: &RecordField,
) -> Value {
    let entries = match node.get("S").and_then(serde_json::Value::as_array) {
        Some(entries) => entries,
        None => return Value::Null,
    };
    for entry in entries.iter() {
        if entry.get("N").and_then(serde_json::Value::as_str) != Some(field.key.as_str()) {
            continue;
        }
        if let Some(dict) = entry.get("DN").and_then(serde_json::Value::as_str) {
            return resolve_dictionary_entry(dicts, dict, node.get(&field.key));
        }
        let is_date = entry.get("T").and_then(serde_json::Value::as_u64) == Some(DATE_TYPE_TAG);
        if let (true, Some(slot)) = (is_date, field.date_slot) {
            return node
                .get("C")
                .and_then(|c| c.get(slot))
                .map_or(Value::Null, date_from_json);
        }
    }
    Value::Null
}

/// Any index that does not name an entry (absent, out of range, not an
/// integer) falls back to the dictionary's first entry. Only a missing or
/// empty dictionary resolves to null.
fn resolve_dictionary_entry(
    dicts: &ValueDicts<'_>,
    dict: &str,
    index: Option<&serde_json::Value>,
) -> Value {
    let len = dicts.len(dict);
    if len == 0 {
        return Value::Null;
    }
    match index
        .and_then(serde_json::Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
    {
        Some(i) if i < len => dicts.resolve_index(dict, i),
        _ => dicts.resolve_index(dict, 0),
    }
}
