use crate::value::Value;
use serde_json::Map;

/// Read-only view over an envelope's `ValueDicts`.
///
/// Every lookup is total: an unknown dictionary name, an out-of-range or
/// non-integer index all resolve to [`Value::Null`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDicts<'a> {
    dicts: Option<&'a Map<String, serde_json::Value>>,
}

impl<'a> ValueDicts<'a> {
    pub fn new(dicts: &'a Map<String, serde_json::Value>) -> Self {
        Self { dicts: Some(dicts) }
    }

    pub fn empty() -> Self {
        Self { dicts: None }
    }

    /// Entries of the named dictionary, if present and array-shaped.
    pub fn get(&self, dict: &str) -> Option<&'a [serde_json::Value]> {
        self.dicts?
            .get(dict)
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
    }

    pub fn contains(&self, dict: &str) -> bool {
        self.get(dict).is_some()
    }

    /// Number of entries in `dict`, zero when absent.
    pub fn len(&self, dict: &str) -> usize {
        self.get(dict).map_or(0, <[serde_json::Value]>::len)
    }

    pub fn resolve_index(&self, dict: &str, index: usize) -> Value {
        self.get(dict)
            .and_then(|entries| entries.get(index))
            .map_or(Value::Null, Value::from_json)
    }

    /// Resolves a raw index taken straight from a node or compact row.
    pub fn resolve(&self, dict: &str, index: &serde_json::Value) -> Value {
        match index.as_u64().and_then(|i| usize::try_from(i).ok()) {
            Some(i) => self.resolve_index(dict, i),
            None => Value::Null,
        }
    }
}
