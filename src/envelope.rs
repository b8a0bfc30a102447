//! Locating the data shape inside a query response.
//!
//! A response nests the payload as `results[0].result.data.dsr.DS[0]`; the
//! data shape object holds `ValueDicts` and the `PH` page list. A bare data
//! shape object (one that has `PH` at its root) is accepted as well.

use crate::Result;
use crate::dictionary::ValueDicts;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    root: Value,
}

impl Envelope {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parses a response body. Invalid JSON is the only error; a body that
    /// parses but lacks the expected structure decodes to nothing.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_slice(bytes)?))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_inner(self) -> Value {
        self.root
    }

    pub fn data_shape(&self) -> Option<&Map<String, Value>> {
        let root = self.root.as_object()?;
        if root.contains_key("PH") {
            return Some(root);
        }
        root.get("results")?
            .get(0)?
            .get("result")?
            .get("data")?
            .get("dsr")?
            .get("DS")?
            .get(0)?
            .as_object()
    }

    pub fn value_dicts(&self) -> ValueDicts<'_> {
        match self
            .data_shape()
            .and_then(|ds| ds.get("ValueDicts"))
            .and_then(Value::as_object)
        {
            Some(dicts) => ValueDicts::new(dicts),
            None => ValueDicts::empty(),
        }
    }

    /// `DM0` of every page, in page order. Pages without `DM0` are skipped.
    pub fn pages(&self) -> impl Iterator<Item = &[Value]> {
        self.data_shape()
            .and_then(|ds| ds.get("PH"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|page| page.get("DM0").and_then(Value::as_array))
            .map(Vec::as_slice)
    }

    /// All `DM0` entries across pages.
    pub fn dm0(&self) -> impl Iterator<Item = &Value> {
        self.pages().flatten()
    }

    pub fn is_decodable(&self) -> bool {
        self.pages().next().is_some()
    }
}

impl From<Value> for Envelope {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}
