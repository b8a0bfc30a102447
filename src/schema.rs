//! Declared binding tables for the three envelope shapes.
//!
//! The backend's compact encodings are positional and not self-describing:
//! which dictionary a `C` position or a `G<n>` key refers to is fixed by the
//! query that produced the envelope. Layouts make that contract explicit.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A position inside a compact `C` array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    At(usize),
    /// The final element, whatever the array length.
    Last,
}

impl Slot {
    pub fn pick<'a>(&self, values: &'a [serde_json::Value]) -> Option<&'a serde_json::Value> {
        match self {
            Slot::At(i) => values.get(*i),
            Slot::Last => values.last(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    /// `C[slot]` is an index into `dict`.
    Dictionary { dict: String, slot: Slot },
    /// `C[slot]` is copied as is.
    Literal { slot: Slot },
    /// `C[slot]` is an epoch-millisecond integer rendered as a UTC date.
    EpochMsDate { slot: Slot },
    /// Always `dict[index]`; the row does not carry this column.
    FixedDictionary { dict: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub column: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl ColumnBinding {
    pub fn dictionary(column: &str, dict: &str, position: usize) -> Self {
        Self {
            column: column.to_string(),
            kind: ColumnKind::Dictionary {
                dict: dict.to_string(),
                slot: Slot::At(position),
            },
        }
    }

    pub fn literal(column: &str, slot: Slot) -> Self {
        Self {
            column: column.to_string(),
            kind: ColumnKind::Literal { slot },
        }
    }

    pub fn epoch_ms_date(column: &str, slot: Slot) -> Self {
        Self {
            column: column.to_string(),
            kind: ColumnKind::EpochMsDate { slot },
        }
    }

    pub fn fixed_dictionary(column: &str, dict: &str, index: usize) -> Self {
        Self {
            column: column.to_string(),
            kind: ColumnKind::FixedDictionary {
                dict: dict.to_string(),
                index,
            },
        }
    }
}

fn check_columns<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    let mut any = false;
    for name in names {
        any = true;
        if name.is_empty() {
            return Err(Error::InvalidLayout(format!("{what} has an empty column name")));
        }
        if !seen.insert(name) {
            return Err(Error::InvalidLayout(format!(
                "{what} declares column {name:?} twice"
            )));
        }
    }
    if !any {
        return Err(Error::InvalidLayout(format!(
            "{what} must declare at least one column"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RawFlatLayout {
    columns: Vec<ColumnBinding>,
}

/// Column bindings for envelopes whose `DM0` is a flat list of compact rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFlatLayout", into = "RawFlatLayout")]
pub struct FlatLayout {
    bindings: Vec<ColumnBinding>,
    columns: Vec<String>,
}

impl FlatLayout {
    pub fn new(bindings: Vec<ColumnBinding>) -> Result<Self> {
        let layout = Self::assemble(bindings);
        layout.validate()?;
        Ok(layout)
    }

    pub(crate) fn assemble(bindings: Vec<ColumnBinding>) -> Self {
        let columns = bindings.iter().map(|b| b.column.clone()).collect();
        Self { bindings, columns }
    }

    pub fn validate(&self) -> Result<()> {
        check_columns("flat layout", self.columns.iter().map(String::as_str))
    }

    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl TryFrom<RawFlatLayout> for FlatLayout {
    type Error = Error;

    fn try_from(raw: RawFlatLayout) -> Result<Self> {
        Self::new(raw.columns)
    }
}

impl From<FlatLayout> for RawFlatLayout {
    fn from(layout: FlatLayout) -> Self {
        Self {
            columns: layout.bindings,
        }
    }
}

/// Binds a grouping key (`G0`, `G1`, ...) to an output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKey {
    pub key: String,
    pub column: String,
    /// Dictionary for integer raw values. `None` means the key carries
    /// literals. String raw values are literals either way.
    #[serde(default)]
    pub dict: Option<String>,
}

impl GroupKey {
    pub fn literal(key: &str, column: &str) -> Self {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            dict: None,
        }
    }

    pub fn dictionary(key: &str, column: &str, dict: &str) -> Self {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            dict: Some(dict.to_string()),
        }
    }
}

/// One position of a leaf's `C` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafSlot {
    pub column: String,
    pub dict: String,
    /// Index used when a shorter payload omits this position.
    #[serde(default)]
    pub default_index: Option<usize>,
}

impl LeafSlot {
    pub fn new(column: &str, dict: &str) -> Self {
        Self {
            column: column.to_string(),
            dict: dict.to_string(),
            default_index: None,
        }
    }

    pub fn with_default_index(mut self, index: usize) -> Self {
        self.default_index = Some(index);
        self
    }
}

/// What to do with a node that has neither a leaf payload nor children.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BareLeaf {
    /// Emit a row from the carried context. Grouping-only shapes need this.
    Emit,
    /// Keep the node's grouping values in the carried context, emit nothing.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RawTreeLayout {
    group_keys: Vec<GroupKey>,
    #[serde(default)]
    leaf_slots: Vec<LeafSlot>,
    #[serde(default)]
    bare_leaf: Option<BareLeaf>,
    #[serde(default)]
    leaf_guard: Option<String>,
}

/// Bindings for envelopes whose `DM0` holds grouping trees.
///
/// Output columns are the group-key columns in declaration order followed by
/// the leaf-slot columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTreeLayout", into = "RawTreeLayout")]
pub struct TreeLayout {
    group_keys: Vec<GroupKey>,
    leaf_slots: Vec<LeafSlot>,
    bare_leaf: BareLeaf,
    leaf_guard: Option<String>,
    columns: Vec<String>,
}

impl TreeLayout {
    /// Without leaf slots, bare leaves emit rows; with them, rows come from
    /// leaf payloads and bare leaves are skipped.
    pub fn new(group_keys: Vec<GroupKey>, leaf_slots: Vec<LeafSlot>) -> Result<Self> {
        let layout = Self::assemble(group_keys, leaf_slots);
        layout.validate()?;
        Ok(layout)
    }

    pub(crate) fn assemble(group_keys: Vec<GroupKey>, leaf_slots: Vec<LeafSlot>) -> Self {
        let columns = group_keys
            .iter()
            .map(|g| g.column.clone())
            .chain(leaf_slots.iter().map(|s| s.column.clone()))
            .collect();
        let bare_leaf = if leaf_slots.is_empty() {
            BareLeaf::Emit
        } else {
            BareLeaf::Skip
        };
        Self {
            group_keys,
            leaf_slots,
            bare_leaf,
            leaf_guard: None,
            columns,
        }
    }

    pub fn with_bare_leaf(mut self, bare_leaf: BareLeaf) -> Self {
        self.bare_leaf = bare_leaf;
        self
    }

    /// Payload leaves are skipped unless the carried value of `column` is
    /// truthy (not null, empty, zero or `false`).
    pub fn with_leaf_guard(mut self, column: &str) -> Result<Self> {
        self.leaf_guard = Some(column.to_string());
        self.validate()?;
        Ok(self)
    }

    pub(crate) fn set_leaf_guard_unchecked(&mut self, column: &str) {
        self.leaf_guard = Some(column.to_string());
    }

    pub fn validate(&self) -> Result<()> {
        check_columns("tree layout", self.columns.iter().map(String::as_str))?;
        let mut keys = HashSet::new();
        for g in self.group_keys.iter() {
            if !keys.insert(g.key.as_str()) {
                return Err(Error::InvalidLayout(format!(
                    "tree layout binds group key {:?} twice",
                    g.key
                )));
            }
        }
        if let Some(guard) = &self.leaf_guard {
            if !self.columns.iter().any(|c| c == guard) {
                return Err(Error::InvalidLayout(format!(
                    "leaf guard {guard:?} is not a layout column"
                )));
            }
        }
        Ok(())
    }

    pub fn group_keys(&self) -> &[GroupKey] {
        &self.group_keys
    }

    pub fn leaf_slots(&self) -> &[LeafSlot] {
        &self.leaf_slots
    }

    pub fn bare_leaf(&self) -> BareLeaf {
        self.bare_leaf
    }

    pub fn leaf_guard(&self) -> Option<&str> {
        self.leaf_guard.as_deref()
    }

    pub(crate) fn leaf_guard_field(&self) -> Option<usize> {
        let guard = self.leaf_guard.as_deref()?;
        self.columns.iter().position(|c| c == guard)
    }

    /// Column index of leaf slot `slot`.
    pub(crate) fn leaf_field(&self, slot: usize) -> usize {
        self.group_keys.len() + slot
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

impl TryFrom<RawTreeLayout> for TreeLayout {
    type Error = Error;

    fn try_from(raw: RawTreeLayout) -> Result<Self> {
        let mut layout = Self::new(raw.group_keys, raw.leaf_slots)?;
        if let Some(bare_leaf) = raw.bare_leaf {
            layout = layout.with_bare_leaf(bare_leaf);
        }
        match raw.leaf_guard {
            Some(guard) => layout.with_leaf_guard(&guard),
            None => Ok(layout),
        }
    }
}

impl From<TreeLayout> for RawTreeLayout {
    fn from(layout: TreeLayout) -> Self {
        Self {
            group_keys: layout.group_keys,
            leaf_slots: layout.leaf_slots,
            bare_leaf: Some(layout.bare_leaf),
            leaf_guard: layout.leaf_guard,
        }
    }
}

/// One field of a single-record extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    /// Schema entry name, e.g. `G0`.
    pub key: String,
    pub column: String,
    /// Position in the node's `C` array holding the epoch-ms value when the
    /// schema entry is date-typed.
    #[serde(default)]
    pub date_slot: Option<usize>,
}

impl RecordField {
    pub fn new(key: &str, column: &str) -> Self {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            date_slot: None,
        }
    }

    pub fn date(key: &str, column: &str, slot: usize) -> Self {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            date_slot: Some(slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RawRecordLayout {
    fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecordLayout", into = "RawRecordLayout")]
pub struct RecordLayout {
    fields: Vec<RecordField>,
}

impl RecordLayout {
    pub fn new(fields: Vec<RecordField>) -> Result<Self> {
        let layout = Self::assemble(fields);
        layout.validate()?;
        Ok(layout)
    }

    pub(crate) fn assemble(fields: Vec<RecordField>) -> Self {
        Self { fields }
    }

    pub fn validate(&self) -> Result<()> {
        check_columns("record layout", self.fields.iter().map(|f| f.column.as_str()))
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.column.clone()).collect()
    }
}

impl TryFrom<RawRecordLayout> for RecordLayout {
    type Error = Error;

    fn try_from(raw: RawRecordLayout) -> Result<Self> {
        Self::new(raw.fields)
    }
}

impl From<RecordLayout> for RawRecordLayout {
    fn from(layout: RecordLayout) -> Self {
        Self {
            fields: layout.fields,
        }
    }
}

/// Any of the three layouts, tagged by envelope shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Layout {
    Flat(FlatLayout),
    Tree(TreeLayout),
    Record(RecordLayout),
}

impl Layout {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn columns(&self) -> Vec<String> {
        match self {
            Layout::Flat(l) => l.columns().to_vec(),
            Layout::Tree(l) => l.columns().to_vec(),
            Layout::Record(l) => l.columns(),
        }
    }
}
