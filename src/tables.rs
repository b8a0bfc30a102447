//! Built-in layouts for the certification report tables.
//!
//! Each preset fixes the column names and order the reporting layer expects,
//! and the dictionary each position of the corresponding query refers to.

use crate::schema::{
    BareLeaf, ColumnBinding, FlatLayout, GroupKey, Layout, LeafSlot, RecordField, RecordLayout,
    Slot, TreeLayout,
};
use crate::{Error, Result};
use core::fmt;
use core::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TableKind {
    ScHeader,
    Contact,
    Products,
    Facilities,
    ScopeCertificate,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::ScHeader,
        TableKind::Contact,
        TableKind::Products,
        TableKind::Facilities,
        TableKind::ScopeCertificate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::ScHeader => "sc-header",
            TableKind::Contact => "contact",
            TableKind::Products => "products",
            TableKind::Facilities => "facilities",
            TableKind::ScopeCertificate => "scope-certificate",
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            TableKind::ScHeader => Layout::Flat(sc_header()),
            TableKind::Contact => Layout::Flat(contact()),
            TableKind::Products => Layout::Tree(products()),
            TableKind::Facilities => Layout::Tree(facilities()),
            TableKind::ScopeCertificate => Layout::Record(scope_certificate()),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TableKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| Error::Other(format!("unknown table: {s}")))
    }
}

/// Scope certificate header rows. The status columns are single-valued in
/// this query and the trailing element of `C` is the last-update timestamp.
pub fn sc_header() -> FlatLayout {
    FlatLayout::assemble(vec![
        ColumnBinding::dictionary("Certification Body", "D0", 0),
        ColumnBinding::dictionary("Certified Organization Name", "D1", 1),
        ColumnBinding::dictionary("TE ID", "D2", 2),
        ColumnBinding::dictionary("Retired TE ID", "D3", 3),
        ColumnBinding::dictionary("License Number", "D4", 4),
        ColumnBinding::dictionary("Native Name", "D5", 5),
        ColumnBinding::dictionary("Country/Area", "D6", 6),
        ColumnBinding::dictionary("SC Number", "D7", 7),
        ColumnBinding::fixed_dictionary("SC Version Number", "D8", 0),
        ColumnBinding::fixed_dictionary("Standard", "D9", 0),
        ColumnBinding::fixed_dictionary("SC Status", "D10", 0),
        ColumnBinding::epoch_ms_date("LastUpdated_Timestamp", Slot::Last),
    ])
}

pub fn contact() -> FlatLayout {
    FlatLayout::assemble(vec![
        ColumnBinding::dictionary("Contact", "D0", 0),
        ColumnBinding::dictionary("Address", "D1", 1),
        ColumnBinding::dictionary("State/Province", "D2", 2),
        ColumnBinding::dictionary("Country/Area", "D3", 3),
        ColumnBinding::dictionary("Public Email", "D4", 4),
        ColumnBinding::fixed_dictionary("Website", "D5", 0),
    ])
}

/// Facility → category → detail → raw material grouping; every bare leaf
/// is one product row.
pub fn products() -> TreeLayout {
    TreeLayout::assemble(
        vec![
            GroupKey::literal("G0", "Facility Name"),
            GroupKey::dictionary("G1", "Product Category Code", "D0"),
            GroupKey::dictionary("G2", "Product Category Description", "D1"),
            GroupKey::dictionary("G3", "Product Detail Code", "D2"),
            GroupKey::dictionary("G4", "Product Detail Description", "D3"),
            GroupKey::dictionary("G5", "Raw Material Code", "D4"),
            GroupKey::dictionary("G6", "Raw Material Description", "D5"),
            GroupKey::dictionary("G7", "Raw Material Percentage", "D6"),
        ],
        Vec::new(),
    )
    .with_bare_leaf(BareLeaf::Emit)
}

/// Facility rows come from leaf payloads holding the process category
/// description and, when it differs from the first entry, the CB code.
pub fn facilities() -> TreeLayout {
    let mut layout = TreeLayout::assemble(
        vec![
            GroupKey::literal("G0", "Facility Type"),
            GroupKey::dictionary("G1", "Facility Name", "D0"),
            GroupKey::dictionary("G2", "TE ID", "D1"),
            GroupKey::dictionary("G3", "Retired TE ID", "D2"),
            GroupKey::dictionary("G4", "Address", "D3"),
            GroupKey::dictionary("G5", "State/Province", "D4"),
            GroupKey::dictionary("G6", "Country/Area", "D5"),
            GroupKey::dictionary("G7", "Standard", "D6"),
            GroupKey::dictionary("G8", "Process Category Code", "D7"),
        ],
        vec![
            LeafSlot::new("Process Category Description", "D8"),
            LeafSlot::new("CB Code", "D9").with_default_index(0),
        ],
    )
    .with_bare_leaf(BareLeaf::Skip);
    layout.set_leaf_guard_unchecked("Process Category Code");
    layout
}

pub fn scope_certificate() -> RecordLayout {
    RecordLayout::assemble(vec![
        RecordField::new("G0", "SC_Number"),
        RecordField::new("G1", "SC_Version_No"),
        RecordField::new("G2", "CO_Te_Id"),
        RecordField::new("G3", "Retired_CO_Te_Id"),
        RecordField::new("G4", "SCO_Name"),
        RecordField::date("G5", "SC_IssuedDate", 4),
        RecordField::date("G6", "SC_ValidToDate", 5),
        RecordField::new("G7", "SC_Program"),
        RecordField::new("G8", "SC_Grouped_Standards"),
    ])
}
