use crate::Result;
use crate::codec::compressed::{Compression, decode_envelope_compressed};
use crate::codec::flat::decode_flat;
use crate::codec::record::extract_record;
use crate::codec::tree::decode_tree;
use crate::envelope::Envelope;
use crate::schema::{FlatLayout, Layout, RecordLayout, TreeLayout};
use crate::table::{Record, Table};

pub fn decode_flat_json(body: &[u8], layout: &FlatLayout) -> Result<Table> {
    let env = Envelope::from_slice(body)?;
    Ok(decode_flat(&env, layout))
}

pub fn decode_tree_json(body: &[u8], layout: &TreeLayout) -> Result<Table> {
    let env = Envelope::from_slice(body)?;
    Ok(decode_tree(&env, layout))
}

pub fn extract_record_json(body: &[u8], layout: &RecordLayout) -> Result<Option<Record>> {
    let env = Envelope::from_slice(body)?;
    Ok(extract_record(&env, layout))
}

/// Decodes with whichever decoder the layout's shape calls for. A record
/// layout yields a table of zero or one row.
pub fn decode_with_layout(env: &Envelope, layout: &Layout) -> Table {
    match layout {
        Layout::Flat(l) => decode_flat(env, l),
        Layout::Tree(l) => decode_tree(env, l),
        Layout::Record(l) => match extract_record(env, l) {
            Some(record) => record.into_table(),
            None => Table::new(l.columns()),
        },
    }
}

pub fn decode_body(
    body: &[u8],
    c: Compression,
    max_uncompressed_len: usize,
    layout: &Layout,
) -> Result<Table> {
    let env = decode_envelope_compressed(body, c, max_uncompressed_len)?;
    Ok(decode_with_layout(&env, layout))
}
