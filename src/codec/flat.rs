use crate::dictionary::ValueDicts;
use crate::envelope::Envelope;
use crate::schema::{ColumnKind, FlatLayout};
use crate::table::Table;
use crate::value::{Value, date_from_json};
use tracing::debug;

/// Decodes every compact row under `PH[*].DM0`, one output row per input row.
pub fn decode_flat(env: &Envelope, layout: &FlatLayout) -> Table {
    let mut out = Table::new(layout.columns().to_vec());
    decode_flat_into(env, layout, &mut out);
    out
}

pub fn decode_flat_into(env: &Envelope, layout: &FlatLayout, out: &mut Table) {
    out.reset(layout.columns());
    if !env.is_decodable() {
        debug!("envelope has no PH/DM0 payload; flat decode yields no rows");
        return;
    }
    let dicts = env.value_dicts();
    for row in env.dm0() {
        out.push_row(decode_compact_row(&dicts, layout, row));
    }
}

/// Resolves one `{"C": [...]}` row. A row without a `C` array still yields a
/// row; its positional columns are null.
pub fn decode_compact_row(
    dicts: &ValueDicts<'_>,
    layout: &FlatLayout,
    row: &serde_json::Value,
) -> Vec<Value> {
    let compact: &[serde_json::Value] = row
        .get("C")
        .and_then(serde_json::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut values = Vec::with_capacity(layout.len());
    for binding in layout.bindings().iter() {
        let v = match &binding.kind {
            ColumnKind::Dictionary { dict, slot } => slot
                .pick(compact)
                .map_or(Value::Null, |raw| dicts.resolve(dict, raw)),
            ColumnKind::Literal { slot } => slot.pick(compact).map_or(Value::Null, Value::from_json),
            ColumnKind::EpochMsDate { slot } => slot.pick(compact).map_or(Value::Null, date_from_json),
            ColumnKind::FixedDictionary { dict, index } => dicts.resolve_index(dict, *index),
        };
        values.push(v);
    }
    values
}
