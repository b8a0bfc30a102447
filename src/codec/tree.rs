//! Grouping-tree decoding.
//!
//! Each `DM0` entry is the root of a tree whose nodes set grouping keys
//! (`G<n>`), may raise the repeat flag (`R`), and end either in a leaf
//! payload (`C`) or a children container (`M`). Values the backend omitted
//! because they repeat the previous row are recovered from the carry-forward
//! snapshot.

use crate::carry::{CarryForward, PathContext};
use crate::dictionary::ValueDicts;
use crate::envelope::Envelope;
use crate::schema::{BareLeaf, GroupKey, TreeLayout};
use crate::table::Table;
use crate::value::Value;
use serde_json::Map;
use tracing::{debug, warn};

/// Keeps the carry-forward allocation alive across decodes.
#[derive(Debug, Default, Clone)]
pub struct TreeDecodeWorkspace {
    carry: CarryForward,
}

pub fn decode_tree(env: &Envelope, layout: &TreeLayout) -> Table {
    let mut out = Table::new(layout.columns().to_vec());
    let mut ws = TreeDecodeWorkspace::default();
    decode_tree_into_with_workspace(env, layout, &mut out, &mut ws);
    out
}

pub fn decode_tree_into(env: &Envelope, layout: &TreeLayout, out: &mut Table) {
    let mut ws = TreeDecodeWorkspace::default();
    decode_tree_into_with_workspace(env, layout, out, &mut ws);
}

pub fn decode_tree_into_with_workspace(
    env: &Envelope,
    layout: &TreeLayout,
    out: &mut Table,
    ws: &mut TreeDecodeWorkspace,
) {
    out.reset(layout.columns());
    if !env.is_decodable() {
        debug!("envelope has no PH/DM0 payload; tree decode yields no rows");
        return;
    }
    let dicts = env.value_dicts();
    let root_ctx = PathContext::with_width(layout.width());
    for root in env.dm0() {
        ws.carry.reset(layout.width());
        decode_subtree(&dicts, layout, root, &root_ctx, &mut ws.carry, out);
    }
}

/// Walks one node and everything below it, appending a row per emitting leaf.
///
/// `inherited` is the path state above `node`; `carry` is shared with the
/// node's later siblings and is updated in place. Both are fitted to the
/// layout width first: missing fields read as unset, extra fields are dropped.
pub fn decode_subtree(
    dicts: &ValueDicts<'_>,
    layout: &TreeLayout,
    node: &serde_json::Value,
    inherited: &PathContext,
    carry: &mut CarryForward,
    out: &mut Table,
) {
    let Some(node) = node.as_object() else {
        debug!("skipping non-object tree node");
        return;
    };

    let width = layout.width();
    if carry.width() != width {
        debug!(carry_width = carry.width(), width, "carry-forward fitted to layout width");
        carry.fit(width);
    }
    let mut ctx = inherited.clone();
    ctx.fit(width);

    for (field, group) in layout.group_keys().iter().enumerate() {
        if let Some(raw) = node.get(&group.key) {
            let v = resolve_group_value(dicts, group, raw);
            ctx.set(field, v.clone());
            carry.set(field, v);
        }
    }

    if node.get("R").and_then(serde_json::Value::as_u64) == Some(1) {
        ctx.overlay(carry);
    }

    if let Some(payload) = node.get("C") {
        emit_payload_leaf(dicts, layout, payload, &mut ctx, carry, out);
        return;
    }

    match node.get("M") {
        Some(children) => {
            for child in child_nodes(children) {
                decode_subtree(dicts, layout, child, &ctx, carry, out);
            }
        }
        None => match layout.bare_leaf() {
            BareLeaf::Emit => out.push_row(ctx.resolve_row(carry)),
            BareLeaf::Skip => {
                debug!(context = ?ctx.resolve_row(carry), "leaf without payload emits no row");
            }
        },
    }
}

fn resolve_group_value(
    dicts: &ValueDicts<'_>,
    group: &GroupKey,
    raw: &serde_json::Value,
) -> Value {
    match (&group.dict, raw) {
        (Some(dict), serde_json::Value::Number(_)) => dicts.resolve(dict, raw),
        _ => Value::from_json(raw),
    }
}

fn emit_payload_leaf(
    dicts: &ValueDicts<'_>,
    layout: &TreeLayout,
    payload: &serde_json::Value,
    ctx: &mut PathContext,
    carry: &mut CarryForward,
    out: &mut Table,
) {
    if let Some(guard) = layout.leaf_guard_field() {
        if !carry.get(guard).is_truthy() {
            debug!(guard = ?layout.leaf_guard(), "carried leaf guard is unset; leaf skipped");
            return;
        }
    }

    let slots = layout.leaf_slots();
    if !slots.is_empty() {
        match payload.as_array() {
            Some(values) if !values.is_empty() && values.len() <= slots.len() => {
                for (i, slot) in slots.iter().enumerate() {
                    let v = match values.get(i) {
                        Some(raw) => dicts.resolve(&slot.dict, raw),
                        None => slot
                            .default_index
                            .map_or(Value::Null, |idx| dicts.resolve_index(&slot.dict, idx)),
                    };
                    let field = layout.leaf_field(i);
                    ctx.set(field, v.clone());
                    carry.set(field, v);
                }
            }
            _ => {
                warn!(
                    payload = %payload,
                    declared_slots = slots.len(),
                    "leaf payload arity outside declared slots; emitting carried context only"
                );
            }
        }
    }

    out.push_row(ctx.resolve_row(carry));
}

/// Children of an `M` container in source order. The backend sends a list of
/// single-key objects; a plain object is accepted too.
fn child_nodes(container: &serde_json::Value) -> impl Iterator<Item = &serde_json::Value> {
    let blocks: Vec<&Map<String, serde_json::Value>> = match container {
        serde_json::Value::Array(blocks) => blocks.iter().filter_map(|b| b.as_object()).collect(),
        serde_json::Value::Object(block) => vec![block],
        _ => Vec::new(),
    };
    blocks
        .into_iter()
        .flat_map(|block| block.values())
        .filter_map(serde_json::Value::as_array)
        .flatten()
}
