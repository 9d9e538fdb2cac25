//! Capacity and redistribution math.
//!
//! All pure reads over the graph; the kernel decides what to write back.

use super::graph::ChainGraph;
use super::node::Slot;
use super::types::EdgeId;

/// Total capacity of a slot: per-building rate times building count.
pub fn slot_capacity(slot: &Slot, multiplier: u32) -> f64 {
    slot.rate_per_building * multiplier as f64
}

/// Sum of every committed amount on the slot.
pub fn used_capacity(graph: &ChainGraph, slot: &Slot) -> f64 {
    slot.edges
        .iter()
        .filter_map(|id| graph.edges.get(id))
        .map(|e| e.amount)
        .sum()
}

/// Sum of committed amounts on the slot, ignoring the connection to
/// `exclude_counterpart`. `owner` is the node the slot belongs to.
pub fn used_capacity_excluding(
    graph: &ChainGraph,
    slot: &Slot,
    owner: &str,
    exclude_counterpart: &str,
) -> f64 {
    slot.edges
        .iter()
        .filter_map(|id| graph.edges.get(id))
        .filter(|e| {
            e.other(owner)
                .map(|counterpart| counterpart != exclude_counterpart)
                .unwrap_or(true)
        })
        .map(|e| e.amount)
        .sum()
}

/// Capacity still unclaimed on the slot. Used when sizing a brand-new
/// connection, which never displaces existing ones.
pub fn free_capacity(graph: &ChainGraph, slot: &Slot, multiplier: u32) -> f64 {
    slot_capacity(slot, multiplier) - used_capacity(graph, slot)
}

/// How much room the slot has for one specific counterpart, ignoring that
/// counterpart's own current contribution.
pub fn available_capacity(
    graph: &ChainGraph,
    slot: &Slot,
    multiplier: u32,
    owner: &str,
    exclude_counterpart: &str,
) -> f64 {
    slot_capacity(slot, multiplier) - used_capacity_excluding(graph, slot, owner, exclude_counterpart)
}

/// How much of `remaining` can move onto a connection currently at
/// `current_amount`, bounded by `capacity_limit`. Callers only invoke this
/// when `current_amount < capacity_limit`.
pub fn redistribution_delta(current_amount: f64, capacity_limit: f64, remaining: f64) -> f64 {
    (capacity_limit - current_amount).min(remaining)
}

/// The amount a counterpart receives during water-filling: the smaller of its
/// own headroom and what is left to hand out.
pub fn max_transfer(available: f64, remaining: f64) -> f64 {
    available.min(remaining)
}

/// A slot's edges in allocation order: the prioritized counterpart's edge
/// first, then the rest in insertion order. The partition is stable, so with
/// no priority set this is plain insertion order.
pub fn ordered_edges(graph: &ChainGraph, owner: &str, slot: &Slot) -> Vec<EdgeId> {
    let Some(priority) = slot.priority.as_deref() else {
        return slot.edges.clone();
    };
    let mut prioritized = Vec::new();
    let mut rest = Vec::new();
    for &edge_id in &slot.edges {
        let is_prioritized = graph
            .edges
            .get(&edge_id)
            .and_then(|e| e.other(owner))
            .map(|counterpart| counterpart == priority)
            .unwrap_or(false);
        if is_prioritized {
            prioritized.push(edge_id);
        } else {
            rest.push(edge_id);
        }
    }
    prioritized.append(&mut rest);
    prioritized
}
