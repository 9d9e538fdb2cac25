//! Flow graph aggregate: nodes, the edge arena, configuration, and totals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{
    DEFAULT_CARD_BASE_HEIGHT, DEFAULT_CARD_HEIGHT_PER_SLOT, DEFAULT_CARD_HORIZONTAL_GAP,
    DEFAULT_CARD_VERTICAL_GAP, DEFAULT_CARD_WIDTH,
};

use super::node::Node;
use super::types::{EdgeId, FlowDirection, NodeId, ProductName};

// ============================================================================
// Flow Edge
// ============================================================================

/// A committed flow between one supplier output slot and one consumer input
/// slot. Owned once, in the graph's edge arena; both endpoint slots hold only
/// its id, so the two sides can never disagree on the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: EdgeId,
    pub supplier: NodeId,
    pub consumer: NodeId,
    pub product: ProductName,
    /// Committed per-minute flow, >= 0.
    pub amount: f64,
}

impl FlowEdge {
    /// The endpoint opposite to `node_id`, or `None` if `node_id` is not an
    /// endpoint of this edge.
    pub fn other(&self, node_id: &str) -> Option<&NodeId> {
        if self.supplier == node_id {
            Some(&self.consumer)
        } else if self.consumer == node_id {
            Some(&self.supplier)
        } else {
            None
        }
    }

    /// The endpoint owning the slot with the given direction.
    pub fn endpoint(&self, direction: FlowDirection) -> &NodeId {
        match direction {
            FlowDirection::Output => &self.supplier,
            FlowDirection::Input => &self.consumer,
        }
    }
}

// ============================================================================
// Graph (aggregate)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChainGraph {
    pub nodes: BTreeMap<NodeId, Node>,
    pub edges: BTreeMap<EdgeId, FlowEdge>,
}

impl ChainGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&FlowEdge> {
        self.edges.get(&id)
    }

    /// The edge carrying `product` from `supplier` to `consumer`, if any.
    /// At most one such edge exists.
    pub fn edge_between(&self, supplier: &str, consumer: &str, product: &str) -> Option<EdgeId> {
        self.edges
            .values()
            .find(|e| e.supplier == supplier && e.consumer == consumer && e.product == product)
            .map(|e| e.id)
    }

    /// Verify that every edge is referenced by exactly the two endpoint slots
    /// it names, and every slot back-reference resolves to an arena edge for
    /// that slot's product. Returns the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        for edge in self.edges.values() {
            for (node_id, direction) in [
                (&edge.supplier, FlowDirection::Output),
                (&edge.consumer, FlowDirection::Input),
            ] {
                let node = self
                    .nodes
                    .get(node_id)
                    .ok_or_else(|| format!("edge {} references missing node {node_id}", edge.id))?;
                let slot = node.slot(direction, &edge.product).ok_or_else(|| {
                    format!(
                        "edge {} references missing {} slot {} on {node_id}",
                        edge.id,
                        direction.as_str(),
                        edge.product
                    )
                })?;
                if !slot.edges.contains(&edge.id) {
                    return Err(format!(
                        "edge {} not back-referenced by {} slot {} on {node_id}",
                        edge.id,
                        direction.as_str(),
                        edge.product
                    ));
                }
            }
            if edge.amount < 0.0 {
                return Err(format!("edge {} carries negative amount", edge.id));
            }
        }
        for node in self.nodes.values() {
            for direction in [FlowDirection::Input, FlowDirection::Output] {
                for slot in node.slots(direction) {
                    for &edge_id in &slot.edges {
                        let edge = self.edges.get(&edge_id).ok_or_else(|| {
                            format!("slot {} on {} references dead edge {edge_id}", slot.product, node.id)
                        })?;
                        if edge.endpoint(direction) != &node.id || edge.product != slot.product {
                            return Err(format!(
                                "slot {} on {} references foreign edge {edge_id}",
                                slot.product, node.id
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn totals(&self) -> GraphTotals {
        let mut totals = GraphTotals::default();
        for node in self.nodes.values() {
            let scale = node.multiplier as f64;
            let attrs = &node.attributes;
            totals.workers += attrs.workers as u64 * node.multiplier as u64;
            totals.electricity_consumed += attrs.electricity_consumed * scale;
            totals.electricity_generated += attrs.electricity_generated * scale;
            totals.computing_consumed += attrs.computing_consumed * scale;
            totals.computing_generated += attrs.computing_generated * scale;
            totals.maintenance_quantity += attrs.maintenance_cost_quantity * scale;
            totals.unity_cost += attrs.unity_cost * scale;
        }
        totals
    }
}

/// Aggregate resource figures over the whole graph, scaled by multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphTotals {
    pub workers: u64,
    pub electricity_consumed: f64,
    pub electricity_generated: f64,
    pub computing_consumed: f64,
    pub computing_generated: f64,
    pub maintenance_quantity: f64,
    pub unity_cost: f64,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanConfig {
    pub layout: LayoutConfig,
}

impl PlanConfig {
    pub fn sanitized(mut self) -> Self {
        self.layout = self.layout.sanitized();
        self
    }
}

/// Card sizing and spacing used by placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub card_width: f64,
    pub card_base_height: f64,
    pub card_height_per_slot: f64,
    pub vertical_gap: f64,
    pub horizontal_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: DEFAULT_CARD_WIDTH,
            card_base_height: DEFAULT_CARD_BASE_HEIGHT,
            card_height_per_slot: DEFAULT_CARD_HEIGHT_PER_SLOT,
            vertical_gap: DEFAULT_CARD_VERTICAL_GAP,
            horizontal_gap: DEFAULT_CARD_HORIZONTAL_GAP,
        }
    }
}

impl LayoutConfig {
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.card_width <= 0.0 {
            self.card_width = defaults.card_width;
        }
        if self.card_base_height <= 0.0 {
            self.card_base_height = defaults.card_base_height;
        }
        if self.card_height_per_slot < 0.0 {
            self.card_height_per_slot = defaults.card_height_per_slot;
        }
        if self.vertical_gap < 0.0 {
            self.vertical_gap = defaults.vertical_gap;
        }
        if self.horizontal_gap < 0.0 {
            self.horizontal_gap = defaults.horizontal_gap;
        }
        self
    }

    /// Card height for a recipe whose widest side has `max_slots` lines.
    pub fn card_height(&self, max_slots: usize) -> f64 {
        self.card_base_height + self.card_height_per_slot * max_slots.saturating_sub(1) as f64
    }
}
