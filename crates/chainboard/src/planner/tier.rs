//! Tier migration: recipe similarity scoring and template swap.

use std::collections::BTreeSet;

use chainboard_catalog::{BuildingTemplate, RecipeTemplate};
use serde::{Deserialize, Serialize};

use super::graph::ChainGraph;
use super::node::{BuildingAttributes, Node, Slot};
use super::types::{FlowDirection, NodeId, ProductName};

/// A connection dissolved by a tier change because its product is absent
/// from the newly chosen recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelledConnection {
    pub counterpart: NodeId,
    pub product: ProductName,
    pub direction: FlowDirection,
}

/// Pick the recipe variant most similar to the node's current recipe: the
/// candidate sharing the most input and output product names wins, first
/// declaration wins ties. `None` only when the template has no recipes.
pub fn best_recipe_index(node: &Node, template: &BuildingTemplate) -> Option<usize> {
    let current_inputs: BTreeSet<&str> =
        node.inputs.iter().map(|s| s.product.as_str()).collect();
    let current_outputs: BTreeSet<&str> =
        node.outputs.iter().map(|s| s.product.as_str()).collect();

    let mut best: Option<(usize, usize)> = None;
    for (index, recipe) in template.recipes.iter().enumerate() {
        let matches = recipe
            .inputs
            .iter()
            .filter(|io| current_inputs.contains(io.name.as_str()))
            .count()
            + recipe
                .outputs
                .iter()
                .filter(|io| current_outputs.contains(io.name.as_str()))
                .count();
        if best.map(|(_, most)| matches > most).unwrap_or(true) {
            best = Some((index, matches));
        }
    }
    best.map(|(index, _)| index)
}

/// Connections the node would lose by migrating to `recipe`: every edge on a
/// slot whose product does not appear on the matching side of the new recipe.
pub fn cancelled_connections(
    graph: &ChainGraph,
    node_id: &str,
    recipe: &RecipeTemplate,
) -> Vec<CancelledConnection> {
    let Some(node) = graph.node(node_id) else {
        return Vec::new();
    };
    let mut cancelled = Vec::new();
    let sides: [(FlowDirection, BTreeSet<&str>); 2] = [
        (
            FlowDirection::Input,
            recipe.inputs.iter().map(|io| io.name.as_str()).collect(),
        ),
        (
            FlowDirection::Output,
            recipe.outputs.iter().map(|io| io.name.as_str()).collect(),
        ),
    ];
    for (direction, kept) in sides {
        for slot in node.slots(direction) {
            if kept.contains(slot.product.as_str()) {
                continue;
            }
            for &edge_id in &slot.edges {
                if let Some(counterpart) =
                    graph.edges.get(&edge_id).and_then(|e| e.other(&node.id))
                {
                    cancelled.push(CancelledConnection {
                        counterpart: counterpart.clone(),
                        product: slot.product.clone(),
                        direction,
                    });
                }
            }
        }
    }
    cancelled
}

/// Swap the node onto a new template and recipe. Slots are rebuilt with the
/// new per-minute rates; edge back-references and priorities carry over onto
/// same-product slots. Carried amounts are left untouched even when they now
/// exceed the new rate; the next recomputation settles them.
pub fn apply_template(
    node: &mut Node,
    template: &BuildingTemplate,
    recipe: &RecipeTemplate,
    height: f64,
) {
    let carry = |old_slots: &[Slot], slot: &mut Slot| {
        if let Some(old) = old_slots.iter().find(|s| s.product == slot.product) {
            slot.edges = old.edges.clone();
            slot.priority = old.priority.clone();
        }
    };

    let mut inputs: Vec<Slot> = recipe
        .inputs
        .iter()
        .map(|io| Slot::from_recipe_io(io, recipe.duration_s))
        .collect();
    let mut outputs: Vec<Slot> = recipe
        .outputs
        .iter()
        .map(|io| Slot::from_recipe_io(io, recipe.duration_s))
        .collect();
    for slot in &mut inputs {
        carry(&node.inputs, slot);
    }
    for slot in &mut outputs {
        carry(&node.outputs, slot);
    }

    node.template_id = template.id.clone();
    node.attributes = BuildingAttributes::from(template);
    node.recipe_id = recipe.id.clone();
    node.recipe_name = recipe.name.clone();
    node.duration_s = recipe.duration_s;
    node.inputs = inputs;
    node.outputs = outputs;
    node.height = height;
}
