//! Node entities: building attributes, slots, and template instantiation.

use chainboard_catalog::{BuildCost, BuildingTemplate, RecipeIo, RecipeTemplate};
use serde::{Deserialize, Serialize};

use crate::geometry::PlanPos;

use super::types::{EdgeId, FlowDirection, NodeId, ProductName};

// ============================================================================
// Building Attributes
// ============================================================================

/// Descriptive attributes copied from the catalog template onto a node.
///
/// Replaced wholesale on tier migration; the engine itself only reads the
/// tier pointers and the per-multiplier consumption/generation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildingAttributes {
    pub name: String,
    pub category: String,
    pub previous_tier: String,
    pub next_tier: String,
    pub workers: u32,
    pub maintenance_cost_units: String,
    pub maintenance_cost_quantity: f64,
    pub electricity_consumed: f64,
    pub electricity_generated: f64,
    pub computing_consumed: f64,
    pub computing_generated: f64,
    pub product_type: String,
    pub storage_capacity: f64,
    pub unity_cost: f64,
    pub research_speed: f64,
    pub icon_path: String,
    pub build_costs: Vec<BuildCost>,
}

impl From<&BuildingTemplate> for BuildingAttributes {
    fn from(template: &BuildingTemplate) -> Self {
        Self {
            name: template.name.clone(),
            category: template.category.clone(),
            previous_tier: template.previous_tier.clone(),
            next_tier: template.next_tier.clone(),
            workers: template.workers,
            maintenance_cost_units: template.maintenance_cost_units.clone(),
            maintenance_cost_quantity: template.maintenance_cost_quantity,
            electricity_consumed: template.electricity_consumed,
            electricity_generated: template.electricity_generated,
            computing_consumed: template.computing_consumed,
            computing_generated: template.computing_generated,
            product_type: template.product_type.clone(),
            storage_capacity: template.storage_capacity,
            unity_cost: template.unity_cost,
            research_speed: template.research_speed,
            icon_path: template.icon_path.clone(),
            build_costs: template.build_costs.clone(),
        }
    }
}

// ============================================================================
// Slot
// ============================================================================

/// One input or output line of a node's recipe.
///
/// `edges` holds back-references into the graph's edge arena, in insertion
/// order. `priority` names the one counterpart served first during
/// allocation; `None` means plain insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub product: ProductName,
    /// Per-minute throughput of one building instance.
    pub rate_per_building: f64,
    #[serde(default)]
    pub edges: Vec<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NodeId>,
}

impl Slot {
    pub fn new(product: impl Into<String>, rate_per_building: f64) -> Self {
        Self {
            product: product.into(),
            rate_per_building,
            edges: Vec::new(),
            priority: None,
        }
    }

    /// Build a slot from a recipe line, normalizing the raw per-cycle
    /// quantity to a per-minute rate.
    pub fn from_recipe_io(io: &RecipeIo, duration_s: f64) -> Self {
        let rate = if duration_s > 0.0 {
            io.quantity * 60.0 / duration_s
        } else {
            0.0
        };
        Self::new(io.name.clone(), rate)
    }

    pub fn remove_edge(&mut self, edge_id: EdgeId) {
        self.edges.retain(|&id| id != edge_id);
    }
}

// ============================================================================
// Node
// ============================================================================

/// A placed building instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub template_id: String,
    pub attributes: BuildingAttributes,
    /// Number of physical building instances this node represents (>= 1).
    pub multiplier: u32,
    pub recipe_id: String,
    pub recipe_name: String,
    pub duration_s: f64,
    pub inputs: Vec<Slot>,
    pub outputs: Vec<Slot>,
    pub pos: PlanPos,
    pub width: f64,
    pub height: f64,
}

impl Node {
    /// Instantiate a node from a template's recipe with empty slots and
    /// multiplier 1.
    pub fn from_template(
        id: impl Into<String>,
        template: &BuildingTemplate,
        recipe: &RecipeTemplate,
        pos: PlanPos,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            template_id: template.id.clone(),
            attributes: BuildingAttributes::from(template),
            multiplier: 1,
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            duration_s: recipe.duration_s,
            inputs: recipe
                .inputs
                .iter()
                .map(|io| Slot::from_recipe_io(io, recipe.duration_s))
                .collect(),
            outputs: recipe
                .outputs
                .iter()
                .map(|io| Slot::from_recipe_io(io, recipe.duration_s))
                .collect(),
            pos,
            width,
            height,
        }
    }

    pub fn slots(&self, direction: FlowDirection) -> &[Slot] {
        match direction {
            FlowDirection::Input => &self.inputs,
            FlowDirection::Output => &self.outputs,
        }
    }

    pub fn slots_mut(&mut self, direction: FlowDirection) -> &mut Vec<Slot> {
        match direction {
            FlowDirection::Input => &mut self.inputs,
            FlowDirection::Output => &mut self.outputs,
        }
    }

    pub fn slot(&self, direction: FlowDirection, product: &str) -> Option<&Slot> {
        self.slots(direction).iter().find(|s| s.product == product)
    }

    pub fn slot_mut(&mut self, direction: FlowDirection, product: &str) -> Option<&mut Slot> {
        self.slots_mut(direction)
            .iter_mut()
            .find(|s| s.product == product)
    }

    pub fn slot_at(&self, direction: FlowDirection, index: usize) -> Option<&Slot> {
        self.slots(direction).get(index)
    }

    /// Widest side of the recipe; drives card height.
    pub fn max_slot_count(&self) -> usize {
        self.inputs.len().max(self.outputs.len())
    }

    pub fn rect(&self) -> crate::geometry::Rect {
        crate::geometry::Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }
}
