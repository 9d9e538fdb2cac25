//! Catalog data shapes: products, build costs, recipes, building templates.

use serde::{Deserialize, Serialize};

/// A product that can flow between buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Product class (e.g. loose, fluid, unit). Named `type` in source data.
    #[serde(rename = "type")]
    pub kind: String,
    pub icon_path: String,
}

/// One line of a building's construction cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildCost {
    pub product: String,
    pub quantity: f64,
}

/// One input or output line of a recipe, in raw per-cycle units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecipeIo {
    pub name: String,
    pub quantity: f64,
}

/// A recipe variant a building can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecipeTemplate {
    pub id: String,
    pub name: String,
    /// Cycle duration in seconds; per-minute rates are `quantity * 60 / duration_s`.
    pub duration_s: f64,
    pub inputs: Vec<RecipeIo>,
    pub outputs: Vec<RecipeIo>,
}

/// A placeable building template.
///
/// `previous_tier` / `next_tier` are template ids; empty string means the
/// building has no tier in that direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildingTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub previous_tier: String,
    #[serde(default)]
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
    pub recipes: Vec<RecipeTemplate>,
}

impl BuildingTemplate {
    /// Find a recipe variant by id.
    pub fn recipe(&self, recipe_id: &str) -> Option<&RecipeTemplate> {
        self.recipes.iter().find(|r| r.id == recipe_id)
    }
}
