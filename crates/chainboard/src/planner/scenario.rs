//! Demo scenarios (stable ids) used by the demo binary and tests.

use chainboard_catalog::{BuildingTemplate, Catalog, Product, RecipeIo, RecipeTemplate};
use serde::{Deserialize, Serialize};

use crate::geometry::PlanPos;

use super::kernel::PlanKernel;
use super::types::{FlowDirection, FlowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoScenario {
    Minimal,
    SmelterChain,
    SaturatedSplit,
}

impl DemoScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoScenario::Minimal => "minimal",
            DemoScenario::SmelterChain => "smelter_chain",
            DemoScenario::SaturatedSplit => "saturated_split",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "minimal" => Some(DemoScenario::Minimal),
            "smelter_chain" | "smelter-chain" | "chain" => Some(DemoScenario::SmelterChain),
            "saturated_split" | "saturated-split" | "split" => Some(DemoScenario::SaturatedSplit),
            _ => None,
        }
    }
}

fn product(id: &str, name: &str, kind: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        icon: format!("{id}.svg"),
        kind: kind.to_string(),
        icon_path: format!("icons/{id}.svg"),
    }
}

fn io(name: &str, quantity: f64) -> RecipeIo {
    RecipeIo {
        name: name.to_string(),
        quantity,
    }
}

fn recipe(
    id: &str,
    name: &str,
    duration_s: f64,
    inputs: Vec<RecipeIo>,
    outputs: Vec<RecipeIo>,
) -> RecipeTemplate {
    RecipeTemplate {
        id: id.to_string(),
        name: name.to_string(),
        duration_s,
        inputs,
        outputs,
    }
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    name: &str,
    category: &str,
    previous_tier: &str,
    next_tier: &str,
    workers: u32,
    electricity_consumed: f64,
    recipes: Vec<RecipeTemplate>,
) -> BuildingTemplate {
    BuildingTemplate {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        previous_tier: previous_tier.to_string(),
        next_tier: next_tier.to_string(),
        workers,
        maintenance_cost_units: "Maintenance I".to_string(),
        maintenance_cost_quantity: 2.0,
        electricity_consumed,
        electricity_generated: 0.0,
        computing_consumed: 0.0,
        computing_generated: 0.0,
        product_type: "Solid".to_string(),
        storage_capacity: 0.0,
        unity_cost: 0.0,
        research_speed: 0.0,
        icon_path: format!("icons/{id}.svg"),
        build_costs: Vec::new(),
        recipes,
    }
}

/// A small iron-working catalog: mines, two smelter tiers, an arc smelter
/// running on scrap, and a beam caster.
pub fn demo_catalog() -> Catalog {
    Catalog::new(
        vec![
            product("iron-ore", "Iron Ore", "Loose"),
            product("coal", "Coal", "Loose"),
            product("iron", "Iron", "Molten"),
            product("iron-scrap", "Iron Scrap", "Loose"),
            product("iron-beam", "Iron Beam", "Solid"),
        ],
        vec![
            template(
                "ore-excavator-1",
                "Ore Excavator",
                "Mining",
                "",
                "ore-excavator-2",
                4,
                0.0,
                vec![recipe(
                    "excavate-iron",
                    "Excavate Iron Ore",
                    60.0,
                    vec![],
                    vec![io("Iron Ore", 10.0)],
                )],
            ),
            template(
                "ore-excavator-2",
                "Ore Excavator II",
                "Mining",
                "ore-excavator-1",
                "",
                6,
                50.0,
                vec![recipe(
                    "excavate-iron-2",
                    "Excavate Iron Ore",
                    60.0,
                    vec![],
                    vec![io("Iron Ore", 20.0)],
                )],
            ),
            template(
                "iron-smelter-1",
                "Iron Smelter",
                "Metallurgy",
                "",
                "iron-smelter-2",
                8,
                120.0,
                vec![recipe(
                    "smelt-iron",
                    "Smelt Iron",
                    60.0,
                    vec![io("Iron Ore", 10.0)],
                    vec![io("Iron", 10.0)],
                )],
            ),
            template(
                "iron-smelter-2",
                "Iron Smelter II",
                "Metallurgy",
                "iron-smelter-1",
                "",
                10,
                250.0,
                vec![
                    recipe(
                        "smelt-iron-2",
                        "Smelt Iron",
                        60.0,
                        vec![io("Iron Ore", 20.0), io("Coal", 5.0)],
                        vec![io("Iron", 20.0)],
                    ),
                    recipe(
                        "smelt-scrap-2",
                        "Smelt Scrap",
                        60.0,
                        vec![io("Iron Scrap", 15.0)],
                        vec![io("Iron", 15.0)],
                    ),
                ],
            ),
            template(
                "arc-smelter-1",
                "Arc Smelter",
                "Metallurgy",
                "",
                "",
                6,
                400.0,
                vec![recipe(
                    "arc-smelt-scrap",
                    "Arc Smelt Scrap",
                    60.0,
                    vec![io("Iron Scrap", 12.0)],
                    vec![io("Iron", 12.0)],
                )],
            ),
            template(
                "coal-mine-1",
                "Coal Mine",
                "Mining",
                "",
                "",
                4,
                0.0,
                vec![recipe(
                    "mine-coal",
                    "Mine Coal",
                    60.0,
                    vec![],
                    vec![io("Coal", 10.0)],
                )],
            ),
            template(
                "beam-caster-1",
                "Beam Caster",
                "Metallurgy",
                "",
                "",
                6,
                90.0,
                vec![recipe(
                    "cast-beam",
                    "Cast Iron Beam",
                    60.0,
                    vec![io("Iron", 10.0)],
                    vec![io("Iron Beam", 5.0)],
                )],
            ),
        ],
    )
}

/// Build a kernel pre-populated with the named scenario.
pub fn build_scenario(scenario: DemoScenario) -> Result<PlanKernel, FlowError> {
    let mut kernel = PlanKernel::new(demo_catalog());
    match scenario {
        DemoScenario::Minimal => {
            let mine = kernel.place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))?;
            kernel.place_related(&mine, FlowDirection::Output, "Iron Ore", "iron-smelter-1", None)?;
        }
        DemoScenario::SmelterChain => {
            let mine = kernel.place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))?;
            let (smelter, _) = kernel.place_related(
                &mine,
                FlowDirection::Output,
                "Iron Ore",
                "iron-smelter-1",
                None,
            )?;
            kernel.place_related(&smelter, FlowDirection::Output, "Iron", "beam-caster-1", None)?;
        }
        DemoScenario::SaturatedSplit => {
            let mine = kernel.place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))?;
            kernel.place_related(&mine, FlowDirection::Output, "Iron Ore", "iron-smelter-1", None)?;
            kernel.place_related(&mine, FlowDirection::Output, "Iron Ore", "iron-smelter-1", None)?;
            // One excavator cannot feed both smelters; doubling it splits
            // the ore evenly.
            kernel.rescale(&mine, 2)?;
        }
    }
    Ok(kernel)
}
