//! Tests for the planner module.

use super::*;
use crate::geometry::PlanPos;
use chainboard_catalog::{BuildingTemplate, Catalog, RecipeIo, RecipeTemplate};

fn demo_kernel() -> PlanKernel {
    PlanKernel::new(demo_catalog())
}

/// A minimal catalog with one product and capacity-tuned sinks, for tests
/// that need exact partial-fill arithmetic.
fn widget_catalog() -> Catalog {
    let sink = |id: &str, cap: f64| BuildingTemplate {
        id: id.to_string(),
        name: id.to_string(),
        recipes: vec![RecipeTemplate {
            id: format!("{id}-r0"),
            name: id.to_string(),
            duration_s: 60.0,
            inputs: vec![RecipeIo {
                name: "Widget".to_string(),
                quantity: cap,
            }],
            outputs: Vec::new(),
        }],
        ..BuildingTemplate::default()
    };
    let source = BuildingTemplate {
        id: "source".to_string(),
        name: "source".to_string(),
        recipes: vec![RecipeTemplate {
            id: "source-r0".to_string(),
            name: "source".to_string(),
            duration_s: 60.0,
            inputs: Vec::new(),
            outputs: vec![RecipeIo {
                name: "Widget".to_string(),
                quantity: 10.0,
            }],
        }],
        ..BuildingTemplate::default()
    };
    Catalog::new(
        Vec::new(),
        vec![source, sink("sink-eight", 8.0), sink("sink-seven", 7.0)],
    )
}

fn amount(kernel: &PlanKernel, supplier: &str, consumer: &str, product: &str) -> f64 {
    let edge_id = kernel
        .graph()
        .edge_between(supplier, consumer, product)
        .expect("edge exists");
    kernel.graph().edge(edge_id).expect("edge in arena").amount
}

/// The structural invariants every operation must preserve: back-reference
/// consistency and per-slot capacity.
fn assert_invariants(kernel: &PlanKernel) {
    kernel
        .graph()
        .check_consistency()
        .expect("graph consistent");
    for node in kernel.graph().nodes.values() {
        for direction in [FlowDirection::Input, FlowDirection::Output] {
            for slot in node.slots(direction) {
                let used = capacity::used_capacity(kernel.graph(), slot);
                let total = capacity::slot_capacity(slot, node.multiplier);
                assert!(
                    used <= total + 1e-9,
                    "slot {} on {} over capacity: {used} > {total}",
                    slot.product,
                    node.id
                );
            }
        }
    }
}

// ============================================================================
// Instantiation
// ============================================================================

#[test]
fn placed_node_derives_per_minute_rates() {
    let mut kernel = demo_kernel();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();

    let node = kernel.graph().node(&smelter).unwrap();
    assert_eq!(node.multiplier, 1);
    assert_eq!(node.inputs.len(), 1);
    assert_eq!(node.outputs.len(), 1);
    assert_eq!(node.inputs[0].product, "Iron Ore");
    assert_eq!(node.inputs[0].rate_per_building, 10.0);
    assert!(node.inputs[0].edges.is_empty());
    assert!(node.inputs[0].priority.is_none());
}

#[test]
fn place_node_rejects_unknown_template_and_recipe() {
    let mut kernel = demo_kernel();
    let err = kernel
        .place_node("no-such-building", None, PlanPos::new(0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, FlowError::TemplateNotFound { .. }));

    let err = kernel
        .place_node("iron-smelter-1", Some("wrong-recipe"), PlanPos::new(0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, FlowError::RecipeNotFound { .. }));
    assert!(kernel.graph().nodes.is_empty());
}

#[test]
fn place_node_can_pick_a_recipe_variant() {
    let mut kernel = demo_kernel();
    let smelter = kernel
        .place_node("iron-smelter-2", Some("smelt-scrap-2"), PlanPos::new(0.0, 0.0))
        .unwrap();
    let node = kernel.graph().node(&smelter).unwrap();
    assert_eq!(node.recipe_id, "smelt-scrap-2");
    assert_eq!(node.inputs[0].product, "Iron Scrap");
}

// ============================================================================
// Connecting
// ============================================================================

#[test]
fn new_connection_claims_min_of_both_free_sides() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();

    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

#[test]
fn saturated_supplier_gives_new_consumer_nothing() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let first = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let second = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 400.0))
        .unwrap();

    kernel.connect(&mine, 0, &first, 0).unwrap();
    kernel.connect(&mine, 0, &second, 0).unwrap();
    assert_eq!(amount(&kernel, &mine, &first, "Iron Ore"), 10.0);
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 0.0);

    // Doubling the excavator splits the ore across both consumers.
    kernel.rescale(&mine, 2).unwrap();
    assert_eq!(amount(&kernel, &mine, &first, "Iron Ore"), 10.0);
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

#[test]
fn connect_rejections_leave_graph_untouched() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let caster = kernel
        .place_node("beam-caster-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(1200.0, 0.0))
        .unwrap();
    let before = kernel.graph().clone();

    // Iron Ore output into an Iron input.
    let err = kernel.connect(&mine, 0, &caster, 0).unwrap_err();
    assert!(matches!(err, FlowError::ProductMismatch { .. }));

    let err = kernel.connect(&mine, 5, &smelter, 0).unwrap_err();
    assert!(matches!(err, FlowError::SlotIndexOutOfRange { .. }));

    let err = kernel.connect("ghost", 0, &smelter, 0).unwrap_err();
    assert!(matches!(err, FlowError::NodeNotFound { .. }));

    let err = kernel.connect(&mine, 0, &mine, 0).unwrap_err();
    assert!(matches!(err, FlowError::SelfConnection { .. }));

    assert_eq!(&before, kernel.graph());

    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    let err = kernel.connect(&mine, 0, &smelter, 0).unwrap_err();
    assert!(matches!(err, FlowError::AlreadyConnected { .. }));
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);
}

// ============================================================================
// Disconnecting and redistribution
// ============================================================================

#[test]
fn disconnect_redistributes_up_to_counterpart_headroom() {
    let mut kernel = PlanKernel::new(widget_catalog());
    let source = kernel
        .place_node("source", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let eight = kernel
        .place_node("sink-eight", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let seven = kernel
        .place_node("sink-seven", None, PlanPos::new(600.0, 400.0))
        .unwrap();

    kernel.connect(&source, 0, &eight, 0).unwrap();
    kernel.connect(&source, 0, &seven, 0).unwrap();
    assert_eq!(amount(&kernel, &source, &eight, "Widget"), 8.0);
    assert_eq!(amount(&kernel, &source, &seven, "Widget"), 2.0);

    kernel
        .disconnect(&source, FlowDirection::Output, &eight, "Widget")
        .unwrap();

    // The freed 8 flow to the surviving consumer only up to its headroom of
    // 5; the remaining 3 become idle capacity.
    assert!(kernel.graph().edge_between(&source, &eight, "Widget").is_none());
    assert_eq!(amount(&kernel, &source, &seven, "Widget"), 7.0);
    assert_invariants(&kernel);

    let removal = kernel
        .journal()
        .iter()
        .rev()
        .find_map(|event| match &event.kind {
            PlanEventKind::EdgeRemoved { freed, reabsorbed, .. } => Some((*freed, *reabsorbed)),
            _ => None,
        })
        .expect("removal event");
    assert_eq!(removal, (8.0, 5.0));
}

#[test]
fn disconnect_works_from_the_consumer_side_too() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();

    kernel
        .disconnect(&smelter, FlowDirection::Input, &mine, "Iron Ore")
        .unwrap();
    assert!(kernel.graph().edges.is_empty());
    let node = kernel.graph().node(&smelter).unwrap();
    assert!(node.inputs[0].edges.is_empty());
    assert_invariants(&kernel);
}

#[test]
fn disconnect_missing_connection_is_a_silent_noop() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let events_before = kernel.journal().len();

    kernel
        .disconnect(&mine, FlowDirection::Output, "never-connected", "Iron Ore")
        .unwrap();
    assert_eq!(kernel.journal().len(), events_before);

    let err = kernel
        .disconnect(&mine, FlowDirection::Output, "x", "Plutonium")
        .unwrap_err();
    assert!(matches!(err, FlowError::SlotNotFound { .. }));

    let err = kernel
        .disconnect("ghost", FlowDirection::Output, "x", "Iron Ore")
        .unwrap_err();
    assert!(matches!(err, FlowError::NodeNotFound { .. }));
}

// ============================================================================
// Rescaling and recomputation
// ============================================================================

#[test]
fn rescale_rejects_zero_and_missing_node() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();

    let err = kernel.rescale(&mine, 0).unwrap_err();
    assert!(matches!(err, FlowError::InvalidMultiplier { multiplier: 0 }));

    let err = kernel.rescale("ghost", 2).unwrap_err();
    assert!(matches!(err, FlowError::NodeNotFound { .. }));
}

#[test]
fn rescale_down_shrinks_committed_amounts() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let first = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let second = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 400.0))
        .unwrap();
    kernel.connect(&mine, 0, &first, 0).unwrap();
    kernel.connect(&mine, 0, &second, 0).unwrap();
    kernel.rescale(&mine, 2).unwrap();

    // Back down to one building: the first-connected consumer keeps the ore.
    kernel.rescale(&mine, 1).unwrap();
    assert_eq!(amount(&kernel, &mine, &first, "Iron Ore"), 10.0);
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 0.0);
    assert_invariants(&kernel);
}

#[test]
fn recompute_is_a_fixed_point() {
    let mut kernel = build_scenario(DemoScenario::SaturatedSplit).unwrap();
    let node_ids: Vec<NodeId> = kernel.graph().nodes.keys().cloned().collect();

    for node_id in &node_ids {
        let multiplier = kernel.graph().node(node_id).unwrap().multiplier;
        kernel.recompute_node(node_id, multiplier).unwrap();
    }
    let settled = kernel.graph().clone();

    for node_id in &node_ids {
        let multiplier = kernel.graph().node(node_id).unwrap().multiplier;
        kernel.recompute_node(node_id, multiplier).unwrap();
    }
    assert_eq!(&settled, kernel.graph());
}

// ============================================================================
// Prioritization
// ============================================================================

#[test]
fn prioritized_counterpart_is_served_first() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let first = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let second = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 400.0))
        .unwrap();
    kernel.connect(&mine, 0, &first, 0).unwrap();
    kernel.connect(&mine, 0, &second, 0).unwrap();
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 0.0);

    kernel
        .prioritize(&mine, FlowDirection::Output, "Iron Ore", &second)
        .unwrap();
    assert_eq!(amount(&kernel, &mine, &first, "Iron Ore"), 0.0);
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 10.0);

    // Prioritizing the other consumer clears the previous flag: exclusive,
    // last write wins.
    kernel
        .prioritize(&mine, FlowDirection::Output, "Iron Ore", &first)
        .unwrap();
    assert_eq!(amount(&kernel, &mine, &first, "Iron Ore"), 10.0);
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 0.0);
    let slot = kernel
        .graph()
        .node(&mine)
        .unwrap()
        .slot(FlowDirection::Output, "Iron Ore")
        .unwrap();
    assert_eq!(slot.priority.as_deref(), Some(first.as_str()));
    assert_invariants(&kernel);
}

#[test]
fn prioritize_unconnected_counterpart_is_a_noop() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let events_before = kernel.journal().len();

    kernel
        .prioritize(&mine, FlowDirection::Output, "Iron Ore", "stranger")
        .unwrap();
    assert_eq!(kernel.journal().len(), events_before);
    let slot = kernel
        .graph()
        .node(&mine)
        .unwrap()
        .slot(FlowDirection::Output, "Iron Ore")
        .unwrap();
    assert!(slot.priority.is_none());
}

#[test]
fn removing_the_prioritized_counterpart_clears_the_flag() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    kernel
        .prioritize(&mine, FlowDirection::Output, "Iron Ore", &smelter)
        .unwrap();

    kernel
        .disconnect(&mine, FlowDirection::Output, &smelter, "Iron Ore")
        .unwrap();
    let slot = kernel
        .graph()
        .node(&mine)
        .unwrap()
        .slot(FlowDirection::Output, "Iron Ore")
        .unwrap();
    assert!(slot.priority.is_none());
}

// ============================================================================
// Tier migration
// ============================================================================

#[test]
fn tier_change_picks_the_most_similar_recipe() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();

    let report = kernel.increase_tier(&smelter).unwrap();
    // smelt-iron-2 shares Iron Ore and Iron with the current recipe;
    // smelt-scrap-2 shares only Iron.
    assert_eq!(report.template_id, "iron-smelter-2");
    assert_eq!(report.recipe_id, "smelt-iron-2");
    assert!(report.cancelled.is_empty());

    let node = kernel.graph().node(&smelter).unwrap();
    assert_eq!(node.template_id, "iron-smelter-2");
    assert_eq!(node.inputs.len(), 2);
    assert_eq!(node.inputs[0].rate_per_building, 20.0);
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

#[test]
fn tier_change_cancels_incompatible_connections() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let caster = kernel
        .place_node("beam-caster-1", None, PlanPos::new(1200.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    kernel.connect(&smelter, 0, &caster, 0).unwrap();

    // The arc smelter runs on scrap: the ore line dies, the iron line lives.
    let report = kernel.change_tier(&smelter, "arc-smelter-1").unwrap();
    assert_eq!(report.cancelled.len(), 1);
    assert_eq!(report.cancelled[0].counterpart, mine);
    assert_eq!(report.cancelled[0].product, "Iron Ore");
    assert_eq!(report.cancelled[0].direction, FlowDirection::Input);

    assert!(kernel.graph().edge_between(&mine, &smelter, "Iron Ore").is_none());
    assert_eq!(amount(&kernel, &smelter, &caster, "Iron"), 10.0);

    // The supplier's total capacity is untouched; the ore is simply free
    // again.
    let mine_node = kernel.graph().node(&mine).unwrap();
    let out_slot = mine_node.slot(FlowDirection::Output, "Iron Ore").unwrap();
    assert_eq!(capacity::free_capacity(kernel.graph(), out_slot, mine_node.multiplier), 10.0);
    assert_invariants(&kernel);
}

#[test]
fn tier_change_to_unknown_template_mutates_nothing() {
    let mut kernel = demo_kernel();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let before = kernel.graph().clone();

    let err = kernel.change_tier(&smelter, "no-such-tier").unwrap_err();
    assert!(matches!(err, FlowError::TemplateNotFound { .. }));
    assert_eq!(&before, kernel.graph());

    // A building at the top of its tier ladder has nowhere to go.
    let mine = kernel
        .place_node("ore-excavator-2", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let err = kernel.increase_tier(&mine).unwrap_err();
    assert!(matches!(err, FlowError::TemplateNotFound { .. }));
}

#[test]
fn tier_ladder_round_trip_keeps_connections() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();

    kernel.increase_tier(&mine).unwrap();
    assert_eq!(kernel.graph().node(&mine).unwrap().template_id, "ore-excavator-2");
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);

    kernel.decrease_tier(&mine).unwrap();
    assert_eq!(kernel.graph().node(&mine).unwrap().template_id, "ore-excavator-1");
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

#[test]
fn carried_overcapacity_settles_on_the_next_recomputation() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-2", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-2", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 20.0);

    // Downgrading the smelter halves the ore intake; the carried amount is
    // clamped as soon as the supplier is re-settled.
    kernel.decrease_tier(&smelter).unwrap();
    assert_eq!(amount(&kernel, &mine, &smelter, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

// ============================================================================
// Cascade deletion
// ============================================================================

#[test]
fn deleting_a_node_leaves_no_dangling_state() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-2", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let coal = kernel
        .place_node("coal-mine-1", None, PlanPos::new(0.0, 400.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-2", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let caster = kernel
        .place_node("beam-caster-1", None, PlanPos::new(1200.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();
    kernel.connect(&coal, 0, &smelter, 1).unwrap();
    kernel.connect(&smelter, 0, &caster, 0).unwrap();
    assert_eq!(kernel.graph().edges.len(), 3);

    kernel.delete_node(&smelter).unwrap();

    assert!(kernel.graph().node(&smelter).is_none());
    assert!(kernel.graph().edges.is_empty());
    for id in [&mine, &coal, &caster] {
        let node = kernel.graph().node(id).unwrap();
        for direction in [FlowDirection::Input, FlowDirection::Output] {
            for slot in node.slots(direction) {
                assert!(slot.edges.is_empty(), "dangling edge on {id}");
            }
        }
    }
    assert_invariants(&kernel);

    let err = kernel.delete_node(&smelter).unwrap_err();
    assert!(matches!(err, FlowError::NodeNotFound { .. }));
}

#[test]
fn deleting_a_consumer_redistributes_to_the_survivors() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let first = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    let second = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 400.0))
        .unwrap();
    kernel.connect(&mine, 0, &first, 0).unwrap();
    kernel.connect(&mine, 0, &second, 0).unwrap();
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 0.0);

    kernel.delete_node(&first).unwrap();
    assert_eq!(amount(&kernel, &mine, &second, "Iron Ore"), 10.0);
    assert_invariants(&kernel);
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn colliding_placement_drops_below_the_column() {
    let mut kernel = demo_kernel();
    let layout = kernel.config().layout.clone();
    let first = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let second = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();

    let first_node = kernel.graph().node(&first).unwrap();
    let second_node = kernel.graph().node(&second).unwrap();
    assert_eq!(first_node.pos, PlanPos::new(0.0, 0.0));
    assert_eq!(
        second_node.pos,
        PlanPos::new(0.0, first_node.height + layout.vertical_gap)
    );
}

#[test]
fn touching_footprints_do_not_collide() {
    let mut kernel = demo_kernel();
    let layout = kernel.config().layout.clone();
    kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let beside = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(layout.card_width, 0.0))
        .unwrap();
    assert_eq!(
        kernel.graph().node(&beside).unwrap().pos,
        PlanPos::new(layout.card_width, 0.0)
    );
}

#[test]
fn related_nodes_spawn_beside_the_origin() {
    let mut kernel = demo_kernel();
    let layout = kernel.config().layout.clone();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();

    let (consumer, edge) = kernel
        .place_related(&smelter, FlowDirection::Output, "Iron", "beam-caster-1", None)
        .unwrap();
    let consumer_node = kernel.graph().node(&consumer).unwrap();
    assert_eq!(
        consumer_node.pos.x,
        layout.card_width + layout.horizontal_gap
    );
    assert_eq!(kernel.graph().edge(edge).unwrap().amount, 10.0);

    let (supplier, _) = kernel
        .place_related(&smelter, FlowDirection::Input, "Iron Ore", "ore-excavator-1", None)
        .unwrap();
    let supplier_node = kernel.graph().node(&supplier).unwrap();
    assert_eq!(
        supplier_node.pos.x,
        -(layout.card_width + layout.horizontal_gap)
    );
    assert_invariants(&kernel);
}

#[test]
fn place_related_validates_both_slots() {
    let mut kernel = demo_kernel();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();

    let err = kernel
        .place_related(&smelter, FlowDirection::Output, "Gold", "beam-caster-1", None)
        .unwrap_err();
    assert!(matches!(err, FlowError::SlotNotFound { .. }));

    let err = kernel
        .place_related(&smelter, FlowDirection::Output, "Iron", "coal-mine-1", None)
        .unwrap_err();
    assert!(matches!(err, FlowError::ProductNotInRecipe { .. }));

    // Failed spawns must not leave a node behind.
    assert_eq!(kernel.graph().nodes.len(), 1);
}

// ============================================================================
// Totals and events
// ============================================================================

#[test]
fn totals_scale_with_multiplier() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.rescale(&mine, 3).unwrap();

    let totals = kernel.graph().totals();
    assert_eq!(totals.workers, 3 * 4 + 8);
    assert_eq!(totals.electricity_consumed, 120.0);
    assert_eq!(totals.maintenance_quantity, 3.0 * 2.0 + 2.0);
}

#[test]
fn operations_append_to_the_event_journal() {
    let mut kernel = demo_kernel();
    let mine = kernel
        .place_node("ore-excavator-1", None, PlanPos::new(0.0, 0.0))
        .unwrap();
    let smelter = kernel
        .place_node("iron-smelter-1", None, PlanPos::new(600.0, 0.0))
        .unwrap();
    kernel.connect(&mine, 0, &smelter, 0).unwrap();

    let journal = kernel.journal();
    assert!(matches!(journal[0].kind, PlanEventKind::NodePlaced { .. }));
    match &journal.last().unwrap().kind {
        PlanEventKind::EdgeCreated { amount, .. } => assert_eq!(*amount, 10.0),
        other => panic!("unexpected event: {other:?}"),
    }

    // Event ids are dense and ordered.
    for (index, event) in kernel.journal().iter().enumerate() {
        assert_eq!(event.id, index as u64);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn demo_scenarios_build_consistently() {
    for scenario in [
        DemoScenario::Minimal,
        DemoScenario::SmelterChain,
        DemoScenario::SaturatedSplit,
    ] {
        let kernel = build_scenario(scenario).unwrap();
        assert_invariants(&kernel);
        assert!(!kernel.graph().nodes.is_empty(), "{}", scenario.as_str());
    }

    let split = build_scenario(DemoScenario::SaturatedSplit).unwrap();
    let total: f64 = split.graph().edges.values().map(|e| e.amount).sum();
    assert_eq!(total, 20.0);
}

#[test]
fn scenario_ids_parse_round_trip() {
    for scenario in [
        DemoScenario::Minimal,
        DemoScenario::SmelterChain,
        DemoScenario::SaturatedSplit,
    ] {
        assert_eq!(DemoScenario::parse(scenario.as_str()), Some(scenario));
    }
    assert_eq!(DemoScenario::parse("bogus"), None);
}
