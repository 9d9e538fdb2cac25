//! Placement of newly created nodes on the plan canvas.

use crate::geometry::{PlanPos, Rect};

use super::graph::{ChainGraph, LayoutConfig};
use super::node::Node;
use super::types::FlowDirection;

/// Resolve a desired position against the existing nodes.
///
/// If the desired footprint overlaps nothing, it is used as-is. Otherwise the
/// node keeps its X and drops below the lowest node in the same column
/// (any node whose X-interval overlaps the footprint), plus the vertical gap.
pub fn find_free_position(
    graph: &ChainGraph,
    desired: PlanPos,
    width: f64,
    height: f64,
    layout: &LayoutConfig,
) -> PlanPos {
    let target = Rect::new(desired.x, desired.y, width, height);

    let collides = graph.nodes.values().any(|node| target.overlaps(&node.rect()));
    if !collides {
        return desired;
    }

    let column_bottom = graph
        .nodes
        .values()
        .map(|node| node.rect())
        .filter(|rect| target.overlaps_horizontally(rect))
        .map(|rect| rect.bottom())
        .fold(f64::NEG_INFINITY, f64::max);
    if column_bottom == f64::NEG_INFINITY {
        return desired;
    }

    PlanPos::new(desired.x, column_bottom + layout.vertical_gap)
}

/// Where a counterpart spawned off `origin` starts out: one card to the right
/// for a consumer of the origin's output, one card to the left for a supplier
/// of its input, at the origin's Y.
pub fn counterpart_position(origin: &Node, direction: FlowDirection, layout: &LayoutConfig) -> PlanPos {
    let step = origin.width + layout.horizontal_gap;
    let x = match direction {
        FlowDirection::Output => origin.pos.x + step,
        FlowDirection::Input => origin.pos.x - step,
    };
    PlanPos::new(x, origin.pos.y)
}
