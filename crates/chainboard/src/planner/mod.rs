//! Flow planner module - the allocation kernel, graph model, and helpers.
//!
//! This module is organized into submodules:
//! - `types`: Core type definitions (ids, direction, errors)
//! - `node`: Node entities (attributes, slots, template instantiation)
//! - `graph`: Graph aggregate (node map, edge arena, config, totals)
//! - `capacity`: Capacity and redistribution math
//! - `kernel`: PlanKernel (entry points, propagation, event journal)
//! - `tier`: Tier migration (recipe scoring, template swap)
//! - `placement`: Collision-avoiding node placement
//! - `persist`: Snapshot, Journal, and persistence utilities
//! - `scenario`: Demo scenarios (stable ids)

pub mod capacity;
mod graph;
mod kernel;
mod node;
mod persist;
mod placement;
mod scenario;
mod tier;
mod types;

#[cfg(test)]
mod tests;

pub use graph::{ChainGraph, FlowEdge, GraphTotals, LayoutConfig, PlanConfig};
pub use kernel::{PlanEvent, PlanEventKind, PlanKernel, TierChangeReport};
pub use node::{BuildingAttributes, Node, Slot};
pub use persist::{PersistError, PlanJournal, PlanSnapshot};
pub use placement::{counterpart_position, find_free_position};
pub use scenario::{build_scenario, demo_catalog, DemoScenario};
pub use tier::CancelledConnection;
pub use types::{
    EdgeId, FlowDirection, FlowError, NodeId, PlanEventId, ProductName, JOURNAL_VERSION,
    SNAPSHOT_VERSION,
};
