//! chainboard - the flow engine behind a factory production-chain diagram.
//!
//! Users place building nodes that produce and consume typed goods at fixed
//! per-minute rates, connect them with directional flow edges, and the engine
//! keeps every connection amount, per-node throughput, and aggregate total
//! consistent through connects, disconnects, rescales, tier changes, and
//! deletions. Rendering, input handling, and modal UX live in the host
//! application; this crate owns the graph state and the allocation rules.

pub mod geometry;
pub mod planner;

pub use geometry::{PlanPos, Rect};
pub use planner::{
    build_scenario, demo_catalog, BuildingAttributes, CancelledConnection, ChainGraph,
    DemoScenario, EdgeId, FlowDirection, FlowError, FlowEdge, GraphTotals, LayoutConfig, Node,
    NodeId, PersistError, PlanConfig, PlanEvent, PlanEventId, PlanEventKind, PlanJournal,
    PlanKernel, PlanSnapshot, ProductName, Slot, TierChangeReport,
};

// Catalog types come from the leaf crate; re-exported for host convenience.
pub use chainboard_catalog::{
    BuildCost, BuildingTemplate, Catalog, CatalogError, Product, RecipeIo, RecipeTemplate,
    RelatedTemplates,
};
