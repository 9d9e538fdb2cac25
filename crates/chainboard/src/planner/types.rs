//! Core type definitions: ids, slot direction, constants, and engine errors.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

pub type NodeId = String;
pub type ProductName = String;
pub type EdgeId = u64;
pub type PlanEventId = u64;

// ============================================================================
// Constants
// ============================================================================

pub const SNAPSHOT_VERSION: u32 = 1;
pub const JOURNAL_VERSION: u32 = 1;

// ============================================================================
// Slot Direction
// ============================================================================

/// Which side of a node a slot sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Input,
    Output,
}

impl FlowDirection {
    /// The direction a counterpart's slot must have to pair with this one.
    pub fn opposite(&self) -> FlowDirection {
        match self {
            FlowDirection::Input => FlowDirection::Output,
            FlowDirection::Output => FlowDirection::Input,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::Input => "input",
            FlowDirection::Output => "output",
        }
    }
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Why an engine operation was rejected. A rejected operation mutates nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FlowError {
    NodeNotFound {
        node_id: NodeId,
    },
    SlotNotFound {
        node_id: NodeId,
        direction: FlowDirection,
        product: ProductName,
    },
    SlotIndexOutOfRange {
        node_id: NodeId,
        direction: FlowDirection,
        index: usize,
    },
    TemplateNotFound {
        template_id: String,
    },
    RecipeNotFound {
        template_id: String,
        recipe_id: String,
    },
    ProductNotInRecipe {
        template_id: String,
        recipe_id: String,
        product: ProductName,
    },
    ProductMismatch {
        supplier_product: ProductName,
        consumer_product: ProductName,
    },
    AlreadyConnected {
        supplier: NodeId,
        consumer: NodeId,
        product: ProductName,
    },
    SelfConnection {
        node_id: NodeId,
    },
    InvalidMultiplier {
        multiplier: u32,
    },
}
