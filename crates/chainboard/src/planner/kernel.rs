//! PlanKernel: the flow-allocation engine behind the diagram.
//!
//! Every entry point runs one user-level operation to completion: it either
//! rejects with a [`FlowError`] and mutates nothing, or applies the change,
//! propagates amounts across every touched node, and appends to the event
//! journal. Counterparts that vanish mid-propagation are skipped rather than
//! aborting the walk; partial propagation beats leaving the rest of the
//! graph stale.

use chainboard_catalog::{BuildingTemplate, Catalog, RecipeTemplate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::geometry::PlanPos;

use super::capacity;
use super::graph::{ChainGraph, FlowEdge, PlanConfig};
use super::node::Node;
use super::persist::{PersistError, PlanJournal, PlanSnapshot};
use super::placement;
use super::tier;
use super::tier::CancelledConnection;
use super::types::{
    EdgeId, FlowDirection, FlowError, NodeId, PlanEventId, ProductName, JOURNAL_VERSION,
    SNAPSHOT_VERSION,
};

// ============================================================================
// Event Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvent {
    pub id: PlanEventId,
    pub kind: PlanEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PlanEventKind {
    NodePlaced {
        node_id: NodeId,
        template_id: String,
        recipe_id: String,
        pos: PlanPos,
    },
    NodeRemoved {
        node_id: NodeId,
    },
    EdgeCreated {
        edge_id: EdgeId,
        supplier: NodeId,
        consumer: NodeId,
        product: ProductName,
        amount: f64,
    },
    EdgeRemoved {
        edge_id: EdgeId,
        supplier: NodeId,
        consumer: NodeId,
        product: ProductName,
        /// Amount the edge carried when it was dissolved.
        freed: f64,
        /// How much of `freed` the surviving counterparts absorbed.
        reabsorbed: f64,
    },
    MultiplierChanged {
        node_id: NodeId,
        from: u32,
        to: u32,
    },
    NodeRecomputed {
        node_id: NodeId,
    },
    PriorityChanged {
        node_id: NodeId,
        direction: FlowDirection,
        product: ProductName,
        counterpart: NodeId,
    },
    TierChanged {
        node_id: NodeId,
        from_template: String,
        to_template: String,
        recipe_id: String,
        cancelled: Vec<CancelledConnection>,
    },
}

/// What a tier change did: the template and recipe settled on, and the
/// connections that did not survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierChangeReport {
    pub template_id: String,
    pub recipe_id: String,
    pub cancelled: Vec<CancelledConnection>,
}

// ============================================================================
// PlanKernel
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlanKernel {
    config: PlanConfig,
    catalog: Catalog,
    graph: ChainGraph,
    next_node_seq: u64,
    next_edge_id: EdgeId,
    next_event_id: PlanEventId,
    journal: Vec<PlanEvent>,
}

impl PlanKernel {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, PlanConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: PlanConfig) -> Self {
        Self {
            config: config.sanitized(),
            catalog,
            graph: ChainGraph::default(),
            next_node_seq: 1,
            next_edge_id: 1,
            next_event_id: 0,
            journal: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PlanConfig) {
        self.config = config.sanitized();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &ChainGraph {
        &self.graph
    }

    pub fn journal(&self) -> &[PlanEvent] {
        &self.journal
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> PlanSnapshot {
        PlanSnapshot {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
            graph: self.graph.clone(),
            next_node_seq: self.next_node_seq,
            next_edge_id: self.next_edge_id,
            next_event_id: self.next_event_id,
            journal_len: self.journal.len(),
        }
    }

    pub fn journal_snapshot(&self) -> PlanJournal {
        PlanJournal {
            version: JOURNAL_VERSION,
            events: self.journal.clone(),
        }
    }

    /// Rebuild a kernel from persisted state. The catalog is not part of the
    /// snapshot (it is a read-only collaborator), so the caller supplies it
    /// again.
    pub fn from_snapshot(
        catalog: Catalog,
        snapshot: PlanSnapshot,
        journal: PlanJournal,
    ) -> Result<Self, PersistError> {
        snapshot.validate_version()?;
        journal.validate_version()?;
        if snapshot.journal_len != journal.events.len() {
            return Err(PersistError::SnapshotMismatch {
                expected: snapshot.journal_len,
                actual: journal.events.len(),
            });
        }
        Ok(Self {
            config: snapshot.config.sanitized(),
            catalog,
            graph: snapshot.graph,
            next_node_seq: snapshot.next_node_seq,
            next_edge_id: snapshot.next_edge_id,
            next_event_id: snapshot.next_event_id,
            journal: journal.events,
        })
    }

    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), PersistError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        self.snapshot().save_json(dir.join("snapshot.json"))?;
        self.journal_snapshot().save_json(dir.join("journal.json"))?;
        Ok(())
    }

    pub fn load_from_dir(catalog: Catalog, dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref();
        let snapshot = PlanSnapshot::load_json(dir.join("snapshot.json"))?;
        let journal = PlanJournal::load_json(dir.join("journal.json"))?;
        Self::from_snapshot(catalog, snapshot, journal)
    }

    // -------------------------------------------------------------------------
    // Node placement
    // -------------------------------------------------------------------------

    /// Place a new node instantiated from a catalog template, avoiding
    /// overlap with existing nodes.
    pub fn place_node(
        &mut self,
        template_id: &str,
        recipe_id: Option<&str>,
        desired: PlanPos,
    ) -> Result<NodeId, FlowError> {
        let template = self
            .catalog
            .template(template_id)
            .cloned()
            .ok_or_else(|| FlowError::TemplateNotFound {
                template_id: template_id.to_string(),
            })?;
        let recipe = self.resolve_recipe(&template, recipe_id)?;
        Ok(self.instantiate_node(&template, &recipe, desired))
    }

    /// Spawn a counterpart next to `origin_id` and connect the two product
    /// slots: a consumer to the right when `direction` is `Output`, a
    /// supplier to the left when it is `Input`.
    pub fn place_related(
        &mut self,
        origin_id: &str,
        direction: FlowDirection,
        product: &str,
        template_id: &str,
        recipe_id: Option<&str>,
    ) -> Result<(NodeId, EdgeId), FlowError> {
        let desired = {
            let origin = self.graph.node(origin_id).ok_or_else(|| FlowError::NodeNotFound {
                node_id: origin_id.to_string(),
            })?;
            if origin.slot(direction, product).is_none() {
                return Err(FlowError::SlotNotFound {
                    node_id: origin_id.to_string(),
                    direction,
                    product: product.to_string(),
                });
            }
            placement::counterpart_position(origin, direction, &self.config.layout)
        };

        let template = self
            .catalog
            .template(template_id)
            .cloned()
            .ok_or_else(|| FlowError::TemplateNotFound {
                template_id: template_id.to_string(),
            })?;
        let recipe = self.resolve_recipe(&template, recipe_id)?;
        let counterpart_side = direction.opposite();
        let recipe_side = match counterpart_side {
            FlowDirection::Input => &recipe.inputs,
            FlowDirection::Output => &recipe.outputs,
        };
        if !recipe_side.iter().any(|io| io.name == product) {
            return Err(FlowError::ProductNotInRecipe {
                template_id: template.id.clone(),
                recipe_id: recipe.id.clone(),
                product: product.to_string(),
            });
        }

        let created_id = self.instantiate_node(&template, &recipe, desired);
        let (supplier_id, consumer_id) = match direction {
            FlowDirection::Output => (origin_id.to_string(), created_id.clone()),
            FlowDirection::Input => (created_id.clone(), origin_id.to_string()),
        };
        let supplier_index = self.slot_index(&supplier_id, FlowDirection::Output, product)?;
        let consumer_index = self.slot_index(&consumer_id, FlowDirection::Input, product)?;
        let edge_id = self.connect(&supplier_id, supplier_index, &consumer_id, consumer_index)?;
        Ok((created_id, edge_id))
    }

    /// Dissolve every connection the node holds (mirrored teardown with
    /// redistribution, same path as `disconnect`), then remove the node.
    pub fn delete_node(&mut self, node_id: &str) -> Result<(), FlowError> {
        if !self.graph.nodes.contains_key(node_id) {
            return Err(FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        for direction in [FlowDirection::Input, FlowDirection::Output] {
            let bound = self.bound_connections(node_id, direction);
            for (product, counterpart, edge_id) in bound {
                if self.graph.nodes.contains_key(&counterpart) {
                    self.dissolve_edge_from(&counterpart, direction.opposite(), node_id, &product);
                } else {
                    self.force_remove_edge(edge_id);
                }
            }
        }
        self.graph.nodes.remove(node_id);
        self.record_event(PlanEventKind::NodeRemoved {
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Connecting and disconnecting
    // -------------------------------------------------------------------------

    /// Create a bounded transfer between a supplier output slot and a
    /// consumer input slot. The new connection claims the smaller of the two
    /// sides' unclaimed capacity; existing connections are never displaced.
    pub fn connect(
        &mut self,
        supplier_id: &str,
        supplier_output: usize,
        consumer_id: &str,
        consumer_input: usize,
    ) -> Result<EdgeId, FlowError> {
        if supplier_id == consumer_id {
            return Err(FlowError::SelfConnection {
                node_id: supplier_id.to_string(),
            });
        }
        let (product, transfer) = {
            let supplier = self.graph.node(supplier_id).ok_or_else(|| FlowError::NodeNotFound {
                node_id: supplier_id.to_string(),
            })?;
            let consumer = self.graph.node(consumer_id).ok_or_else(|| FlowError::NodeNotFound {
                node_id: consumer_id.to_string(),
            })?;
            let out_slot = supplier
                .slot_at(FlowDirection::Output, supplier_output)
                .ok_or(FlowError::SlotIndexOutOfRange {
                    node_id: supplier_id.to_string(),
                    direction: FlowDirection::Output,
                    index: supplier_output,
                })?;
            let in_slot = consumer
                .slot_at(FlowDirection::Input, consumer_input)
                .ok_or(FlowError::SlotIndexOutOfRange {
                    node_id: consumer_id.to_string(),
                    direction: FlowDirection::Input,
                    index: consumer_input,
                })?;
            if out_slot.product != in_slot.product {
                return Err(FlowError::ProductMismatch {
                    supplier_product: out_slot.product.clone(),
                    consumer_product: in_slot.product.clone(),
                });
            }
            if self
                .graph
                .edge_between(supplier_id, consumer_id, &out_slot.product)
                .is_some()
            {
                return Err(FlowError::AlreadyConnected {
                    supplier: supplier_id.to_string(),
                    consumer: consumer_id.to_string(),
                    product: out_slot.product.clone(),
                });
            }

            let free_supply = capacity::free_capacity(&self.graph, out_slot, supplier.multiplier);
            let free_demand = capacity::free_capacity(&self.graph, in_slot, consumer.multiplier);
            (
                out_slot.product.clone(),
                capacity::max_transfer(free_supply, free_demand).max(0.0),
            )
        };

        let edge_id = self.next_edge_id;
        self.next_edge_id = self.next_edge_id.saturating_add(1);
        self.graph.edges.insert(
            edge_id,
            FlowEdge {
                id: edge_id,
                supplier: supplier_id.to_string(),
                consumer: consumer_id.to_string(),
                product: product.clone(),
                amount: transfer,
            },
        );
        if let Some(slot) = self
            .graph
            .node_mut(supplier_id)
            .and_then(|n| n.slots_mut(FlowDirection::Output).get_mut(supplier_output))
        {
            slot.edges.push(edge_id);
        }
        if let Some(slot) = self
            .graph
            .node_mut(consumer_id)
            .and_then(|n| n.slots_mut(FlowDirection::Input).get_mut(consumer_input))
        {
            slot.edges.push(edge_id);
        }
        self.record_event(PlanEventKind::EdgeCreated {
            edge_id,
            supplier: supplier_id.to_string(),
            consumer: consumer_id.to_string(),
            product,
            amount: transfer,
        });
        Ok(edge_id)
    }

    /// Remove the connection to `counterpart_id` from the node's slot for
    /// `product` and hand its amount to the slot's remaining counterparts.
    /// A connection that does not exist is a no-op, not an error.
    pub fn disconnect(
        &mut self,
        node_id: &str,
        direction: FlowDirection,
        counterpart_id: &str,
        product: &str,
    ) -> Result<(), FlowError> {
        let node = self.graph.node(node_id).ok_or_else(|| FlowError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;
        if node.slot(direction, product).is_none() {
            return Err(FlowError::SlotNotFound {
                node_id: node_id.to_string(),
                direction,
                product: product.to_string(),
            });
        }
        self.dissolve_edge_from(node_id, direction, counterpart_id, product);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rescaling and recomputation
    // -------------------------------------------------------------------------

    /// Change the node's building count and recompute every connection it
    /// holds.
    pub fn rescale(&mut self, node_id: &str, new_multiplier: u32) -> Result<(), FlowError> {
        if new_multiplier == 0 {
            return Err(FlowError::InvalidMultiplier {
                multiplier: new_multiplier,
            });
        }
        let from = self
            .graph
            .node(node_id)
            .map(|n| n.multiplier)
            .ok_or_else(|| FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        self.record_event(PlanEventKind::MultiplierChanged {
            node_id: node_id.to_string(),
            from,
            to: new_multiplier,
        });
        self.recompute_node(node_id, new_multiplier)
    }

    /// Recompute every connection amount on the node under `multiplier`:
    /// greedy water-filling, outputs then inputs, prioritized counterpart
    /// first, then insertion order. Idempotent for a fixed multiplier.
    pub fn recompute_node(&mut self, node_id: &str, multiplier: u32) -> Result<(), FlowError> {
        if multiplier == 0 {
            return Err(FlowError::InvalidMultiplier { multiplier });
        }
        if !self.graph.nodes.contains_key(node_id) {
            return Err(FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        self.apply_recompute(node_id, multiplier);
        self.record_event(PlanEventKind::NodeRecomputed {
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    /// Make `counterpart_id` the first-served connection on the node's slot.
    /// Any previously prioritized counterpart loses the flag; amounts
    /// re-settle immediately.
    pub fn prioritize(
        &mut self,
        node_id: &str,
        direction: FlowDirection,
        product: &str,
        counterpart_id: &str,
    ) -> Result<(), FlowError> {
        {
            let node = self.graph.node(node_id).ok_or_else(|| FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
            if node.slot(direction, product).is_none() {
                return Err(FlowError::SlotNotFound {
                    node_id: node_id.to_string(),
                    direction,
                    product: product.to_string(),
                });
            }
        }
        let (supplier, consumer) = match direction {
            FlowDirection::Output => (node_id, counterpart_id),
            FlowDirection::Input => (counterpart_id, node_id),
        };
        if self.graph.edge_between(supplier, consumer, product).is_none() {
            return Ok(());
        }
        if let Some(slot) = self
            .graph
            .node_mut(node_id)
            .and_then(|n| n.slot_mut(direction, product))
        {
            slot.priority = Some(counterpart_id.to_string());
        }
        self.record_event(PlanEventKind::PriorityChanged {
            node_id: node_id.to_string(),
            direction,
            product: product.to_string(),
            counterpart: counterpart_id.to_string(),
        });
        self.recompute_existing(node_id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tier migration
    // -------------------------------------------------------------------------

    /// Swap the node onto another template, keeping connections whose product
    /// survives in the best-matching recipe and dissolving the rest.
    pub fn change_tier(
        &mut self,
        node_id: &str,
        target_template_id: &str,
    ) -> Result<TierChangeReport, FlowError> {
        if !self.graph.nodes.contains_key(node_id) {
            return Err(FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        let template = self
            .catalog
            .template(target_template_id)
            .cloned()
            .ok_or_else(|| FlowError::TemplateNotFound {
                template_id: target_template_id.to_string(),
            })?;
        let recipe = {
            let node = self.graph.node(node_id).ok_or_else(|| FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
            let index =
                tier::best_recipe_index(node, &template).ok_or_else(|| FlowError::RecipeNotFound {
                    template_id: template.id.clone(),
                    recipe_id: String::new(),
                })?;
            template.recipes[index].clone()
        };
        let from_template = self
            .graph
            .node(node_id)
            .map(|n| n.template_id.clone())
            .unwrap_or_default();

        let cancelled = tier::cancelled_connections(&self.graph, node_id, &recipe);
        for conn in &cancelled {
            if self.graph.nodes.contains_key(&conn.counterpart) {
                self.dissolve_edge_from(
                    &conn.counterpart,
                    conn.direction.opposite(),
                    node_id,
                    &conn.product,
                );
            } else {
                let (supplier, consumer) = match conn.direction {
                    FlowDirection::Input => (conn.counterpart.as_str(), node_id),
                    FlowDirection::Output => (node_id, conn.counterpart.as_str()),
                };
                if let Some(edge_id) = self.graph.edge_between(supplier, consumer, &conn.product) {
                    self.force_remove_edge(edge_id);
                }
            }
        }

        {
            let height = self
                .config
                .layout
                .card_height(recipe.inputs.len().max(recipe.outputs.len()));
            if let Some(node) = self.graph.node_mut(node_id) {
                tier::apply_template(node, &template, &recipe, height);
            }
        }

        let survivors = self.connected_counterparts(node_id);
        self.record_event(PlanEventKind::TierChanged {
            node_id: node_id.to_string(),
            from_template,
            to_template: template.id.clone(),
            recipe_id: recipe.id.clone(),
            cancelled: cancelled.clone(),
        });
        for counterpart in survivors {
            self.recompute_existing(&counterpart);
        }

        Ok(TierChangeReport {
            template_id: template.id,
            recipe_id: recipe.id,
            cancelled,
        })
    }

    /// Migrate the node one tier up, per its template's `next_tier` pointer.
    pub fn increase_tier(&mut self, node_id: &str) -> Result<TierChangeReport, FlowError> {
        let next = self
            .graph
            .node(node_id)
            .map(|n| n.attributes.next_tier.clone())
            .ok_or_else(|| FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        if next.is_empty() {
            return Err(FlowError::TemplateNotFound { template_id: next });
        }
        self.change_tier(node_id, &next)
    }

    /// Migrate the node one tier down, per its template's `previous_tier`
    /// pointer.
    pub fn decrease_tier(&mut self, node_id: &str) -> Result<TierChangeReport, FlowError> {
        let previous = self
            .graph
            .node(node_id)
            .map(|n| n.attributes.previous_tier.clone())
            .ok_or_else(|| FlowError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        if previous.is_empty() {
            return Err(FlowError::TemplateNotFound {
                template_id: previous,
            });
        }
        self.change_tier(node_id, &previous)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn resolve_recipe(
        &self,
        template: &BuildingTemplate,
        recipe_id: Option<&str>,
    ) -> Result<RecipeTemplate, FlowError> {
        let recipe = match recipe_id {
            Some(id) => template.recipe(id),
            None => template.recipes.first(),
        };
        recipe.cloned().ok_or_else(|| FlowError::RecipeNotFound {
            template_id: template.id.clone(),
            recipe_id: recipe_id.unwrap_or_default().to_string(),
        })
    }

    fn instantiate_node(
        &mut self,
        template: &BuildingTemplate,
        recipe: &RecipeTemplate,
        desired: PlanPos,
    ) -> NodeId {
        let width = self.config.layout.card_width;
        let height = self
            .config
            .layout
            .card_height(recipe.inputs.len().max(recipe.outputs.len()));
        let pos = placement::find_free_position(&self.graph, desired, width, height, &self.config.layout);
        let node_id = format!("node-{}", self.next_node_seq);
        self.next_node_seq = self.next_node_seq.saturating_add(1);
        let node = Node::from_template(node_id.clone(), template, recipe, pos, width, height);
        self.graph.nodes.insert(node_id.clone(), node);
        self.record_event(PlanEventKind::NodePlaced {
            node_id: node_id.clone(),
            template_id: template.id.clone(),
            recipe_id: recipe.id.clone(),
            pos,
        });
        node_id
    }

    fn slot_index(
        &self,
        node_id: &str,
        direction: FlowDirection,
        product: &str,
    ) -> Result<usize, FlowError> {
        self.graph
            .node(node_id)
            .and_then(|n| n.slots(direction).iter().position(|s| s.product == product))
            .ok_or_else(|| FlowError::SlotNotFound {
                node_id: node_id.to_string(),
                direction,
                product: product.to_string(),
            })
    }

    /// Every connection bound to one side of a node, snapshotted as
    /// `(product, counterpart, edge)` triples.
    fn bound_connections(
        &self,
        node_id: &str,
        direction: FlowDirection,
    ) -> Vec<(ProductName, NodeId, EdgeId)> {
        let Some(node) = self.graph.node(node_id) else {
            return Vec::new();
        };
        let mut bound = Vec::new();
        for slot in node.slots(direction) {
            for &edge_id in &slot.edges {
                if let Some(counterpart) = self.graph.edges.get(&edge_id).and_then(|e| e.other(node_id))
                {
                    bound.push((slot.product.clone(), counterpart.clone(), edge_id));
                }
            }
        }
        bound
    }

    /// Counterparts the node is still connected to, inputs first, each once.
    fn connected_counterparts(&self, node_id: &str) -> Vec<NodeId> {
        let mut counterparts: Vec<NodeId> = Vec::new();
        for direction in [FlowDirection::Input, FlowDirection::Output] {
            for (_, counterpart, _) in self.bound_connections(node_id, direction) {
                if !counterparts.contains(&counterpart) {
                    counterparts.push(counterpart);
                }
            }
        }
        counterparts
    }

    fn record_event(&mut self, kind: PlanEventKind) -> PlanEvent {
        let event = PlanEvent {
            id: self.next_event_id,
            kind,
        };
        self.next_event_id = self.next_event_id.saturating_add(1);
        self.journal.push(event.clone());
        event
    }

    fn strip_backref(
        &mut self,
        node_id: &str,
        direction: FlowDirection,
        product: &str,
        edge_id: EdgeId,
        counterpart_id: &str,
    ) {
        if let Some(slot) = self
            .graph
            .node_mut(node_id)
            .and_then(|n| n.slot_mut(direction, product))
        {
            slot.remove_edge(edge_id);
            if slot.priority.as_deref() == Some(counterpart_id) {
                slot.priority = None;
            }
        }
    }

    /// Remove the edge between `owner` and `counterpart` as seen from the
    /// owner's slot, redistribute its amount over the slot's remaining
    /// counterparts, and recompute every touched node. Missing edge: no-op.
    fn dissolve_edge_from(
        &mut self,
        owner: &str,
        direction: FlowDirection,
        counterpart: &str,
        product: &str,
    ) {
        let (supplier, consumer) = match direction {
            FlowDirection::Output => (owner, counterpart),
            FlowDirection::Input => (counterpart, owner),
        };
        let Some(edge_id) = self.graph.edge_between(supplier, consumer, product) else {
            return;
        };
        let freed = self
            .graph
            .edges
            .remove(&edge_id)
            .map(|e| e.amount)
            .unwrap_or(0.0);
        self.strip_backref(owner, direction, product, edge_id, counterpart);
        self.strip_backref(counterpart, direction.opposite(), product, edge_id, owner);

        let survivors: Vec<NodeId> = self
            .graph
            .node(owner)
            .and_then(|n| n.slot(direction, product))
            .map(|slot| {
                slot.edges
                    .iter()
                    .filter_map(|id| self.graph.edges.get(id))
                    .filter_map(|e| e.other(owner))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let reabsorbed = self.redistribute(owner, direction, product, freed);
        self.record_event(PlanEventKind::EdgeRemoved {
            edge_id,
            supplier: supplier.to_string(),
            consumer: consumer.to_string(),
            product: product.to_string(),
            freed,
            reabsorbed,
        });

        for counterpart_id in &survivors {
            self.recompute_existing(counterpart_id);
        }
        self.recompute_existing(owner);
    }

    /// Remove an edge whose endpoints can no longer both be rebalanced
    /// (a counterpart already vanished). No redistribution.
    fn force_remove_edge(&mut self, edge_id: EdgeId) {
        let Some(edge) = self.graph.edges.remove(&edge_id) else {
            return;
        };
        self.strip_backref(
            &edge.supplier,
            FlowDirection::Output,
            &edge.product,
            edge_id,
            &edge.consumer,
        );
        self.strip_backref(
            &edge.consumer,
            FlowDirection::Input,
            &edge.product,
            edge_id,
            &edge.supplier,
        );
        self.record_event(PlanEventKind::EdgeRemoved {
            edge_id,
            supplier: edge.supplier,
            consumer: edge.consumer,
            product: edge.product,
            freed: edge.amount,
            reabsorbed: 0.0,
        });
    }

    /// Hand `freed` units to the slot's connections in priority order, each
    /// taking at most its own remaining headroom. Returns how much was
    /// actually absorbed; the rest becomes idle capacity.
    fn redistribute(
        &mut self,
        owner: &str,
        direction: FlowDirection,
        product: &str,
        freed: f64,
    ) -> f64 {
        if freed <= 0.0 {
            return 0.0;
        }
        let ordered = {
            let Some(slot) = self.graph.node(owner).and_then(|n| n.slot(direction, product)) else {
                return 0.0;
            };
            capacity::ordered_edges(&self.graph, owner, slot)
        };
        let mut remaining = freed;
        for edge_id in ordered {
            let delta = {
                let Some(edge) = self.graph.edges.get(&edge_id) else {
                    continue;
                };
                let Some(counterpart_id) = edge.other(owner) else {
                    continue;
                };
                let Some(counterpart) = self.graph.nodes.get(counterpart_id) else {
                    continue;
                };
                let Some(opposite) = counterpart.slot(direction.opposite(), product) else {
                    continue;
                };
                let available = capacity::available_capacity(
                    &self.graph,
                    opposite,
                    counterpart.multiplier,
                    counterpart_id,
                    owner,
                );
                if edge.amount >= available {
                    continue;
                }
                capacity::redistribution_delta(edge.amount, available, remaining)
            };
            if delta <= 0.0 {
                continue;
            }
            if let Some(edge) = self.graph.edges.get_mut(&edge_id) {
                edge.amount += delta;
            }
            remaining -= delta;
            if remaining <= 0.0 {
                break;
            }
        }
        freed - remaining
    }

    /// Recompute a node that may have vanished mid-propagation; missing
    /// nodes are skipped.
    fn recompute_existing(&mut self, node_id: &str) {
        let Some(multiplier) = self.graph.node(node_id).map(|n| n.multiplier) else {
            return;
        };
        self.apply_recompute(node_id, multiplier);
        self.record_event(PlanEventKind::NodeRecomputed {
            node_id: node_id.to_string(),
        });
    }

    fn apply_recompute(&mut self, node_id: &str, multiplier: u32) {
        if let Some(node) = self.graph.node_mut(node_id) {
            node.multiplier = multiplier;
        } else {
            return;
        }
        for direction in [FlowDirection::Output, FlowDirection::Input] {
            let slot_count = self
                .graph
                .node(node_id)
                .map(|n| n.slots(direction).len())
                .unwrap_or(0);
            for index in 0..slot_count {
                self.recompute_slot(node_id, direction, index);
            }
        }
    }

    /// One slot's water-filling pass: hand out `rate * multiplier` to the
    /// slot's connections in priority order, each receiving the smaller of
    /// its counterpart's headroom and what is left, floored at zero.
    fn recompute_slot(&mut self, node_id: &str, direction: FlowDirection, index: usize) {
        let (product, ordered, mut remaining) = {
            let Some(node) = self.graph.node(node_id) else {
                return;
            };
            let Some(slot) = node.slot_at(direction, index) else {
                return;
            };
            (
                slot.product.clone(),
                capacity::ordered_edges(&self.graph, node_id, slot),
                capacity::slot_capacity(slot, node.multiplier),
            )
        };
        for edge_id in ordered {
            let new_amount = {
                let Some(edge) = self.graph.edges.get(&edge_id) else {
                    continue;
                };
                let Some(counterpart_id) = edge.other(node_id) else {
                    continue;
                };
                let Some(counterpart) = self.graph.nodes.get(counterpart_id) else {
                    continue;
                };
                let Some(opposite) = counterpart.slot(direction.opposite(), &product) else {
                    continue;
                };
                let available = capacity::available_capacity(
                    &self.graph,
                    opposite,
                    counterpart.multiplier,
                    counterpart_id,
                    node_id,
                );
                capacity::max_transfer(available, remaining).max(0.0)
            };
            if let Some(edge) = self.graph.edges.get_mut(&edge_id) {
                edge.amount = new_amount;
            }
            remaining -= new_amount;
        }
    }
}
