//! The catalog store and its lookup/search operations.

use serde::{Deserialize, Serialize};

use crate::types::{BuildingTemplate, Product};

/// Maximum hits returned by [`Catalog::search_products`] unless the caller
/// asks for fewer.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Products that exist as bookkeeping quantities, not as connectable goods.
const VIRTUAL_PRODUCTS: [&str; 2] = ["Computing", "Unity"];

/// Read-only store of products and building templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub buildings: Vec<BuildingTemplate>,
}

/// Templates related to one product, narrowed to the matching recipe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelatedTemplates {
    /// Buildings with a recipe consuming the product.
    pub consumers: Vec<BuildingTemplate>,
    /// Buildings with a recipe producing the product.
    pub producers: Vec<BuildingTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Serde(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serde(err.to_string())
    }
}

impl Catalog {
    pub fn new(products: Vec<Product>, buildings: Vec<BuildingTemplate>) -> Self {
        Self {
            products,
            buildings,
        }
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn template(&self, id: &str) -> Option<&BuildingTemplate> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Case-insensitive prefix search over connectable products.
    pub fn search_products(&self, input: &str, limit: usize) -> Vec<&Product> {
        let needle = input.to_lowercase();
        self.products
            .iter()
            .filter(|p| !VIRTUAL_PRODUCTS.contains(&p.name.as_str()))
            .filter(|p| p.name.to_lowercase().starts_with(&needle))
            .take(limit)
            .collect()
    }

    /// Every (building, recipe) pair that consumes or produces `product_name`.
    ///
    /// Each hit is returned as a template narrowed to the one matching recipe,
    /// so a building with three matching recipe variants yields three entries.
    pub fn related_templates(&self, product_name: &str) -> RelatedTemplates {
        let mut related = RelatedTemplates::default();
        for building in &self.buildings {
            for recipe in &building.recipes {
                if recipe.inputs.iter().any(|io| io.name == product_name) {
                    let mut narrowed = building.clone();
                    narrowed.recipes = vec![recipe.clone()];
                    related.consumers.push(narrowed);
                }
                if recipe.outputs.iter().any(|io| io.name == product_name) {
                    let mut narrowed = building.clone();
                    narrowed.recipes = vec![recipe.clone()];
                    related.producers.push(narrowed);
                }
            }
        }
        related
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(input)?)
    }
}
