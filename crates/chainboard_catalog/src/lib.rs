//! Read-only catalog of products and building templates.
//!
//! The planner treats this crate as a lookup service: product metadata,
//! building templates with their recipe variants, and the search helpers the
//! UI layer builds its pickers from. Nothing in here mutates.

mod catalog;
mod types;

pub use catalog::{Catalog, CatalogError, RelatedTemplates, DEFAULT_SEARCH_LIMIT};
pub use types::{BuildCost, BuildingTemplate, Product, RecipeIo, RecipeTemplate};
