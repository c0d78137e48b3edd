//! Catalog Domain
//!
//! Categories, their book and food sub-categories, and the products filed
//! under them.
//!
//! ```text
//! Category ──┬── BookCategory ── Book
//!            └── FoodCategory ── Food
//! ```
//!
//! Each level follows the same layering: handlers over a service generic
//! over its repository trait, with MongoDB and in-memory implementations.
//! Lists go through [`advanced_results`]; single products are rendered by
//! it too so the expanded relations and `vatPrice` match the list output.
//!
//! Book and food lines share all code and differ only by [`SubCategoryKind`]
//! and [`ProductKind`].

pub mod categories;
pub mod error;
pub mod kind;
pub mod memory;
pub mod payload;
pub mod products;
pub mod sub_categories;

#[cfg(test)]
mod testing;

pub use categories::{CategoryService, InMemoryCategoryRepository, MongoCategoryRepository};
pub use error::{CatalogError, CatalogResult};
pub use kind::{ProductKind, SubCategoryKind};
pub use products::{InMemoryProductRepository, MongoProductRepository, ProductService};
pub use sub_categories::{
    InMemorySubCategoryRepository, MongoSubCategoryRepository, SubCategoryService,
};
