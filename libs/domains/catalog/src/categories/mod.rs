//! Top-level categories with an optional image.

pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use handlers::{ApiDoc, router};
pub use models::{Category, CategoryResponse, CreateCategory, UpdateCategory};
pub use self::mongodb::MongoCategoryRepository;
pub use repository::{CategoryRepository, InMemoryCategoryRepository};
pub use service::CategoryService;
