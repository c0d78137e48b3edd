//! Book and food categories under a top-level category.

pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use handlers::{ApiDoc, nested_router, router};
pub use models::{SubCategory, SubCategoryInput, SubCategoryResponse};
pub use self::mongodb::MongoSubCategoryRepository;
pub use repository::{InMemorySubCategoryRepository, SubCategoryRepository};
pub use service::SubCategoryService;
