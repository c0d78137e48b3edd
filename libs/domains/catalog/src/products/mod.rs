//! Books and foods, each filed under a sub-category and owned by a publisher.

pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use handlers::{ApiDoc, nested_router, router};
pub use models::{Product, ProductInput, ProductResponse, vat_price};
pub use self::mongodb::MongoProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
