//! API routes module
//!
//! Builds every domain service over the shared MongoDB database and mounts
//! their routers under `/v2`.

pub mod catalog;
pub mod users;
pub mod welcome;

use advanced_results::{AdvancedResults, CollectionSchema, MongoDocumentSource};
use axum::Router;
use mongodb::Database;
use std::sync::Arc;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let (users, auth) = users::routes(state);
    Router::new().nest("/v2", users.merge(catalog::routes(state, &auth)))
}

/// Indexes for every collection the API writes to.
pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    users::init_indexes(db).await?;
    catalog::init_indexes(db).await?;
    Ok(())
}

/// Listing executor reading the schema's collection.
pub(crate) fn listing(db: &Database, schema: CollectionSchema) -> AdvancedResults {
    let source = MongoDocumentSource::new(db, &schema.collection);
    AdvancedResults::new(Arc::new(source), schema)
}
