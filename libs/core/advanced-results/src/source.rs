use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::QueryResult;
use crate::plan::QueryPlan;

/// A collection the query layer can page through.
///
/// Implementations must not mutate the collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Records for one page: match, sort, skip, limit, project, then expand
    /// the plan's relations.
    async fn fetch(&self, plan: &QueryPlan) -> QueryResult<Vec<Document>>;

    /// Number of documents matching `scope` only; client filters are not
    /// applied. An empty scope counts the whole collection.
    async fn count(&self, scope: &Document) -> QueryResult<u64>;
}
