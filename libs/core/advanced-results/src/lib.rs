//! # Advanced results
//!
//! Paginated, filterable and sortable reads over a document collection,
//! shared by every list endpoint of the catalog.
//!
//! A request such as
//!
//! ```text
//! GET /api/v2/books?price[gte]=10&select=title,price&sort=-price&page=2&limit=5
//! ```
//!
//! is decoded into [`QueryParams`], resolved against a [`CollectionSchema`]
//! into a [`QueryPlan`], and executed against a [`DocumentSource`]. The
//! result is a [`Page`] rendering as
//!
//! ```json
//! { "success": true, "count": 5, "pagination": { "next": { "page": 3, "limit": 5 } }, "data": [] }
//! ```
//!
//! Pagination cursors are computed against the collection total (filters
//! not applied), while `count` is the size of the returned page.

pub mod error;
pub mod filter;
pub mod json;
pub mod memory;
pub mod mongodb;
pub mod pagination;
pub mod params;
pub mod plan;
pub mod schema;
pub mod source;

pub use error::{QueryError, QueryResult};
pub use memory::MemoryDocumentSource;
pub use self::mongodb::MongoDocumentSource;
pub use pagination::{Cursor, Pagination};
pub use params::{QueryParams, RawFilter};
pub use plan::{QueryDefaults, QueryPlan};
pub use schema::{CollectionSchema, ComputedField, FieldKind, Relation};
pub use source::DocumentSource;

use axum::{
    Json,
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_helpers::AppError;
use ::mongodb::bson::Document;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Page {
    pub success: bool,
    /// Number of records in `data`
    pub count: usize,
    pub pagination: Pagination,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Query executor bound to one collection.
#[derive(Clone)]
pub struct AdvancedResults {
    source: Arc<dyn DocumentSource>,
    schema: Arc<CollectionSchema>,
    defaults: QueryDefaults,
}

impl AdvancedResults {
    pub fn new(source: Arc<dyn DocumentSource>, schema: CollectionSchema) -> Self {
        Self {
            source,
            schema: Arc::new(schema),
            defaults: QueryDefaults::default(),
        }
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Run `params` over the whole collection.
    pub async fn execute(&self, params: &QueryParams) -> QueryResult<Page> {
        self.execute_within(params, Document::new()).await
    }

    /// Run `params` over the documents matching `scope` (e.g. the children
    /// of one parent). The scope also bounds the pagination total.
    #[instrument(skip(self, params, scope), fields(collection = %self.schema.collection))]
    pub async fn execute_within(&self, params: &QueryParams, scope: Document) -> QueryResult<Page> {
        let plan = QueryPlan::build(params, &self.schema, &self.defaults)?.within(scope);

        let (documents, total) =
            tokio::try_join!(self.source.fetch(&plan), self.source.count(&plan.scope))?;

        let data: Vec<serde_json::Value> =
            documents.into_iter().map(|document| self.render(document)).collect();

        tracing::debug!(
            records = data.len(),
            total,
            page = plan.page,
            limit = plan.limit,
            "Advanced results page built"
        );

        Ok(Page {
            success: true,
            count: data.len(),
            pagination: Pagination::compute(plan.page, plan.limit, total),
            data,
        })
    }

    /// First document matching `scope`, with relations expanded and
    /// computed fields applied, as a list page would render it.
    #[instrument(skip(self, scope), fields(collection = %self.schema.collection))]
    pub async fn find_one(&self, scope: Document) -> QueryResult<Option<serde_json::Value>> {
        let mut plan =
            QueryPlan::build(&QueryParams::default(), &self.schema, &self.defaults)?.within(scope);
        plan.page = 1;
        plan.limit = 1;

        let documents = self.source.fetch(&plan).await?;
        Ok(documents.into_iter().next().map(|document| self.render(document)))
    }

    fn render(&self, mut document: Document) -> serde_json::Value {
        for computed in self.schema.computed_fields() {
            if let Some(value) = (computed.compute)(&document) {
                document.insert(computed.name, value);
            }
        }
        json::document_to_json(&document)
    }
}

/// Extractor decoding the raw query string into [`QueryParams`].
#[derive(Debug, Clone, Default)]
pub struct AdvancedQuery(pub QueryParams);

impl<S> FromRequestParts<S> for AdvancedQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(AdvancedQuery(QueryParams::from_pairs(pairs)))
    }
}

/// OpenAPI description of the reserved list parameters. Any other key is a
/// field filter such as `price[gte]=10` or `title=Dune`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Comma-separated fields to return
    pub select: Option<String>,
    /// Comma-separated sort keys, `-` prefix for descending (default `-createdAt`)
    pub sort: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default 15)
    pub limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::mongodb::bson::{Bson, DateTime, doc, oid::ObjectId};
    use axum::{Router, body::Body, http::Request, routing::get};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use crate::source::MockDocumentSource;
    use tower::ServiceExt;

    fn books_schema() -> CollectionSchema {
        CollectionSchema::new("books")
            .field("price", FieldKind::Number)
            .field("instock", FieldKind::Number)
            .field("category", FieldKind::ObjectId)
            .computed("vatPrice", |doc| {
                let price = doc.get("price").and_then(Bson::as_f64)?;
                Some(Bson::String(format!("{:.2}", price * 1.7)))
            })
    }

    /// `count` books with prices 1..=count, created one second apart.
    fn books(count: i64) -> Vec<Document> {
        (1..=count)
            .map(|i| {
                doc! {
                    "_id": ObjectId::new(),
                    "title": format!("Book {i}"),
                    "price": i as f64,
                    "instock": i % 3,
                    "createdAt": DateTime::from_millis(1_700_000_000_000 + i * 1000),
                }
            })
            .collect()
    }

    fn results(documents: Vec<Document>) -> AdvancedResults {
        AdvancedResults::new(Arc::new(MemoryDocumentSource::new(documents)), books_schema())
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(pairs.iter().copied())
    }

    fn titles(page: &Page) -> Vec<String> {
        page.data
            .iter()
            .map(|record| record["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_middle_page_of_twenty() {
        let page = results(books(20))
            .execute(&params(&[("limit", "5"), ("page", "2")]))
            .await
            .unwrap();

        assert_eq!(page.count, 5);
        assert_eq!(page.pagination.next, Some(Cursor { page: 3, limit: 5 }));
        assert_eq!(page.pagination.prev, Some(Cursor { page: 1, limit: 5 }));
        // newest first: page 2 holds books 15..=11
        assert_eq!(
            titles(&page),
            vec!["Book 15", "Book 14", "Book 13", "Book 12", "Book 11"]
        );
    }

    #[tokio::test]
    async fn test_small_collection_without_params() {
        let page = results(books(3)).execute(&QueryParams::default()).await.unwrap();

        assert_eq!(page.count, 3);
        assert_eq!(page.pagination, Pagination::default());
        assert_eq!(titles(&page), vec!["Book 3", "Book 2", "Book 1"]);
    }

    /// Computed fields are derived after the fetch and ignore `select`.
    #[tokio::test]
    async fn test_select_limits_fields() {
        let page = results(books(2))
            .execute(&params(&[("select", "title,price")]))
            .await
            .unwrap();

        for record in &page.data {
            let mut keys: Vec<_> = record.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["_id", "price", "title", "vatPrice"]);
        }
    }

    #[tokio::test]
    async fn test_select_returns_only_selected_fields_and_id() {
        let schema = CollectionSchema::new("books").field("price", FieldKind::Number);
        let executor = AdvancedResults::new(Arc::new(MemoryDocumentSource::new(books(3))), schema);

        let page = executor
            .execute(&params(&[("select", "title,price")]))
            .await
            .unwrap();

        assert_eq!(page.count, 3);
        for record in &page.data {
            let mut keys: Vec<_> = record.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["_id", "price", "title"]);
        }
    }

    #[tokio::test]
    async fn test_sort_by_price_descending() {
        let page = results(books(6))
            .execute(&params(&[("sort", "-price"), ("limit", "3")]))
            .await
            .unwrap();

        let prices: Vec<f64> = page.data.iter().map(|r| r["price"].as_f64().unwrap()).collect();
        assert_eq!(prices, vec![6.0, 5.0, 4.0]);
    }

    #[tokio::test]
    async fn test_filters_restrict_records_but_not_cursor_total() {
        let page = results(books(20))
            .execute(&params(&[("price[gte]", "18"), ("limit", "5")]))
            .await
            .unwrap();

        assert_eq!(page.count, 3);
        // total is the unfiltered 20, so a next page is still advertised
        assert_eq!(page.pagination.next, Some(Cursor { page: 2, limit: 5 }));
    }

    #[tokio::test]
    async fn test_records_are_the_expected_slice() {
        let all = results(books(12))
            .execute(&params(&[("sort", "price"), ("limit", "100")]))
            .await
            .unwrap();
        let page = results(books(12))
            .execute(&params(&[("sort", "price"), ("limit", "4"), ("page", "3")]))
            .await
            .unwrap();

        let expected: Vec<_> = all.data[8..12].iter().map(|r| r["title"].clone()).collect();
        let actual: Vec<_> = page.data.iter().map(|r| r["title"].clone()).collect();
        assert_eq!(actual, expected);
        assert!(page.data.len() <= 4);
    }

    #[tokio::test]
    async fn test_repeated_execution_is_identical() {
        let executor = results(books(9));
        let query = params(&[("instock[in]", "1,2"), ("sort", "-instock,title")]);

        let first = executor.execute(&query).await.unwrap();
        let second = executor.execute(&query).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let page = results(vec![]).execute(&QueryParams::default()).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination, Pagination::default());
    }

    #[tokio::test]
    async fn test_computed_field_is_rendered() {
        let page = results(books(1)).execute(&QueryParams::default()).await.unwrap();
        assert_eq!(page.data[0]["vatPrice"], json!("1.70"));
    }

    #[tokio::test]
    async fn test_scope_bounds_records_and_total() {
        let parent = ObjectId::new();
        let mut documents = books(10);
        for document in documents.iter_mut().take(4) {
            document.insert("category", parent);
        }

        let page = results(documents)
            .execute_within(&params(&[("limit", "3")]), doc! { "category": parent })
            .await
            .unwrap();

        assert_eq!(page.count, 3);
        assert_eq!(page.pagination.next, Some(Cursor { page: 2, limit: 3 }));
    }

    #[tokio::test]
    async fn test_one_fetch_and_one_count_per_call() {
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(vec![doc! { "title": "Dune" }]));
        source.expect_count().times(1).returning(|_| Ok(40));

        let executor = AdvancedResults::new(Arc::new(source), books_schema());
        let page = executor
            .execute(&params(&[("limit", "10"), ("page", "4")]))
            .await
            .unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.pagination.next, None);
        assert_eq!(page.pagination.prev, Some(Cursor { page: 3, limit: 10 }));
    }

    #[tokio::test]
    async fn test_find_one_skips_count_and_renders() {
        let id = ObjectId::new();
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .withf(move |plan| plan.limit == 1 && plan.scope == doc! { "_id": id })
            .times(1)
            .returning(move |_| Ok(vec![doc! { "_id": id, "price": 10.0 }]));
        source.expect_count().never();

        let executor = AdvancedResults::new(Arc::new(source), books_schema());
        let found = executor.find_one(doc! { "_id": id }).await.unwrap().unwrap();

        assert_eq!(found["_id"], id.to_hex());
        assert_eq!(found["vatPrice"], "17.00");
    }

    #[tokio::test]
    async fn test_find_one_missing() {
        let executor = results(books(3));
        let found = executor.find_one(doc! { "_id": ObjectId::new() }).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_bad_filter_fails_before_touching_storage() {
        let mut source = MockDocumentSource::new();
        source.expect_fetch().never();
        source.expect_count().never();

        let executor = AdvancedResults::new(Arc::new(source), books_schema());
        let err = executor
            .execute(&params(&[("category", "nope")]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Cast { .. }));
    }

    #[tokio::test]
    async fn test_list_endpoint_body_shape() {
        let executor = Arc::new(results(books(2)));
        let app = Router::new().route(
            "/books",
            get(move |AdvancedQuery(params): AdvancedQuery| {
                let executor = executor.clone();
                async move { executor.execute(&params).await }
            }),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/books?price%5Bgte%5D=2&select=title")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["count"], json!(1));
        assert_eq!(json["pagination"], json!({}));
        assert_eq!(json["data"][0]["title"], json!("Book 2"));
    }

    #[tokio::test]
    async fn test_cast_failure_renders_not_found() {
        let executor = Arc::new(results(books(2)));
        let app = Router::new().route(
            "/books",
            get(move |AdvancedQuery(params): AdvancedQuery| {
                let executor = executor.clone();
                async move { executor.execute(&params).await }
            }),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/books?price=cheap")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
