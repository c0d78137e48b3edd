//! MongoDB-backed [`DocumentSource`] built on the aggregation pipeline.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Collection, Database,
};
use tracing::instrument;

use crate::error::QueryResult;
use crate::plan::QueryPlan;
use crate::schema::Relation;
use crate::source::DocumentSource;

pub struct MongoDocumentSource {
    collection: Collection<Document>,
}

impl MongoDocumentSource {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Document>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }
}

#[async_trait]
impl DocumentSource for MongoDocumentSource {
    #[instrument(skip(self, plan), fields(collection = %self.collection.name(), page = plan.page, limit = plan.limit))]
    async fn fetch(&self, plan: &QueryPlan) -> QueryResult<Vec<Document>> {
        let cursor = self.collection.aggregate(pipeline(plan)).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn count(&self, scope: &Document) -> QueryResult<u64> {
        let count = self.collection.count_documents(scope.clone()).await?;
        Ok(count)
    }
}

/// `$match`, `$sort`, `$skip`, `$limit`, optional `$project`, then one
/// lookup per relation.
pub fn pipeline(plan: &QueryPlan) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": plan.match_document() }];

    if !plan.sort.is_empty() {
        stages.push(doc! { "$sort": plan.sort.clone() });
    }
    stages.push(doc! { "$skip": to_i64(plan.start_index()) });
    stages.push(doc! { "$limit": to_i64(plan.limit) });

    if let Some(projection) = &plan.projection {
        stages.push(doc! { "$project": projection.clone() });
    }

    for relation in &plan.relations {
        stages.extend(lookup_stages(relation));
    }

    stages
}

/// Replaces `relation.field` with the referenced document, or `null` when
/// the reference dangles.
fn lookup_stages(relation: &Relation) -> [Document; 2] {
    let mut inner = vec![doc! { "$match": { "$expr": { "$eq": ["$_id", "$$ref"] } } }];
    if let Some(fields) = &relation.select {
        let mut projection = doc! { "_id": 1 };
        for field in fields {
            projection.insert(field.clone(), 1);
        }
        inner.push(doc! { "$project": projection });
    }

    let local = format!("${}", relation.field);
    let mut set = Document::new();
    set.insert(
        relation.field.clone(),
        doc! { "$ifNull": [{ "$arrayElemAt": [local.clone(), 0] }, Bson::Null] },
    );

    [
        doc! {
            "$lookup": {
                "from": relation.from.clone(),
                "let": { "ref": local },
                "pipeline": inner,
                "as": relation.field.clone(),
            }
        },
        doc! { "$set": set },
    ]
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
