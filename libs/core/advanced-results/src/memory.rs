//! In-process [`DocumentSource`], evaluating plans the way MongoDB would for
//! the subset of operators the query layer produces.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::QueryResult;
use crate::plan::{is_inclusion, QueryPlan};
use crate::schema::Relation;
use crate::source::DocumentSource;

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentSource {
    documents: Vec<Document>,
    related: HashMap<String, Vec<Document>>,
}

impl MemoryDocumentSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            related: HashMap::new(),
        }
    }

    /// Register the documents a relation's `from` collection resolves to.
    pub fn with_related(mut self, collection: impl Into<String>, documents: Vec<Document>) -> Self {
        self.related.insert(collection.into(), documents);
        self
    }

    fn expand(&self, document: &mut Document, relation: &Relation) {
        let target = document.get(&relation.field).cloned();
        let found = target.and_then(|id| {
            self.related
                .get(&relation.from)?
                .iter()
                .find(|candidate| candidate.get("_id").is_some_and(|cid| values_equal(cid, &id)))
        });

        let expanded = match found {
            Some(found) => match &relation.select {
                Some(fields) => {
                    let mut projection = Document::new();
                    projection.insert("_id", 1);
                    for field in fields {
                        projection.insert(field.clone(), 1);
                    }
                    Bson::Document(project(found, &projection))
                }
                None => Bson::Document(found.clone()),
            },
            None => Bson::Null,
        };
        document.insert(relation.field.clone(), expanded);
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentSource {
    async fn fetch(&self, plan: &QueryPlan) -> QueryResult<Vec<Document>> {
        let filter = plan.match_document();
        let mut matched: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, &filter))
            .collect();

        matched.sort_by(|a, b| compare_by_sort(a, b, &plan.sort));

        let page = matched
            .into_iter()
            .skip(plan.start_index() as usize)
            .take(plan.limit as usize)
            .map(|doc| {
                let mut doc = match &plan.projection {
                    Some(projection) => project(doc, projection),
                    None => doc.clone(),
                };
                for relation in &plan.relations {
                    self.expand(&mut doc, relation);
                }
                doc
            })
            .collect();

        Ok(page)
    }

    async fn count(&self, scope: &Document) -> QueryResult<u64> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, scope))
            .count() as u64)
    }
}

fn project(document: &Document, projection: &Document) -> Document {
    if is_inclusion(projection) {
        document
            .iter()
            .filter(|(key, _)| projection.contains_key(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    } else {
        document
            .iter()
            .filter(|(key, _)| !projection.contains_key(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Top-level match with equality, `$in` and range operators.
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, condition)| matches_condition(document.get(field), condition))
}

fn matches_condition(actual: Option<&Bson>, condition: &Bson) -> bool {
    match condition {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => ops
            .iter()
            .all(|(op, operand)| matches_operator(actual, op, operand)),
        expected => matches_value(actual, |value| values_equal(value, expected)),
    }
}

fn matches_operator(actual: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    let range = |accept: fn(Ordering) -> bool| {
        matches_value(actual, |value| {
            comparable(value, operand)
                .then(|| sort_order(value, operand))
                .is_some_and(accept)
        })
    };

    match op {
        "$gt" => range(|o| o == Ordering::Greater),
        "$gte" => range(|o| o != Ordering::Less),
        "$lt" => range(|o| o == Ordering::Less),
        "$lte" => range(|o| o != Ordering::Greater),
        "$in" => match operand {
            Bson::Array(candidates) => candidates
                .iter()
                .any(|candidate| matches_value(actual, |value| values_equal(value, candidate))),
            _ => false,
        },
        _ => false,
    }
}

/// Applies `test` to a scalar, or to any element of an array value.
/// A missing field behaves like `null`.
fn matches_value(actual: Option<&Bson>, test: impl Fn(&Bson) -> bool) -> bool {
    match actual {
        None => test(&Bson::Null),
        Some(Bson::Array(items)) => items.iter().any(&test) || test(&Bson::Array(items.clone())),
        Some(value) => test(value),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Range operators only compare values of the same type class.
fn comparable(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

/// BSON comparison order across types.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Total order used for sorting and range comparisons.
fn sort_order(a: &Bson, b: &Bson) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn compare_by_sort(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let left = a.get(field).unwrap_or(&Bson::Null);
        let right = b.get(field).unwrap_or(&Bson::Null);
        let ordering = sort_order(left, right);
        let ordering = if matches!(direction, Bson::Int32(-1) | Bson::Int64(-1)) {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
