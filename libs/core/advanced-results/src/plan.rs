//! Resolution of a request into a concrete, storage-agnostic query plan.

use mongodb::bson::{Bson, Document};

use crate::error::QueryResult;
use crate::filter::build_filter;
use crate::params::{parse_leading_int, QueryParams};
use crate::schema::{CollectionSchema, Relation};

/// Values used when a request leaves a control parameter out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub select: Option<Vec<String>>,
    pub sort: String,
    pub page: u64,
    pub limit: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            select: None,
            sort: "-createdAt".to_string(),
            page: 1,
            limit: 15,
        }
    }
}

/// Everything a [`DocumentSource`](crate::DocumentSource) needs to run one
/// page read.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: Document,
    /// Fields added on top of `filter` by the caller (e.g. a parent id)
    pub scope: Document,
    /// Inclusion (`field: 1`) or exclusion (`field: 0`) projection
    pub projection: Option<Document>,
    pub sort: Document,
    pub page: u64,
    pub limit: u64,
    pub relations: Vec<Relation>,
}

impl QueryPlan {
    pub fn build(
        params: &QueryParams,
        schema: &CollectionSchema,
        defaults: &QueryDefaults,
    ) -> QueryResult<Self> {
        let filter = build_filter(&params.filters, schema)?;

        let select = params
            .select
            .as_deref()
            .map(split_fields)
            .filter(|fields| !fields.is_empty())
            .or_else(|| defaults.select.clone());
        let projection = projection(select.as_deref(), schema);

        let sort = params
            .sort
            .as_deref()
            .map(|raw| parse_sort(raw, schema))
            .filter(|sort| !sort.is_empty())
            .unwrap_or_else(|| parse_sort(&defaults.sort, schema));

        let page = positive_or(params.page.as_deref(), defaults.page);
        let limit = positive_or(params.limit.as_deref(), defaults.limit);

        let relations = schema
            .relations()
            .iter()
            .filter(|relation| keeps_field(projection.as_ref(), &relation.field))
            .cloned()
            .collect();

        Ok(Self {
            filter,
            scope: Document::new(),
            projection,
            sort,
            page,
            limit,
            relations,
        })
    }

    /// Restrict the plan to documents matching `scope` as well.
    pub fn within(mut self, scope: Document) -> Self {
        self.scope = scope;
        self
    }

    /// `filter` and `scope` combined; scope keys take precedence.
    pub fn match_document(&self) -> Document {
        let mut combined = self.filter.clone();
        for (key, value) in &self.scope {
            combined.insert(key.clone(), value.clone());
        }
        combined
    }

    /// Index of the first record on this page.
    pub fn start_index(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// One past the last index this page may cover.
    pub fn last_index(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(parse_leading_int)
        .filter(|n| *n > 0)
        .map(|n| n as u64)
        .unwrap_or(default)
}

fn split_fields(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.starts_with('$'))
        .map(str::to_string)
        .collect()
}

/// `-price,title` -> `{ price: -1, title: 1, _id: 1 }`.
///
/// `_id` is appended as a tiebreaker so equal keys page deterministically.
/// Hidden fields are skipped.
pub fn parse_sort(raw: &str, schema: &CollectionSchema) -> Document {
    let mut sort = Document::new();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (field, direction) = match token.strip_prefix('-') {
            Some(field) => (field, -1),
            None => (token.strip_prefix('+').unwrap_or(token), 1),
        };
        let field = field.trim();
        if field.is_empty()
            || field.starts_with('$')
            || schema.is_hidden(field)
            || sort.contains_key(field)
        {
            continue;
        }
        sort.insert(field, Bson::Int32(direction));
    }

    if !sort.is_empty() && !sort.contains_key("_id") {
        sort.insert("_id", Bson::Int32(1));
    }
    sort
}

fn projection(select: Option<&[String]>, schema: &CollectionSchema) -> Option<Document> {
    match select {
        Some(fields) => {
            let mut projection = Document::new();
            projection.insert("_id", Bson::Int32(1));
            for field in fields {
                if !schema.is_hidden(field) {
                    projection.insert(field.clone(), Bson::Int32(1));
                }
            }
            Some(projection)
        }
        None if schema.hidden_fields().is_empty() => None,
        None => Some(
            schema
                .hidden_fields()
                .iter()
                .map(|field| (field.clone(), Bson::Int32(0)))
                .collect(),
        ),
    }
}

/// Whether `field` survives `projection`.
pub fn keeps_field(projection: Option<&Document>, field: &str) -> bool {
    match projection {
        None => true,
        Some(projection) if is_inclusion(projection) => projection.contains_key(field),
        Some(projection) => !projection.contains_key(field),
    }
}

/// Inclusion projections mark fields with 1; exclusions with 0.
pub fn is_inclusion(projection: &Document) -> bool {
    projection
        .iter()
        .filter(|(key, _)| key.as_str() != "_id")
        .any(|(_, value)| matches!(value, Bson::Int32(1)))
        || projection.keys().all(|key| key == "_id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use mongodb::bson::doc;

    fn users() -> CollectionSchema {
        CollectionSchema::new("users")
            .field("age", FieldKind::Number)
            .hidden("password")
    }

    fn books() -> CollectionSchema {
        CollectionSchema::new("books")
            .field("price", FieldKind::Number)
            .relation(Relation::new("category", "bookcategories"))
            .relation(Relation::new("user", "users").select(["name", "email"]))
    }

    fn plan(pairs: &[(&str, &str)], schema: &CollectionSchema) -> QueryPlan {
        let params = QueryParams::from_pairs(pairs.iter().copied());
        QueryPlan::build(&params, schema, &QueryDefaults::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let plan = plan(&[], &books());
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, 15);
        assert_eq!(plan.sort, doc! { "createdAt": -1, "_id": 1 });
        assert_eq!(plan.projection, None);
        assert_eq!(plan.relations.len(), 2);
        assert_eq!(plan.start_index(), 0);
        assert_eq!(plan.last_index(), 15);
    }

    #[test]
    fn test_non_positive_or_garbage_paging_falls_back() {
        for (page, limit) in [("0", "-3"), ("abc", ""), ("-1", "0")] {
            let plan = plan(&[("page", page), ("limit", limit)], &books());
            assert_eq!((plan.page, plan.limit), (1, 15));
        }
        let plan = plan(&[("page", "2x"), ("limit", "5")], &books());
        assert_eq!((plan.page, plan.limit), (2, 5));
        assert_eq!(plan.start_index(), 5);
        assert_eq!(plan.last_index(), 10);
    }

    #[test]
    fn test_sort_multiple_keys_in_priority_order() {
        let sort = parse_sort("-price, +title,price", &books());
        let keys: Vec<_> = sort.keys().cloned().collect();
        assert_eq!(keys, vec!["price", "title", "_id"]);
        assert_eq!(sort, doc! { "price": -1, "title": 1, "_id": 1 });
    }

    #[test]
    fn test_blank_sort_uses_default() {
        let plan = plan(&[("sort", " , ")], &books());
        assert_eq!(plan.sort, doc! { "createdAt": -1, "_id": 1 });
    }

    #[test]
    fn test_select_projection_keeps_id() {
        let plan = plan(&[("select", "title,price")], &books());
        assert_eq!(plan.projection, Some(doc! { "_id": 1, "title": 1, "price": 1 }));
    }

    #[test]
    fn test_select_drops_relations_not_selected() {
        let plan = plan(&[("select", "title,user")], &books());
        let fields: Vec<_> = plan.relations.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["user"]);
    }

    #[test]
    fn test_hidden_fields_never_projected() {
        let plan_default = plan(&[], &users());
        assert_eq!(plan_default.projection, Some(doc! { "password": 0 }));

        let plan_selected = plan(&[("select", "name,password")], &users());
        assert_eq!(plan_selected.projection, Some(doc! { "_id": 1, "name": 1 }));
    }

    #[test]
    fn test_hidden_fields_cannot_sort() {
        let mixed = plan(&[("sort", "password,-age")], &users());
        assert_eq!(mixed.sort, doc! { "age": -1, "_id": 1 });

        let only_hidden = plan(&[("sort", "-password")], &users());
        assert_eq!(only_hidden.sort, doc! { "createdAt": -1, "_id": 1 });
    }

    #[test]
    fn test_hidden_fields_cannot_filter() {
        let filtered = plan(
            &[("password[gte]", "$argon2id$M"), ("password", "x"), ("age", "3")],
            &users(),
        );
        assert_eq!(filtered.filter, doc! { "age": 3_i64 });
    }

    #[test]
    fn test_scope_overrides_filter() {
        let plan = plan(&[("category", "a"), ("title", "Dune")], &books())
            .within(doc! { "category": "b" });
        assert_eq!(plan.match_document(), doc! { "category": "b", "title": "Dune" });
    }

    #[test]
    fn test_keeps_field() {
        let inclusion = doc! { "_id": 1, "title": 1 };
        let exclusion = doc! { "password": 0 };
        assert!(keeps_field(Some(&inclusion), "title"));
        assert!(!keeps_field(Some(&inclusion), "price"));
        assert!(keeps_field(Some(&exclusion), "price"));
        assert!(!keeps_field(Some(&exclusion), "password"));
        assert!(keeps_field(None, "anything"));
    }
}
