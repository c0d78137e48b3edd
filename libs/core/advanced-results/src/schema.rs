//! Per-collection description used to cast filters and shape output.

use mongodb::bson::{Bson, Document};
use std::collections::HashMap;

/// Hard cap on relation expansions per collection.
pub const MAX_RELATIONS: usize = 2;

/// Storage type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    ObjectId,
    DateTime,
}

/// A reference field replaced by the document it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Local field holding the referenced `_id`
    pub field: String,
    /// Collection the reference points into
    pub from: String,
    /// Fields kept on the expanded document; `None` keeps everything
    pub select: Option<Vec<String>>,
}

impl Relation {
    pub fn new(field: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            from: from.into(),
            select: None,
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Output-only field derived from the stored document.
#[derive(Clone, Copy)]
pub struct ComputedField {
    pub name: &'static str,
    pub compute: fn(&Document) -> Option<Bson>,
}

impl std::fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedField")
            .field("name", &self.name)
            .finish()
    }
}

/// What the query layer knows about one collection.
///
/// ```
/// use advanced_results::{CollectionSchema, FieldKind, Relation};
///
/// let books = CollectionSchema::new("books")
///     .field("price", FieldKind::Number)
///     .field("category", FieldKind::ObjectId)
///     .relation(Relation::new("category", "bookcategories").select(["title", "description"]));
/// assert_eq!(books.kind_of("price"), FieldKind::Number);
/// ```
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub collection: String,
    fields: HashMap<String, FieldKind>,
    hidden: Vec<String>,
    relations: Vec<Relation>,
    computed: Vec<ComputedField>,
}

impl CollectionSchema {
    /// `_id`, `createdAt` and `updatedAt` are declared implicitly.
    pub fn new(collection: impl Into<String>) -> Self {
        let fields = HashMap::from([
            ("_id".to_string(), FieldKind::ObjectId),
            ("createdAt".to_string(), FieldKind::DateTime),
            ("updatedAt".to_string(), FieldKind::DateTime),
        ]);

        Self {
            collection: collection.into(),
            fields,
            hidden: Vec::new(),
            relations: Vec::new(),
            computed: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Never returned, even when explicitly selected.
    pub fn hidden(mut self, name: impl Into<String>) -> Self {
        self.hidden.push(name.into());
        self
    }

    /// # Panics
    /// Panics when more than [`MAX_RELATIONS`] relations are configured.
    pub fn relation(mut self, relation: Relation) -> Self {
        assert!(
            self.relations.len() < MAX_RELATIONS,
            "at most {MAX_RELATIONS} relations per collection"
        );
        self.relations.push(relation);
        self
    }

    pub fn computed(mut self, name: &'static str, compute: fn(&Document) -> Option<Bson>) -> Self {
        self.computed.push(ComputedField { name, compute });
        self
    }

    /// Undeclared fields are treated as text.
    pub fn kind_of(&self, field: &str) -> FieldKind {
        self.fields.get(field).copied().unwrap_or(FieldKind::Text)
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.iter().any(|h| h == field)
    }

    pub fn hidden_fields(&self) -> &[String] {
        &self.hidden
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn computed_fields(&self) -> &[ComputedField] {
        &self.computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_fields() {
        let schema = CollectionSchema::new("categories");
        assert_eq!(schema.kind_of("_id"), FieldKind::ObjectId);
        assert_eq!(schema.kind_of("createdAt"), FieldKind::DateTime);
        assert_eq!(schema.kind_of("title"), FieldKind::Text);
    }

    #[test]
    fn test_hidden_fields() {
        let schema = CollectionSchema::new("users").hidden("password");
        assert!(schema.is_hidden("password"));
        assert!(!schema.is_hidden("email"));
    }

    #[test]
    #[should_panic(expected = "at most 2 relations")]
    fn test_third_relation_is_rejected() {
        CollectionSchema::new("books")
            .relation(Relation::new("category", "bookcategories"))
            .relation(Relation::new("user", "users"))
            .relation(Relation::new("publisher", "users"));
    }
}
