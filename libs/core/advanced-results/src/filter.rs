//! Translation of decoded filters into a MongoDB match document.
//!
//! Only the keys of a field's operator object are rewritten (`gte` becomes
//! `$gte`). Field names and values are never touched, so a title of `"in"`
//! stays a title of `"in"`.

use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};

use crate::error::{QueryError, QueryResult};
use crate::params::RawFilter;
use crate::schema::{CollectionSchema, FieldKind};

/// Operators a client may use inside `field[op]`.
pub const OPERATORS: [&str; 5] = ["gt", "gte", "lt", "lte", "in"];

/// Build the `$match` document for `filters`.
///
/// Filters on hidden fields are dropped, so stored secrets cannot narrow a
/// page.
pub fn build_filter<'a, I>(filters: I, schema: &CollectionSchema) -> QueryResult<Document>
where
    I: IntoIterator<Item = (&'a String, &'a RawFilter)>,
{
    let mut document = Document::new();

    for (field, raw) in filters {
        if schema.is_hidden(field) {
            tracing::debug!(field = %field, "Dropping filter on hidden field");
            continue;
        }
        let kind = schema.kind_of(field);
        let condition = match raw {
            RawFilter::Scalar(value) => cast(field, value, kind)?,
            RawFilter::List(values) => Bson::Document(doc! { "$in": cast_all(field, values, kind)? }),
            RawFilter::Operators(ops) => {
                let mut condition = Document::new();
                for (op, operand) in ops {
                    if !OPERATORS.contains(&op.as_str()) {
                        return Err(QueryError::UnknownOperator {
                            field: field.clone(),
                            operator: op.clone(),
                        });
                    }
                    condition.insert(format!("${op}"), cast_operand(field, op, operand, kind)?);
                }
                Bson::Document(condition)
            }
        };
        document.insert(field.clone(), condition);
    }

    Ok(document)
}

fn cast_operand(field: &str, op: &str, operand: &RawFilter, kind: FieldKind) -> QueryResult<Bson> {
    match (op, operand) {
        ("in", RawFilter::List(values)) => cast_all(field, values, kind),
        ("in", RawFilter::Scalar(value)) => cast_all(field, std::slice::from_ref(value), kind),
        (_, RawFilter::Scalar(value)) => cast(field, value, kind),
        // `price[gt]=1&price[gt]=2`: ambiguous bound
        (_, other) => Err(QueryError::Cast {
            field: field.to_string(),
            value: format!("{other:?}"),
            kind,
        }),
    }
}

fn cast_all(field: &str, values: &[String], kind: FieldKind) -> QueryResult<Bson> {
    values
        .iter()
        .map(|v| cast(field, v, kind))
        .collect::<QueryResult<Vec<_>>>()
        .map(Bson::Array)
}

/// Cast one wire value to the field's storage type.
pub fn cast(field: &str, value: &str, kind: FieldKind) -> QueryResult<Bson> {
    let failed = || QueryError::Cast {
        field: field.to_string(),
        value: value.to_string(),
        kind,
    };
    let trimmed = value.trim();

    match kind {
        FieldKind::Text => Ok(Bson::String(value.to_string())),
        FieldKind::Number => {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Bson::Int64(n));
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Bson::Double(n)),
                _ => Err(failed()),
            }
        }
        FieldKind::ObjectId => ObjectId::parse_str(trimmed)
            .map(Bson::ObjectId)
            .map_err(|_| failed()),
        FieldKind::DateTime => parse_datetime(trimmed)
            .map(Bson::DateTime)
            .ok_or_else(failed),
    }
}

/// RFC 3339 timestamps, bare `YYYY-MM-DD` dates, or epoch milliseconds.
fn parse_datetime(value: &str) -> Option<DateTime> {
    if let Ok(dt) = DateTime::parse_rfc3339_str(value) {
        return Some(dt);
    }
    if value.len() == 10 && value.as_bytes().get(4) == Some(&b'-') {
        return DateTime::parse_rfc3339_str(format!("{value}T00:00:00Z")).ok();
    }
    value.parse::<i64>().ok().map(DateTime::from_millis)
}
