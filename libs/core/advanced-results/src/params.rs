//! Decoding of list-endpoint query strings.

use std::collections::BTreeMap;
use tracing::debug;

/// Keys that steer the query instead of filtering it.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// A filter value as it arrived on the wire, before type casting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFilter {
    /// `?title=Dune`
    Scalar(String),
    /// `?title=Dune&title=Emma`
    List(Vec<String>),
    /// `?price[gte]=10&price[lt]=50`, keyed by operator name
    Operators(BTreeMap<String, RawFilter>),
}

impl RawFilter {
    fn push(&mut self, value: String) {
        match self {
            RawFilter::Scalar(existing) => {
                let first = std::mem::take(existing);
                *self = RawFilter::List(vec![first, value]);
            }
            RawFilter::List(values) => values.push(value),
            RawFilter::Operators(_) => {}
        }
    }
}

/// Client query, split into control parameters and filters.
///
/// Control values are kept verbatim; defaults are applied when the plan is
/// built so a request and its defaults stay separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub select: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub filters: BTreeMap<String, RawFilter>,
}

impl QueryParams {
    /// Decode `key=value` pairs, as produced by a URL query string.
    ///
    /// - `field[op]=v` nests under `field` with operator `op`
    /// - repeated plain keys collect into a list
    /// - `field[in]=a,b` splits on commas
    /// - keys starting with `$` or containing `.` are dropped
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = QueryParams::default();

        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.into();

            match key {
                "select" => params.select = Some(value),
                "sort" => params.sort = Some(value),
                "page" => params.page = Some(value),
                "limit" => params.limit = Some(value),
                _ => params.add_filter(key, value),
            }
        }

        params
    }

    fn add_filter(&mut self, key: &str, value: String) {
        let (field, operator) = split_key(key);

        if !is_safe_key(field) || operator.is_some_and(|op| !is_safe_key(op)) {
            debug!(key, "Dropping unsafe query key");
            return;
        }

        match operator {
            None => match self.filters.get_mut(field) {
                Some(existing) => existing.push(value),
                None => {
                    self.filters
                        .insert(field.to_string(), RawFilter::Scalar(value));
                }
            },
            Some(op) => {
                let entry = self
                    .filters
                    .entry(field.to_string())
                    .or_insert_with(|| RawFilter::Operators(BTreeMap::new()));

                // A bracketed operator wins over an earlier plain value.
                if !matches!(entry, RawFilter::Operators(_)) {
                    *entry = RawFilter::Operators(BTreeMap::new());
                }

                if let RawFilter::Operators(ops) = entry {
                    let incoming = if op == "in" {
                        RawFilter::List(split_list(&value))
                    } else {
                        RawFilter::Scalar(value)
                    };

                    match ops.get_mut(op) {
                        Some(RawFilter::List(values)) => match incoming {
                            RawFilter::List(more) => values.extend(more),
                            RawFilter::Scalar(v) => values.push(v),
                            RawFilter::Operators(_) => {}
                        },
                        Some(existing) => {
                            if let RawFilter::Scalar(v) = incoming {
                                existing.push(v);
                            }
                        }
                        None => {
                            ops.insert(op.to_string(), incoming);
                        }
                    }
                }
            }
        }
    }
}

/// `price[gte]` -> (`price`, Some(`gte`)); anything else is a bare field.
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.find('[') {
        Some(open) if open > 0 && key.ends_with(']') => {
            let inner = &key[open + 1..key.len() - 1];
            if inner.is_empty() || inner.contains(['[', ']']) {
                (key, None)
            } else {
                (&key[..open], Some(inner))
            }
        }
        _ => (key, None),
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('$') && !key.contains('.')
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Leading-integer parse: optional sign, then digits, trailing junk ignored.
///
/// `"3"` and `"3rd"` both give 3; `"abc"` and `""` give `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(entries: &[(&str, RawFilter)]) -> RawFilter {
        RawFilter::Operators(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_reserved_keys_are_removed_from_filters() {
        let params = QueryParams::from_pairs([
            ("select", "title,price"),
            ("sort", "-price"),
            ("page", "2"),
            ("limit", "5"),
            ("title", "Dune"),
        ]);

        assert_eq!(params.select.as_deref(), Some("title,price"));
        assert_eq!(params.sort.as_deref(), Some("-price"));
        assert_eq!(params.page.as_deref(), Some("2"));
        assert_eq!(params.limit.as_deref(), Some("5"));
        assert_eq!(params.filters.len(), 1);
        for key in RESERVED_KEYS {
            assert!(!params.filters.contains_key(key));
        }
    }

    #[test]
    fn test_bracket_operators_nest_under_field() {
        let params = QueryParams::from_pairs([("price[gte]", "10"), ("price[lt]", "50")]);

        assert_eq!(
            params.filters["price"],
            ops(&[
                ("gte", RawFilter::Scalar("10".into())),
                ("lt", RawFilter::Scalar("50".into())),
            ])
        );
    }

    #[test]
    fn test_in_operator_splits_and_accumulates() {
        let params = QueryParams::from_pairs([("role[in]", "admin, publisher"), ("role[in]", "user")]);

        assert_eq!(
            params.filters["role"],
            ops(&[(
                "in",
                RawFilter::List(vec!["admin".into(), "publisher".into(), "user".into()])
            )])
        );
    }

    #[test]
    fn test_repeated_plain_key_becomes_list() {
        let params = QueryParams::from_pairs([("title", "Dune"), ("title", "Emma")]);
        assert_eq!(
            params.filters["title"],
            RawFilter::List(vec!["Dune".into(), "Emma".into()])
        );
    }

    #[test]
    fn test_operator_like_values_are_left_alone() {
        let params = QueryParams::from_pairs([("title", "gte"), ("description", "in stock")]);
        assert_eq!(params.filters["title"], RawFilter::Scalar("gte".into()));
        assert_eq!(
            params.filters["description"],
            RawFilter::Scalar("in stock".into())
        );
    }

    #[test]
    fn test_injection_keys_are_dropped() {
        let params = QueryParams::from_pairs([
            ("$where", "sleep(1000)"),
            ("password[$ne]", "x"),
            ("user.role", "admin"),
            ("price[gt]", "1"),
        ]);

        assert_eq!(params.filters.len(), 1);
        assert!(params.filters.contains_key("price"));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("3"), Some(3));
        assert_eq!(parse_leading_int("3rd"), Some(3));
        assert_eq!(parse_leading_int(" -2"), Some(-2));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }
}
