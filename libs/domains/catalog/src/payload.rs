//! Response payloads whose key depends on the product line, e.g.
//! `{ "book": ... }` or `{ "count": 2, "foodCategories": [...] }`.

use serde::{Serialize, Serializer, ser::SerializeMap};

/// `{ "<key>": value }`
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    pub key: &'static str,
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(key: &'static str, value: T) -> Self {
        Self { key, value }
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// `{ "count": n, "<key>": [...] }`
#[derive(Debug, Clone, PartialEq)]
pub struct CountedList<T> {
    pub key: &'static str,
    pub items: Vec<T>,
}

impl<T: Serialize> Serialize for CountedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("count", &self.items.len())?;
        map.serialize_entry(self.key, &self.items)?;
        map.end()
    }
}
