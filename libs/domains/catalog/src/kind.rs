//! The two product lines. Books and foods share every shape and rule; only
//! their collections and wording differ.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Sub-category line, stored in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SubCategoryKind {
    Book,
    Food,
}

impl SubCategoryKind {
    pub fn collection(self) -> &'static str {
        match self {
            Self::Book => "bookcategories",
            Self::Food => "foodcategories",
        }
    }

    /// `Book category`
    pub fn label(self) -> &'static str {
        match self {
            Self::Book => "Book category",
            Self::Food => "Food category",
        }
    }

    /// Key of a single record in response bodies
    pub fn data_key(self) -> &'static str {
        match self {
            Self::Book => "bookCategory",
            Self::Food => "foodCategory",
        }
    }

    /// Key of a record list in response bodies
    pub fn list_key(self) -> &'static str {
        match self {
            Self::Book => "bookCategories",
            Self::Food => "foodCategories",
        }
    }

    pub fn products(self) -> ProductKind {
        match self {
            Self::Book => ProductKind::Book,
            Self::Food => ProductKind::Food,
        }
    }
}

/// Product line; `Display` gives the noun used in messages (`book`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ProductKind {
    Book,
    Food,
}

impl ProductKind {
    pub fn collection(self) -> &'static str {
        match self {
            Self::Book => "books",
            Self::Food => "foods",
        }
    }

    /// Key of a single record in response bodies
    pub fn data_key(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Food => "food",
        }
    }

    pub fn parent(self) -> SubCategoryKind {
        match self {
            Self::Book => SubCategoryKind::Book,
            Self::Food => SubCategoryKind::Food,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_pair_up() {
        for kind in [ProductKind::Book, ProductKind::Food] {
            assert_eq!(kind.parent().products(), kind);
        }
        assert_eq!(ProductKind::Food.to_string(), "food");
        assert_eq!(SubCategoryKind::Book.as_ref(), "book");
        assert_eq!(SubCategoryKind::Food.collection(), "foodcategories");
        assert_eq!(ProductKind::Book.data_key(), ProductKind::Book.as_ref());
    }
}
