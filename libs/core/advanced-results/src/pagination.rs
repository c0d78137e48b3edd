use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Page coordinates a client can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Cursor {
    pub page: u64,
    pub limit: u64,
}

/// Neighbouring pages; an empty object when there are none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Cursor>,
}

impl Pagination {
    /// `next` exists while `page * limit < total`; `prev` whenever the page
    /// does not start at zero.
    pub fn compute(page: u64, limit: u64, total: u64) -> Self {
        let start_index = page.saturating_sub(1).saturating_mul(limit);
        let last_index = page.saturating_mul(limit);

        Self {
            next: (last_index < total).then_some(Cursor {
                page: page + 1,
                limit,
            }),
            prev: (start_index > 0).then_some(Cursor {
                page: page - 1,
                limit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page_has_both_cursors() {
        let pagination = Pagination::compute(2, 5, 20);
        assert_eq!(pagination.next, Some(Cursor { page: 3, limit: 5 }));
        assert_eq!(pagination.prev, Some(Cursor { page: 1, limit: 5 }));
    }

    #[test]
    fn test_first_and_last_pages() {
        assert_eq!(Pagination::compute(1, 5, 20).prev, None);
        assert_eq!(Pagination::compute(4, 5, 20).next, None);
        assert_eq!(Pagination::compute(1, 15, 3), Pagination::default());
    }

    #[test]
    fn test_page_past_the_end_still_points_back() {
        let pagination = Pagination::compute(9, 5, 20);
        assert_eq!(pagination.next, None);
        assert_eq!(pagination.prev, Some(Cursor { page: 8, limit: 5 }));
    }

    #[test]
    fn test_empty_pagination_serializes_as_empty_object() {
        let json = serde_json::to_value(Pagination::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
