//! List envelopes
//!
//! List endpoints answer either with a bare JSON array or, when the backend
//! paginates, with a `{count, next, previous, results}` page.

use serde::{Deserialize, Serialize};

/// One page of a paginated list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Either shape a list endpoint may return
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Paged(page) => page.results,
            ListResponse::Plain(items) => items,
        }
    }

    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        matches!(self, ListResponse::Paged(Page { next: Some(_), .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_shapes_decode() {
        let plain: ListResponse<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert!(!plain.has_next());
        assert_eq!(plain.into_items(), vec![1, 2]);

        let paged: ListResponse<u32> = serde_json::from_str(
            r#"{"count": 12, "next": "http://x/?page=2", "previous": null, "results": [3]}"#,
        )
        .unwrap();
        assert!(paged.has_next());
        assert_eq!(paged.into_items(), vec![3]);
    }
}
