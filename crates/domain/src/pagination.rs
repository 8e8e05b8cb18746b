//! Cursor pagination shared by list operations.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Opaque cursor returned as `continue_cursor` by the previous page.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub num_items: Option<u32>,
}

impl PageRequest {
    pub fn limit(&self) -> u32 {
        self.num_items
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: Vec<T>,
    pub is_done: bool,
    pub continue_cursor: String,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page.into_iter().map(f).collect(),
            is_done: self.is_done,
            continue_cursor: self.continue_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::default().limit(), DEFAULT_PAGE_SIZE);
        let zero = PageRequest { cursor: None, num_items: Some(0) };
        assert_eq!(zero.limit(), 1);
        let huge = PageRequest { cursor: None, num_items: Some(10_000) };
        assert_eq!(huge.limit(), MAX_PAGE_SIZE);
    }
}
