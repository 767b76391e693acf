//! Page-number pagination

use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// A 1-indexed page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Pages below 1 are read as page 1, a zero size as size 1
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    /// The first `size` items
    pub fn first(size: u32) -> Self {
        Self::new(1, size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Index of the first item on this page
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the size of the whole listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, results }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(PageRequest::new(1, 12).offset(), 0);
        assert_eq!(PageRequest::new(3, 12).offset(), 24);
        assert_eq!(PageRequest::new(0, 12), PageRequest::new(1, 12));
        assert_eq!(PageRequest::new(2, 0).size(), 1);
    }

    #[test]
    fn test_page_map_keeps_count() {
        let page = Page::new(30, vec![1, 2, 3]).map(|n| n * 10);
        assert_eq!(page.count, 30);
        assert_eq!(page.results, vec![10, 20, 30]);
    }
}
