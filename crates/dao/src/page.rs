use serde::{Deserialize, Serialize};

use crate::{DaoError, Result};

/// Sort direction of one order-by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// One `(column, direction)` sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Which page to fetch, how large pages are, and how rows are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Vec<Order>,
}

impl PageRequest {
    /// Page size used when a caller does not supply a request.
    pub const DEFAULT_SIZE: u32 = 20;

    /// Creates an unsorted request for the zero-based `page`.
    pub fn of(page: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(DaoError::InvalidPageSize);
        }
        Ok(Self {
            page,
            size,
            sort: Vec::new(),
        })
    }

    /// Replaces the sort keys.
    pub fn with_sort(mut self, sort: Vec<Order>) -> Self {
        self.sort = sort;
        self
    }

    /// Appends one sort key.
    pub fn sort_by(mut self, order: Order) -> Self {
        self.sort.push(order);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &[Order] {
        &self.sort
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
            sort: Vec::new(),
        }
    }
}

/// Number of pages needed for `total` rows, zero when there are no rows.
pub fn page_count(total: u64, size: u32) -> u64 {
    total.div_ceil(u64::from(size.max(1)))
}

/// One page of mapped rows plus the metadata needed to navigate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    content: Vec<T>,
    total_elements: u64,
    page: u32,
    size: u32,
}

impl<T> PageResult<T> {
    /// Assembles a page, clamping `requested_page` into `[0, page_count - 1]`.
    pub fn new(content: Vec<T>, total_elements: u64, requested_page: u32, size: u32) -> Self {
        let last_page = page_count(total_elements, size).saturating_sub(1);
        let page = u64::from(requested_page).min(last_page) as u32;
        Self {
            content,
            total_elements,
            page,
            size,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// The page index after clamping.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_pages(&self) -> u64 {
        page_count(self.total_elements, self.size)
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        u64::from(self.page) + 1 >= self.total_pages()
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    /// Maps the content while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page: self.page,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(matches!(PageRequest::of(0, 0), Err(DaoError::InvalidPageSize)));
    }

    #[test]
    fn default_request_is_first_page_of_twenty() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), 20);
        assert!(request.sort().is_empty());
    }

    #[test]
    fn sort_keys_keep_their_order() {
        let request = PageRequest::of(1, 10)
            .unwrap()
            .sort_by(Order::desc("created_at"))
            .sort_by(Order::asc("id"));

        assert_eq!(
            request.sort(),
            &[Order::desc("created_at"), Order::asc("id")]
        );
    }

    #[test]
    fn page_count_is_ceiling_of_total_over_size() {
        for size in 1..=12_u32 {
            for total in 0..=60_u64 {
                let expected = (total as f64 / f64::from(size)).ceil() as u64;
                assert_eq!(page_count(total, size), expected, "total={total} size={size}");
                assert_eq!(page_count(total, size) == 0, total == 0);
            }
        }
    }

    #[test]
    fn page_index_is_clamped_to_last_page() {
        let page: PageResult<i32> = PageResult::new(Vec::new(), 25, 5, 10);
        assert_eq!(page.page(), 2);
        assert_eq!(page.total_pages(), 3);
        assert!(page.is_last());
    }

    #[test]
    fn empty_result_reports_page_zero() {
        let page: PageResult<i32> = PageResult::new(Vec::new(), 0, 4, 10);
        assert_eq!(page.page(), 0);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_first());
        assert!(!page.has_next());
    }

    #[test]
    fn in_range_page_index_is_kept() {
        let page = PageResult::new(vec![11, 12], 25, 1, 10);
        assert_eq!(page.page(), 1);
        assert!(page.has_next());
        assert_eq!(page.number_of_elements(), 2);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = PageResult::new(vec![1, 2, 3], 13, 1, 3).map(|v| v * 10);
        assert_eq!(page.content(), &[10, 20, 30]);
        assert_eq!(page.total_elements(), 13);
        assert_eq!(page.page(), 1);
    }

    #[test]
    fn direction_serializes_uppercase() {
        let json = serde_json::to_string(&Order::desc("id")).unwrap();
        assert_eq!(json, r#"{"column":"id","direction":"DESC"}"#);
    }
}
