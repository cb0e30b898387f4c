// core/src/pagination.rs

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page: u32,
  limit: u32,
}

impl PageRequest {
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page: page.unwrap_or(1).max(1),
      limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn limit(&self) -> u32 {
    self.limit
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }

  /// Slices an already filtered and ordered collection.
  pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
    let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
    items.iter().skip(start).take(self.limit as usize).cloned().collect()
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self::new(None, None)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page: u32,
  pub total_pages: u64,
  pub total_items: u64,
  pub items_per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  pub pagination: Pagination,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
    Self {
      items,
      pagination: Pagination {
        current_page: request.page(),
        total_pages: total_items.div_ceil(u64::from(request.limit())),
        total_items,
        items_per_page: request.limit(),
      },
    }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items: self.items.into_iter().map(f).collect(),
      pagination: self.pagination,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_is_clamped() {
    let req = PageRequest::new(Some(0), Some(1_000));
    assert_eq!(req.page(), 1);
    assert_eq!(req.limit(), MAX_PAGE_SIZE);

    let req = PageRequest::new(None, Some(0));
    assert_eq!(req.limit(), 1);
    assert_eq!(PageRequest::default().limit(), DEFAULT_PAGE_SIZE);
  }

  #[test]
  fn page_metadata_rounds_total_pages_up() {
    let req = PageRequest::new(Some(3), Some(4));
    assert_eq!(req.offset(), 8);
    let page = Page::new(vec![9, 10], req, 10);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.current_page, 3);
    assert_eq!(page.pagination.items_per_page, 4);
  }

  #[test]
  fn slice_past_the_end_is_empty() {
    let data: Vec<u32> = (1..=5).collect();
    assert_eq!(PageRequest::new(Some(2), Some(3)).slice(&data), vec![4, 5]);
    assert!(PageRequest::new(Some(9), Some(3)).slice(&data).is_empty());
  }
}
