use serde::Serialize;

use crate::IndexError;

/// One page of a ranked result list. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice `items` into page `page` of size `per_page`.
///
/// Page 0 is treated as page 1. A page past the end is empty but still
/// reports the totals.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Result<Page<T>, IndexError> {
    if per_page == 0 {
        return Err(IndexError::InvalidPagination("per_page must be positive".into()));
    }
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);
    Ok(Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    })
}
