use serde::Serialize;

use crate::database::{Page, PageRequest};

/// Envelope shared by every list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> ListResponse<T> {
    pub fn new(page: Page<T>, request: PageRequest) -> Self {
        let total_pages = if page.total == 0 {
            0
        } else {
            (page.total + request.per_page - 1) / request.per_page
        };
        Self {
            items: page.items,
            total: page.total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
        }
    }
}
