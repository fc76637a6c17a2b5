use serde::Serialize;

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of matching items across all pages.
    #[schema(example = 25)]
    pub total: u64,
    /// Current page number (1-based).
    #[schema(example = 2)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 10)]
    pub limit: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
    #[schema(example = true)]
    pub has_next_page: bool,
    #[schema(example = true)]
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}
