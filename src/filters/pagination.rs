use serde::Serialize;

use super::query_params::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 6;
    pub const MAX_LIMIT: i64 = 100;
    /// Highest page whose offset still fits an `i64` at any allowed limit.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_LIMIT;

    pub fn from_params(params: &QueryParams) -> Self {
        let page = params
            .get_parsed::<i64>("page")
            .filter(|&page| page >= 1)
            .unwrap_or(1)
            .min(Self::MAX_PAGE);
        let limit = params
            .get_parsed::<i64>("limit")
            .filter(|&limit| limit >= 1)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
}
