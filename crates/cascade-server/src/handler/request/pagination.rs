//! Pagination query parameters.

use cascade_postgres::types::OffsetPagination;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Offset pagination query parameters for list endpoints.
#[must_use]
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100).
    pub limit: Option<i64>,
    /// Number of items to skip.
    pub offset: Option<i64>,
}

impl From<PaginationParams> for OffsetPagination {
    fn from(params: PaginationParams) -> Self {
        let defaults = OffsetPagination::default();
        OffsetPagination::new(
            params.limit.unwrap_or(defaults.limit),
            params.offset.unwrap_or(defaults.offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_use_defaults() {
        let pagination: OffsetPagination = PaginationParams::default().into();
        assert_eq!(pagination, OffsetPagination::default());
    }

    #[test]
    fn explicit_values_are_clamped() {
        let params = PaginationParams {
            limit: Some(10_000),
            offset: Some(-1),
        };
        let pagination: OffsetPagination = params.into();
        assert_eq!(pagination.limit, cascade_postgres::types::MAX_LIMIT);
        assert_eq!(pagination.offset, 0);
    }
}
