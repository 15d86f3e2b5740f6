//! Listing parameters and pagination

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::content::PostSummary;
use crate::error::{BlogError, Result};

/// Listing parameters as supplied by a caller, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A validated listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    tag: Option<String>,
    limit: usize,
    offset: usize,
}

impl ListQuery {
    /// Check bounds: `limit` in `1..=max_limit`, `offset >= 0`.
    /// Out-of-range values are rejected, not clamped. An empty tag means no filter.
    pub fn validate(params: ListParams, pagination: &PaginationConfig) -> Result<Self> {
        let limit = params.limit.unwrap_or(pagination.default_limit as i64);
        if limit < 1 || limit > pagination.max_limit as i64 {
            return Err(BlogError::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                pagination.max_limit, limit
            )));
        }

        let offset = params.offset.unwrap_or(0);
        if offset < 0 {
            return Err(BlogError::InvalidInput(format!(
                "offset must be non-negative, got {}",
                offset
            )));
        }

        Ok(Self {
            tag: params.tag.filter(|t| !t.is_empty()),
            limit: limit as usize,
            offset: offset as usize,
        })
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Exact, case-sensitive tag match
    pub fn matches(&self, post: &PostSummary) -> bool {
        match &self.tag {
            Some(tag) => post.tags.iter().any(|t| t == tag),
            None => true,
        }
    }
}

/// One page of a post listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub posts: Vec<PostSummary>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Slice an already filtered and sorted listing
pub fn paginate(posts: Vec<PostSummary>, query: &ListQuery) -> ListResult {
    let total = posts.len();
    let page = posts
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    ListResult {
        posts: page,
        total,
        limit: query.limit,
        offset: query.offset,
        has_more: query.offset.saturating_add(query.limit) < total,
    }
}
