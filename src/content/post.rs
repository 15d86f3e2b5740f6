//! Post models

use serde::{Deserialize, Serialize};

/// Post metadata as shown in listings (no body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// File base name, unique per post
    pub slug: String,

    /// Post title
    pub title: String,

    /// Canonical date string, used as the sort key
    pub date: String,

    /// Post tags
    pub tags: Vec<String>,

    /// Short description
    pub excerpt: String,

    /// Post author
    pub author: String,
}

/// A fully rendered post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostSummary,

    /// Rendered HTML content
    pub content: String,

    /// Table of contents HTML
    pub toc: String,
}
