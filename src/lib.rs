//! qp-blog: a read-only content engine for a markdown blog
//!
//! Posts are markdown files with a metadata header. This crate lists them
//! (filtered by tag, paginated), renders single posts to HTML with a table of
//! contents, and aggregates tags. It also ships a JSON API server and a CLI.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod query;
pub mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use error::{BlogError, Result};

use content::{ContentLoader, MarkdownRenderer, Post, Renderer, Scanner};
use query::{ListParams, ListResult};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the post files
    pub content_dir: PathBuf,
    scanner: Scanner,
    loader: ContentLoader,
    renderer: Arc<dyn Renderer>,
}

impl Blog {
    /// Create a new Blog instance from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            config::BlogConfig::default()
        };

        let renderer = MarkdownRenderer::with_options(&config.highlight, &config.toc);
        Ok(Self::with_renderer(base_dir, config, Arc::new(renderer)))
    }

    /// Create a Blog with an explicit configuration and rendering capability
    pub fn with_renderer(
        base_dir: PathBuf,
        config: config::BlogConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let scanner = Scanner::new(&content_dir, &config.extensions);
        let loader = ContentLoader::new(&config);

        Self {
            config,
            base_dir,
            content_dir,
            scanner,
            loader,
            renderer,
        }
    }

    /// List posts, newest first, filtered by tag and paginated
    pub async fn list_posts(&self, params: ListParams) -> Result<ListResult> {
        query::list_posts(self, params).await
    }

    /// Render a single post by slug
    pub async fn render_post(&self, slug: &str) -> Result<Post> {
        query::render_post(self, slug).await
    }

    /// All distinct tags, ascending
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        query::list_tags(self).await
    }
}
