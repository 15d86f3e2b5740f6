//! Content loader - reads post files and applies metadata defaults

use std::path::Path;
use std::time::Duration;

use super::{FrontMatter, PostFile, PostSummary};
use crate::config::BlogConfig;
use crate::error::{BlogError, Result};

/// A post file split into its metadata and raw markdown body
#[derive(Debug, Clone)]
pub struct LoadedPost {
    pub meta: PostSummary,
    pub body: String,
}

/// Loads posts from disk, one file per call
#[derive(Debug, Clone)]
pub struct ContentLoader {
    read_timeout: Duration,
    default_title: String,
    default_author: String,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(config: &BlogConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            default_title: config.default_title.clone(),
            default_author: config.default_author.clone(),
        }
    }

    /// Load metadata and body for one post file
    pub async fn load(&self, file: &PostFile) -> Result<LoadedPost> {
        let content = self.read(&file.path).await?;
        let (fm, body) = FrontMatter::parse(&content);
        Ok(LoadedPost {
            meta: self.summarize(&file.slug, fm),
            body: body.to_string(),
        })
    }

    /// Load only the metadata for one post file
    pub async fn load_summary(&self, file: &PostFile) -> Result<PostSummary> {
        let content = self.read(&file.path).await?;
        let (fm, _) = FrontMatter::parse(&content);
        Ok(self.summarize(&file.slug, fm))
    }

    /// Read a file, giving up after the configured timeout
    async fn read(&self, path: &Path) -> Result<String> {
        match tokio::time::timeout(self.read_timeout, tokio::fs::read_to_string(path)).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(source)) => Err(BlogError::FileRead {
                path: path.to_path_buf(),
                source,
            }),
            Err(_) => Err(BlogError::ReadTimeout {
                path: path.to_path_buf(),
                timeout: self.read_timeout,
            }),
        }
    }

    /// Apply defaults for missing header fields
    fn summarize(&self, slug: &str, fm: FrontMatter) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            title: fm.title.unwrap_or_else(|| self.default_title.clone()),
            date: fm.date.canonical(),
            tags: fm.tags,
            excerpt: fm.excerpt.unwrap_or_default(),
            author: fm.author.unwrap_or_else(|| self.default_author.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn post_file(dir: &TempDir, slug: &str, content: &str) -> PostFile {
        let path = dir.path().join(format!("{}.md", slug));
        fs::write(&path, content).unwrap();
        PostFile {
            slug: slug.to_string(),
            path,
        }
    }

    #[tokio::test]
    async fn test_load_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let file = post_file(&dir, "bare", "No header here.");
        let loader = ContentLoader::new(&BlogConfig::default());

        let post = loader.load(&file).await.unwrap();
        assert_eq!(post.meta.slug, "bare");
        assert_eq!(post.meta.title, "Untitled");
        assert_eq!(post.meta.author, "Quality Playbook");
        assert_eq!(post.meta.excerpt, "");
        assert!(post.meta.tags.is_empty());
        assert!(!post.meta.date.is_empty());
        assert_eq!(post.body, "No header here.");
    }

    #[tokio::test]
    async fn test_configured_defaults() {
        let dir = TempDir::new().unwrap();
        let file = post_file(&dir, "bare", "---\ndate: 2024-01-01\n---\nBody");
        let config = BlogConfig {
            default_title: "(no title)".to_string(),
            default_author: "Staff".to_string(),
            ..BlogConfig::default()
        };

        let meta = ContentLoader::new(&config).load_summary(&file).await.unwrap();
        assert_eq!(meta.title, "(no title)");
        assert_eq!(meta.author, "Staff");
        assert_eq!(meta.date, "2024-01-01");
    }

    #[tokio::test]
    async fn test_missing_file_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let file = PostFile {
            slug: "gone".to_string(),
            path: dir.path().join("gone.md"),
        };
        let err = ContentLoader::new(&BlogConfig::default())
            .load(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::FileRead { .. }));
        assert!(err.is_per_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_read_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slow.md");
        // Opening a FIFO blocks until a writer shows up
        let status = std::process::Command::new("mkfifo")
            .arg(&path)
            .status()
            .unwrap();
        assert!(status.success());
        let file = PostFile {
            slug: "slow".to_string(),
            path: path.clone(),
        };
        let loader = ContentLoader {
            read_timeout: Duration::from_millis(50),
            ..ContentLoader::new(&BlogConfig::default())
        };

        let err = loader.load_summary(&file).await.unwrap_err();
        assert!(matches!(err, BlogError::ReadTimeout { ref path, .. } if path == &file.path));
        assert!(err.is_per_file());

        // Release the abandoned read so the runtime can shut down
        drop(fs::OpenOptions::new().write(true).open(&path).unwrap());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        let file = PostFile {
            slug: "binary".to_string(),
            path,
        };
        let err = ContentLoader::new(&BlogConfig::default())
            .load_summary(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::FileRead { .. }));
    }
}
