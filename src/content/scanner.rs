//! Repository scanner - enumerates post files in the content directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{BlogError, Result};

/// A post file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFile {
    pub slug: String,
    pub path: PathBuf,
}

/// Finds `<slug>.<ext>` files directly inside a content directory
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
        }
    }

    /// List post files, sorted by file name. Subdirectories and hidden files
    /// are not scanned.
    pub fn scan(&self) -> Result<Vec<PostFile>> {
        self.ensure_root()?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("failed to list directory"));
                    return Err(self.unavailable(source));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", self.root, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("Skipping post with non UTF-8 file name: {:?}", path);
                continue;
            };
            if name.starts_with('.') || !self.has_post_extension(path) {
                continue;
            }
            if let Some(slug) = path.file_stem().and_then(|s| s.to_str()) {
                files.push(PostFile {
                    slug: slug.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }

        tracing::debug!("Scanned {} post files in {:?}", files.len(), self.root);
        Ok(files)
    }

    /// Find the file for a slug. Slugs that could escape the content
    /// directory never match.
    pub fn locate(&self, slug: &str) -> Result<Option<PostFile>> {
        self.ensure_root()?;

        if !is_valid_slug(slug) {
            return Ok(None);
        }

        Ok(self
            .extensions
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", slug, ext)))
            .find(|path| path.is_file())
            .map(|path| PostFile {
                slug: slug.to_string(),
                path,
            }))
    }

    fn ensure_root(&self) -> Result<()> {
        let metadata = fs::metadata(&self.root).map_err(|e| self.unavailable(e))?;
        if !metadata.is_dir() {
            return Err(self.unavailable(io::Error::other("not a directory")));
        }
        Ok(())
    }

    fn unavailable(&self, source: io::Error) -> BlogError {
        BlogError::RepositoryUnavailable {
            path: self.root.clone(),
            source,
        }
    }

    fn has_post_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| ext == e))
            .unwrap_or(false)
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
}
