//! Query engine - list, render and tag aggregation over the post files
//!
//! Every call rescans the content directory and rereads the files it needs;
//! nothing is cached between calls.

mod page;

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

pub use page::{paginate, ListParams, ListQuery, ListResult};

use crate::content::{Post, PostSummary};
use crate::error::{BlogError, Result};
use crate::Blog;

/// List posts filtered by tag, newest first, one page at a time
pub async fn list_posts(blog: &Blog, params: ListParams) -> Result<ListResult> {
    let query = ListQuery::validate(params, &blog.config.pagination)?;

    let mut posts: Vec<PostSummary> = load_summaries(blog)
        .await?
        .into_iter()
        .filter(|post| query.matches(post))
        .collect();

    // Stable sort: equal dates keep scan order, which is slug ascending
    posts.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(paginate(posts, &query))
}

/// Load and render a single post
pub async fn render_post(blog: &Blog, slug: &str) -> Result<Post> {
    let scanner = blog.scanner.clone();
    let owned = slug.to_string();
    let file = blocking(move || scanner.locate(&owned))
        .await?
        .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

    let loaded = match blog.loader.load(&file).await {
        Ok(loaded) => loaded,
        // Removed between lookup and read
        Err(BlogError::FileRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            return Err(BlogError::NotFound(slug.to_string()));
        }
        Err(e) => return Err(e),
    };

    let renderer = Arc::clone(&blog.renderer);
    let body = loaded.body;
    let rendered = tokio::task::spawn_blocking(move || renderer.render(&body))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result)
        .map_err(|source| BlogError::Render {
            slug: slug.to_string(),
            source,
        })?;

    tracing::debug!("Rendered post {:?} ({} bytes)", slug, rendered.html.len());

    Ok(Post {
        meta: loaded.meta,
        content: rendered.html,
        toc: rendered.toc,
    })
}

/// All distinct tags in use, ascending
pub async fn list_tags(blog: &Blog) -> Result<Vec<String>> {
    let tags: BTreeSet<String> = load_summaries(blog)
        .await?
        .into_iter()
        .flat_map(|post| post.tags)
        .collect();
    Ok(tags.into_iter().collect())
}

/// Metadata for every post file in scan order. Files that cannot be read are
/// skipped with a warning.
async fn load_summaries(blog: &Blog) -> Result<Vec<PostSummary>> {
    let scanner = blog.scanner.clone();
    let files = blocking(move || scanner.scan()).await?;

    let mut posts = Vec::with_capacity(files.len());
    for file in &files {
        match blog.loader.load_summary(file).await {
            Ok(meta) => posts.push(meta),
            Err(e) if e.is_per_file() => {
                tracing::warn!("Skipping post {:?}: {}", file.slug, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(posts)
}

/// Run directory listing and metadata lookups off the async workers
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_post(dir: &Path, slug: &str, content: &str) {
        fs::write(dir.join(format!("{}.md", slug)), content).unwrap();
    }

    fn blog_with(posts: &[(&str, &str)]) -> (TempDir, Blog) {
        let dir = TempDir::new().unwrap();
        let content_dir = dir.path().join("content/blog");
        fs::create_dir_all(&content_dir).unwrap();
        for (slug, content) in posts {
            write_post(&content_dir, slug, content);
        }
        let blog = Blog::new(dir.path()).unwrap();
        (dir, blog)
    }

    fn list_params(tag: Option<&str>, limit: i64, offset: i64) -> ListParams {
        ListParams {
            tag: tag.map(str::to_string),
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    const POST_A: &str = "---\ntitle: Post A\ndate: 2024-03-01\ntags: [infra]\n---\nA body";
    const POST_B: &str = "---\ntitle: Post B\ndate: 2024-02-01\ntags: [infra, release]\n---\nB body";

    #[tokio::test]
    async fn test_first_page_and_tag_filter() {
        let (_dir, blog) = blog_with(&[("post-a", POST_A), ("post-b", POST_B)]);

        let page = blog.list_posts(list_params(None, 1, 0)).await.unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].slug, "post-a");
        assert_eq!(page.total, 2);
        assert!(page.has_more);

        let release = blog
            .list_posts(list_params(Some("release"), 10, 0))
            .await
            .unwrap();
        assert_eq!(release.total, 1);
        assert_eq!(release.posts[0].slug, "post-b");
        assert!(!release.has_more);

        let infra = blog
            .list_posts(list_params(Some("infra"), 10, 0))
            .await
            .unwrap();
        assert_eq!(infra.total, 2);

        let none = blog
            .list_posts(list_params(Some("Infra"), 10, 0))
            .await
            .unwrap();
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn test_sorted_newest_first_with_slug_tiebreak() {
        let (_dir, blog) = blog_with(&[
            ("old", "---\ndate: 2023-12-31\n---\n"),
            ("zeta", "---\ndate: 2024-05-01\n---\n"),
            ("alpha", "---\ndate: 2024-05-01\n---\n"),
            ("timed", "---\ndate: 2024-05-01 09:00:00\n---\n"),
        ]);

        let page = blog.list_posts(ListParams::default()).await.unwrap();
        let slugs: Vec<_> = page.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["timed", "alpha", "zeta", "old"]);
        for pair in page.posts.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty_page() {
        let (_dir, blog) = blog_with(&[("post-a", POST_A), ("post-b", POST_B)]);

        let page = blog.list_posts(list_params(None, 10, 2)).await.unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_io() {
        let dir = TempDir::new().unwrap();
        // Content directory does not exist, so any I/O would fail differently
        let blog = Blog::new(dir.path()).unwrap();

        let err = blog.list_posts(list_params(None, 0, 0)).await.unwrap_err();
        assert!(matches!(err, BlogError::InvalidInput(_)));

        let err = blog.list_posts(list_params(None, 10, 0)).await.unwrap_err();
        assert!(matches!(err, BlogError::RepositoryUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_round_trip_fields() {
        let (_dir, blog) = blog_with(&[(
            "hello",
            "---\ntitle: A\ndate: \"2024-01-05\"\ntags: [x, y]\nauthor: B\nexcerpt: Short\n---\n# Hi",
        )]);

        let page = blog.list_posts(ListParams::default()).await.unwrap();
        let meta = &page.posts[0];
        assert_eq!(meta.title, "A");
        assert_eq!(meta.date, "2024-01-05");
        assert_eq!(meta.tags, vec!["x", "y"]);
        assert_eq!(meta.author, "B");
        assert_eq!(meta.excerpt, "Short");

        let post = blog.render_post("hello").await.unwrap();
        assert_eq!(&post.meta, meta);
        assert!(post.content.contains(">Hi</h1>"));
        assert!(post.toc.contains("Hi"));
    }

    #[tokio::test]
    async fn test_quoted_date_is_kept_literally() {
        let (_dir, blog) = blog_with(&[
            ("plain", "---\ndate: 2024-01-15 10:30:00\n---\n"),
            ("quoted", "---\ndate: \"2024-01-15 10:30:00\"\n---\n"),
        ]);

        let page = blog.list_posts(ListParams::default()).await.unwrap();
        let dates: Vec<_> = page
            .posts
            .iter()
            .map(|p| (p.slug.as_str(), p.date.as_str()))
            .collect();
        assert_eq!(
            dates,
            vec![
                ("plain", "2024-01-15T10:30:00"),
                ("quoted", "2024-01-15 10:30:00"),
            ]
        );
    }

    #[tokio::test]
    async fn test_render_missing_slug() {
        let (_dir, blog) = blog_with(&[("post-a", POST_A)]);

        let err = blog.render_post("nope").await.unwrap_err();
        assert!(matches!(err, BlogError::NotFound(ref s) if s == "nope"));

        let err = blog.render_post("../post-a").await.unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_render_without_headings_has_empty_toc() {
        let (_dir, blog) = blog_with(&[("post-a", POST_A)]);

        let post = blog.render_post("post-a").await.unwrap();
        assert!(post.content.contains("<p>A body</p>"));
        assert_eq!(post.toc, "");
    }

    #[tokio::test]
    async fn test_missing_date_falls_back_to_now() {
        let (_dir, blog) = blog_with(&[("undated", "---\ntitle: Undated\n---\nBody")]);

        let first = blog.list_posts(ListParams::default()).await.unwrap();
        let second = blog.list_posts(ListParams::default()).await.unwrap();
        // The fallback is recomputed per call, so only its shape is stable
        for page in [&first, &second] {
            assert_eq!(page.total, 1);
            assert!(page.posts[0].date.contains('T'));
        }
    }

    #[tokio::test]
    async fn test_tags_sorted_and_deduplicated() {
        let (_dir, blog) = blog_with(&[
            ("post-a", POST_A),
            ("post-b", POST_B),
            ("post-c", "---\ntags: [Rust, infra]\n---\n"),
            ("post-d", "No header"),
        ]);

        let tags = blog.list_tags().await.unwrap();
        assert_eq!(tags, vec!["Rust", "infra", "release"]);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped() {
        let (dir, blog) = blog_with(&[("post-a", POST_A)]);
        fs::write(
            dir.path().join("content/blog/broken.md"),
            [0xffu8, 0xfe, 0xfd],
        )
        .unwrap();

        let page = blog.list_posts(ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.posts[0].slug, "post-a");
        assert_eq!(blog.list_tags().await.unwrap(), vec!["infra"]);

        let err = blog.render_post("broken").await.unwrap_err();
        assert!(matches!(err, BlogError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let (_dir, blog) = blog_with(&[]);

        let page = blog.list_posts(ListParams::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.posts.is_empty());
        assert!(!page.has_more);
        assert!(blog.list_tags().await.unwrap().is_empty());
    }

    #[test]
    fn test_default_config_points_at_content_blog() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.content_dir, dir.path().join(BlogConfig::default().content_dir));
    }
}
