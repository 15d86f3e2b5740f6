//! List posts and tags

use anyhow::Result;

use crate::query::ListParams;
use crate::Blog;

/// Print one page of posts
pub async fn posts(blog: &Blog, params: ListParams) -> Result<()> {
    let result = blog.list_posts(params).await?;

    println!(
        "Posts ({}-{} of {}):",
        (result.offset + 1).min(result.total),
        (result.offset + result.posts.len()).min(result.total),
        result.total
    );
    for post in &result.posts {
        let tags = if post.tags.is_empty() {
            String::new()
        } else {
            format!(" #{}", post.tags.join(" #"))
        };
        println!("  {} - {} [{}]{}", post.date, post.title, post.slug, tags);
    }
    if result.has_more {
        println!(
            "  ... more with --offset {}",
            result.offset + result.limit
        );
    }

    Ok(())
}

/// Print every tag in use
pub async fn tags(blog: &Blog) -> Result<()> {
    let tags = blog.list_tags().await?;
    println!("Tags ({}):", tags.len());
    for tag in tags {
        println!("  {}", tag);
    }
    Ok(())
}
