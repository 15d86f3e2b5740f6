//! Render a single post to stdout

use anyhow::Result;

use crate::Blog;

/// Print the rendered HTML of a post, or only its table of contents
pub async fn run(blog: &Blog, slug: &str, toc_only: bool) -> Result<()> {
    let post = blog.render_post(slug).await?;

    if toc_only {
        print!("{}", post.toc);
        return Ok(());
    }

    println!("<!-- {} | {} | {} -->", post.meta.title, post.meta.date, post.meta.author);
    print!("{}", post.content);
    Ok(())
}
