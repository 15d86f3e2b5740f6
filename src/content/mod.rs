//! Content module - scanning, parsing and rendering of post files

mod date;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
mod scanner;
mod toc;

pub use date::PostDate;
pub use frontmatter::FrontMatter;
pub use loader::{ContentLoader, LoadedPost};
pub use markdown::{MarkdownRenderer, Rendered, Renderer};
pub use post::{Post, PostSummary};
pub use scanner::{PostFile, Scanner};
pub use toc::{TocBuilder, TocEntry};
