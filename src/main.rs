//! CLI entry point for qp-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qp_blog::query::ListParams;

#[derive(Parser)]
#[command(name = "qp-blog")]
#[command(version)]
#[command(about = "Read-only content engine and JSON API for a markdown blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.host)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// List posts, newest first
    List {
        /// Only posts with this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Posts per page
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Posts to skip
        #[arg(short, long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// List all tags
    Tags,

    /// Render a post
    Show {
        /// Post slug (file name without extension)
        slug: String,

        /// Print only the table of contents
        #[arg(long)]
        toc: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "qp_blog=debug,info"
    } else {
        "qp_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let blog = qp_blog::Blog::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| blog.config.server.host.clone());
            let port = port.unwrap_or(blog.config.server.port);
            qp_blog::server::start(blog, &ip, port).await?;
        }

        Commands::List { tag, limit, offset } => {
            let blog = qp_blog::Blog::new(&base_dir)?;
            let params = ListParams { tag, limit, offset };
            qp_blog::commands::list::posts(&blog, params).await?;
        }

        Commands::Tags => {
            let blog = qp_blog::Blog::new(&base_dir)?;
            qp_blog::commands::list::tags(&blog).await?;
        }

        Commands::Show { slug, toc } => {
            let blog = qp_blog::Blog::new(&base_dir)?;
            tracing::debug!("Rendering post {:?}", slug);
            qp_blog::commands::show::run(&blog, &slug, toc).await?;
        }

        Commands::Version => {
            println!("qp-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
