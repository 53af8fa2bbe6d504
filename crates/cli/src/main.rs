//! `codemap` - build and query dependency graphs of a source tree.
//!
//! # Usage
//!
//! ```bash
//! # Analyse the current directory and commit the graph
//! codemap analyze
//!
//! # Summarise one file's neighbourhood
//! codemap context <PROJECT_ID> src/app.ts
//!
//! # Mermaid / DOT diagrams
//! codemap diagram <PROJECT_ID> --type dependency --focus src/app.ts
//!
//! # Re-parse only what changed
//! codemap refresh <PROJECT_ID> src/app.ts src/removed.ts
//!
//! # Purge expired graphs hourly until Ctrl-C
//! codemap sweep --every 3600
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codemap_graph::{DiagramFormat, DiagramKind};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "codemap")]
#[command(about = "Structural dependency graphs for source trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: <root>/codemap.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Owner of the graphs read and written
    #[arg(long, global = true, env = "CODEMAP_USER", default_value = "local")]
    user: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse the project and commit a new graph
    Analyze {
        /// Project name (default: root directory name)
        #[arg(long)]
        name: Option<String>,

        /// Branch label (default: current git branch, else "main")
        #[arg(long)]
        branch: Option<String>,

        /// Files per extraction chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Print a stored graph
    Show {
        project_id: String,
    },

    /// Newest graph of the project at --root
    Latest,

    /// Neighbourhood and summary of one file
    Context {
        project_id: String,
        file: String,
    },

    /// Render a diagram of a stored graph
    Diagram {
        project_id: String,

        /// architecture, dependency or data-flow
        #[arg(short = 't', long = "type", default_value = "architecture")]
        kind: DiagramKind,

        /// Centre the dependency view on this file
        #[arg(long)]
        focus: Option<String>,

        #[arg(long)]
        max_nodes: Option<usize>,

        /// mermaid or dot
        #[arg(short, long, default_value = "mermaid")]
        format: DiagramFormat,
    },

    /// Apply changed files to a stored graph without a full rebuild
    Refresh {
        project_id: String,

        /// Root-relative paths that were added, modified or deleted
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Re-analyse everything under the same project id
    Rebuild {
        project_id: String,
    },

    /// Delete expired graphs from the store
    Sweep {
        /// Keep running and sweep again every SECONDS until interrupted
        #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
        every: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let ctx = commands::Context::open(&cli.root, cli.config.as_deref(), cli.user, cli.json)?;

    match cli.command {
        Commands::Analyze {
            name,
            branch,
            chunk_size,
            no_progress,
        } => commands::analyze(ctx, name, branch, chunk_size, !no_progress).await,
        Commands::Show { project_id } => commands::show(&ctx, &project_id).await,
        Commands::Latest => commands::latest(&ctx).await,
        Commands::Context { project_id, file } => {
            commands::context(&ctx, &project_id, &file).await
        }
        Commands::Diagram {
            project_id,
            kind,
            focus,
            max_nodes,
            format,
        } => {
            commands::diagram(
                &ctx,
                &project_id,
                kind,
                focus,
                max_nodes,
                format,
            )
            .await
        }
        Commands::Refresh { project_id, paths } => {
            commands::refresh(&ctx, &project_id, &paths).await
        }
        Commands::Rebuild { project_id } => commands::rebuild(&ctx, &project_id).await,
        Commands::Sweep { every } => commands::sweep(&ctx, every.map(Duration::from_secs)).await,
    }
}
