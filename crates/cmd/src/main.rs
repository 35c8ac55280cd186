// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use cmd::commands;
use cmd::common::ArchiveContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "arcfs")]
/// Browse zip and tar archives as read-only filesystems
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Refuse archives with more entries than this
    #[arg(long, global = true)]
    max_entries: Option<usize>,
}

#[derive(Args)]
struct Target {
    /// Archive file path, or an `archive:` URI
    archive: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory inside the archive
    Ls {
        #[command(flatten)]
        target: Target,
        /// Path inside the archive, relative to the URI fragment if any
        path: Option<String>,
        /// Long format: type, size, modification time, link target
        #[arg(short, long)]
        long: bool,
    },
    /// Print the directory tree
    Tree {
        #[command(flatten)]
        target: Target,
        path: Option<String>,
    },
    /// Write file contents to stdout
    Cat {
        #[command(flatten)]
        target: Target,
        /// Files to print; the URI fragment when none are given
        paths: Vec<String>,
    },
    /// Show entry attributes
    Stat {
        #[command(flatten)]
        target: Target,
        path: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a symlink's target
    Readlink {
        #[command(flatten)]
        target: Target,
        path: Option<String>,
    },
    /// Summarize the archive
    Info {
        #[command(flatten)]
        target: Target,
    },
}

impl Commands {
    fn archive(&self) -> &str {
        match self {
            Commands::Ls { target, .. }
            | Commands::Tree { target, .. }
            | Commands::Cat { target, .. }
            | Commands::Stat { target, .. }
            | Commands::Readlink { target, .. }
            | Commands::Info { target } => &target.archive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let ctx = ArchiveContext::open(cli.command.archive(), cli.max_entries).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = match &cli.command {
        Commands::Ls { path, long, .. } => {
            commands::list_command(&ctx, path.as_deref().unwrap_or(""), *long, &mut out)
        }
        Commands::Tree { path, .. } => {
            commands::tree_command(&ctx, path.as_deref().unwrap_or(""), &mut out)
        }
        Commands::Cat { paths, .. } if paths.is_empty() => {
            commands::cat_command(&ctx, &[String::new()], &mut out).await
        }
        Commands::Cat { paths, .. } => commands::cat_command(&ctx, paths, &mut out).await,
        Commands::Stat { path, json, .. } => {
            commands::stat_command(&ctx, path.as_deref().unwrap_or(""), *json, &mut out)
        }
        Commands::Readlink { path, .. } => {
            commands::readlink_command(&ctx, path.as_deref().unwrap_or(""), &mut out)
        }
        Commands::Info { .. } => commands::info_command(&ctx, &mut out).await,
    };

    ctx.close();
    result
}
