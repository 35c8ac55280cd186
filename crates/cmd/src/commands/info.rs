// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;

use crate::common::{ArchiveContext, format_file_size};

/// Summarize the opened archive: store, counts, sizes
pub async fn info_command<W: Write>(ctx: &ArchiveContext, out: &mut W) -> Result<()> {
    let store = ctx.provider().get_file_store(&ctx.fs().root_path()).await;
    let total_space = store.total_space().await?;
    let stats = ctx.fs().stats();

    writeln!(out, "Archive:      {}", store.name())?;
    writeln!(out, "Format:       {}", store.store_type())?;
    writeln!(out, "Read-only:    {}", ctx.fs().is_read_only())?;
    writeln!(out, "Archive size: {}", format_file_size(total_space))?;
    writeln!(out, "Files:        {} ({})", stats.files, format_file_size(stats.total_size))?;
    writeln!(
        out,
        "Directories:  {} ({} implied)",
        stats.directories, stats.synthetic_directories
    )?;
    writeln!(out, "Symlinks:     {}", stats.symlinks)?;
    Ok(())
}
