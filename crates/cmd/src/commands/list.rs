// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;
use arcfs::{ArchivePath, DirectoryStream};

use crate::common::{ArchiveContext, format_file_size, kind_marker};

fn write_entry<W: Write>(
    ctx: &ArchiveContext,
    path: &ArchivePath,
    long: bool,
    out: &mut W,
) -> Result<()> {
    let name = path.file_name().unwrap_or("/");
    if !long {
        writeln!(out, "{}", name)?;
        return Ok(());
    }

    let attrs = ctx.provider().read_attributes(path)?;
    write!(
        out,
        "{} {:>8} {} {}",
        kind_marker(attrs.entry_type),
        format_file_size(attrs.size),
        attrs.last_modified_time.format("%Y-%m-%d %H:%M"),
        name
    )?;
    if attrs.is_symbolic_link() {
        write!(out, " -> {}", ctx.provider().read_symbolic_link(path)?)?;
    }
    writeln!(out)?;
    Ok(())
}

/// List a directory, or a single entry when `path` is not a directory
pub fn list_command<W: Write>(
    ctx: &ArchiveContext,
    path: &str,
    long: bool,
    out: &mut W,
) -> Result<()> {
    let target = ctx.path(path);
    let attrs = ctx.provider().read_attributes(&target)?;

    if !attrs.is_directory() {
        return write_entry(ctx, &target, long, out);
    }

    let mut count = 0;
    for child in ctx
        .provider()
        .new_directory_stream(&target, DirectoryStream::accept_all())?
    {
        write_entry(ctx, &child, long, out)?;
        count += 1;
    }
    diagnostics::log_debug!(
        "Listed {count} entries under {dir}",
        count: count,
        dir: target.to_string()
    );
    Ok(())
}
